//! User profile service over the document store

use std::rc::Rc;
use tracing::{debug, error};

use super::UserServiceError;
use crate::models::{User, UserStatus};
use crate::platform::{DocPath, DocumentStore, FieldValue, Fields};

/// Bio given to every new profile
pub const DEFAULT_BIO: &str = "Hey there! I'm using Chat App.";

/// Profile document written right after registration
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub uid: String,
    pub username: String,
    pub email: String,
    pub photo_url: String,
    pub bio: String,
    pub status: UserStatus,
}

/// Partial profile change; `None` leaves the stored field as is
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    pub status: Option<UserStatus>,
}

impl ProfileUpdate {
    fn into_fields(self) -> Fields {
        let mut fields = Fields::new();
        if let Some(username) = self.username {
            fields.insert("username".into(), username.into());
        }
        if let Some(photo_url) = self.photo_url {
            fields.insert("photoURL".into(), photo_url.into());
        }
        if let Some(bio) = self.bio {
            fields.insert("bio".into(), bio.into());
        }
        if let Some(status) = self.status {
            fields.insert("status".into(), status.as_str().into());
        }
        fields
    }
}

pub type UserResult<T> = Result<T, UserServiceError>;

/// Reads and writes `users/{uid}` documents
pub struct UserService {
    store: Rc<dyn DocumentStore>,
}

impl UserService {
    pub fn new(store: Rc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Fetch a profile; `Ok(None)` when no document exists
    pub async fn get_user_by_id(&self, uid: &str) -> UserResult<Option<User>> {
        let path = DocPath::user(uid);
        let fields = match self.store.get(&path).await {
            Ok(Some(fields)) => fields,
            Ok(None) => return Ok(None),
            Err(e) => {
                error!(uid = %uid, "Error getting user: {}", e);
                return Err(e.into());
            }
        };

        User::from_fields(uid, &fields)
            .map(Some)
            .ok_or_else(|| UserServiceError::InvalidDocument {
                path: path.to_string(),
                reason: "username or email missing".to_string(),
            })
    }

    /// Write the initial profile with server-assigned timestamps
    pub async fn create_user_profile(&self, profile: NewProfile) -> UserResult<()> {
        let path = DocPath::user(&profile.uid);

        let mut fields = Fields::new();
        fields.insert("uid".into(), profile.uid.clone().into());
        fields.insert("username".into(), profile.username.into());
        fields.insert("email".into(), profile.email.into());
        fields.insert("photoURL".into(), profile.photo_url.into());
        fields.insert("bio".into(), profile.bio.into());
        fields.insert("status".into(), profile.status.as_str().into());
        fields.insert("createdAt".into(), FieldValue::ServerTimestamp);
        fields.insert("lastSeen".into(), FieldValue::ServerTimestamp);

        self.store.set(&path, fields).await.map_err(|e| {
            error!(uid = %profile.uid, "Error creating user profile: {}", e);
            UserServiceError::from(e)
        })
    }

    /// Merge fields into the profile and stamp `updatedAt`
    pub async fn update_user_profile(&self, uid: &str, update: ProfileUpdate) -> UserResult<()> {
        let mut fields = update.into_fields();
        fields.insert("updatedAt".into(), FieldValue::ServerTimestamp);

        self.store
            .update(&DocPath::user(uid), fields)
            .await
            .map_err(|e| {
                error!(uid = %uid, "Error updating user profile: {}", e);
                UserServiceError::from(e)
            })?;

        debug!(uid = %uid, "Profile updated");
        Ok(())
    }

    /// Set presence and refresh `lastSeen`
    pub async fn update_user_status(&self, uid: &str, status: UserStatus) -> UserResult<()> {
        let mut fields = Fields::new();
        fields.insert("status".into(), status.as_str().into());
        fields.insert("lastSeen".into(), FieldValue::ServerTimestamp);

        self.store
            .update(&DocPath::user(uid), fields)
            .await
            .map_err(|e| {
                error!(uid = %uid, status = %status, "Error updating user status: {}", e);
                UserServiceError::from(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::memory::MemoryStore;
    use crate::platform::{ErrorCode, PlatformError};

    fn service() -> (Rc<MemoryStore>, UserService) {
        let store = Rc::new(MemoryStore::new());
        let service = UserService::new(store.clone());
        (store, service)
    }

    fn profile(uid: &str) -> NewProfile {
        NewProfile {
            uid: uid.to_string(),
            username: "alice".into(),
            email: "a@x.io".into(),
            photo_url: "https://img".into(),
            bio: DEFAULT_BIO.into(),
            status: UserStatus::Online,
        }
    }

    #[tokio::test]
    async fn test_missing_user_is_none() {
        let (_, service) = service();
        assert_eq!(service.get_user_by_id("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let (_, service) = service();
        service.create_user_profile(profile("u1")).await.unwrap();

        let user = service.get_user_by_id("u1").await.unwrap().unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.bio, DEFAULT_BIO);
        assert_eq!(user.status, UserStatus::Online);
        assert!(user.created_at.is_some());
        assert!(user.last_seen.is_some());
    }

    #[tokio::test]
    async fn test_update_profile_merges() {
        let (store, service) = service();
        service.create_user_profile(profile("u1")).await.unwrap();

        service
            .update_user_profile(
                "u1",
                ProfileUpdate {
                    bio: Some("busy".into()),
                    status: Some(UserStatus::Dnd),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let doc = store.peek(&DocPath::user("u1")).unwrap();
        assert_eq!(doc["bio"].as_str(), Some("busy"));
        assert_eq!(doc["status"].as_str(), Some("dnd"));
        assert_eq!(doc["username"].as_str(), Some("alice"));
        assert!(doc["updatedAt"].as_timestamp().is_some());
    }

    #[tokio::test]
    async fn test_update_missing_profile_fails() {
        let (_, service) = service();
        let err = service
            .update_user_status("ghost", UserStatus::Offline)
            .await
            .unwrap_err();
        match err {
            UserServiceError::Platform(e) => assert_eq!(e.code(), Some(&ErrorCode::NotFound)),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_status_update_refreshes_last_seen() {
        let (store, service) = service();
        service.create_user_profile(profile("u1")).await.unwrap();
        let before = store.peek(&DocPath::user("u1")).unwrap()["lastSeen"].as_timestamp();

        service.update_user_status("u1", UserStatus::Away).await.unwrap();

        let doc = store.peek(&DocPath::user("u1")).unwrap();
        assert_eq!(doc["status"].as_str(), Some("away"));
        assert!(doc["lastSeen"].as_timestamp() >= before);
    }

    #[tokio::test]
    async fn test_invalid_document() {
        let (store, service) = service();
        let mut fields = Fields::new();
        fields.insert("bio".into(), "orphan".into());
        store.insert(DocPath::user("u2"), fields);

        let err = service.get_user_by_id("u2").await.unwrap_err();
        assert!(matches!(err, UserServiceError::InvalidDocument { .. }));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let (store, service) = service();
        store.set_offline(true);
        let err = service.get_user_by_id("u1").await.unwrap_err();
        assert!(matches!(
            err,
            UserServiceError::Platform(PlatformError::Transport(_))
        ));
    }
}
