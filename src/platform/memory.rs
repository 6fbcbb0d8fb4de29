//! In-process identity provider and document store
//!
//! Behave like the hosted platform for the cases the client cares about:
//! duplicate accounts, weak passwords, bad credentials, missing documents
//! and server-assigned timestamps. `set_offline` makes every call fail with
//! a transport error.

use async_trait::async_trait;
use chrono::Utc;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::models::{is_valid_email, MIN_PASSWORD_LEN};

use super::{
    AuthListener, AuthStateHub, AuthUser, DocPath, DocumentStore, ErrorCode, FieldValue, Fields,
    IdentityProfileUpdate, IdentityProvider, PlatformError, PlatformResult, Subscription,
};

fn offline_error() -> PlatformError {
    PlatformError::Transport("network unavailable".to_string())
}

struct Account {
    password: String,
    user: AuthUser,
}

/// Identity provider holding accounts in memory
#[derive(Default)]
pub struct MemoryIdentity {
    accounts: RefCell<HashMap<String, Account>>,
    current: RefCell<Option<AuthUser>>,
    hub: AuthStateHub,
    offline: Cell<bool>,
    calls: Cell<usize>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a transport error
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    /// Number of async operations attempted so far
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    fn begin(&self) -> PlatformResult<()> {
        self.calls.set(self.calls.get() + 1);
        if self.offline.get() {
            return Err(offline_error());
        }
        Ok(())
    }

    fn set_current(&self, user: Option<AuthUser>) {
        *self.current.borrow_mut() = user.clone();
        self.hub.notify(user.as_ref());
    }
}

#[async_trait(?Send)]
impl IdentityProvider for MemoryIdentity {
    async fn create_account(&self, email: &str, password: &str) -> PlatformResult<AuthUser> {
        self.begin()?;

        if !is_valid_email(email) {
            return Err(PlatformError::rejected(
                ErrorCode::InvalidEmail,
                "The email address is badly formatted.",
            ));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(PlatformError::rejected(
                ErrorCode::WeakPassword,
                "Password should be at least 6 characters",
            ));
        }

        let user = {
            let mut accounts = self.accounts.borrow_mut();
            if accounts.contains_key(email) {
                return Err(PlatformError::rejected(
                    ErrorCode::EmailAlreadyInUse,
                    "The email address is already in use by another account.",
                ));
            }

            let user = AuthUser {
                uid: Uuid::new_v4().simple().to_string(),
                email: email.to_string(),
                display_name: None,
                photo_url: None,
            };
            accounts.insert(
                email.to_string(),
                Account {
                    password: password.to_string(),
                    user: user.clone(),
                },
            );
            user
        };

        debug!("Created account {}", user.uid);
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> PlatformResult<AuthUser> {
        self.begin()?;

        let user = match self.accounts.borrow().get(email) {
            Some(account) if account.password == password => account.user.clone(),
            _ => {
                return Err(PlatformError::rejected(
                    ErrorCode::InvalidCredential,
                    "The supplied auth credential is incorrect.",
                ))
            }
        };

        self.set_current(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> PlatformResult<()> {
        self.begin()?;
        self.set_current(None);
        Ok(())
    }

    async fn update_profile(&self, update: &IdentityProfileUpdate) -> PlatformResult<AuthUser> {
        self.begin()?;

        let mut user = self.current.borrow().clone().ok_or(PlatformError::NotSignedIn)?;
        if let Some(name) = &update.display_name {
            user.display_name = Some(name.clone());
        }
        if let Some(photo) = &update.photo_url {
            user.photo_url = Some(photo.clone());
        }

        if let Some(account) = self.accounts.borrow_mut().get_mut(&user.email) {
            account.user = user.clone();
        }
        *self.current.borrow_mut() = Some(user.clone());
        Ok(user)
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.current.borrow().clone()
    }

    fn on_auth_state_changed(&self, listener: AuthListener) -> Subscription {
        let current = self.current_user();
        self.hub.subscribe(listener, current.as_ref())
    }
}

/// Document store holding documents in memory
#[derive(Default)]
pub struct MemoryStore {
    docs: RefCell<HashMap<DocPath, Fields>>,
    offline: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    /// Read a document without going through the async port
    pub fn peek(&self, path: &DocPath) -> Option<Fields> {
        self.docs.borrow().get(path).cloned()
    }

    /// Seed a document
    pub fn insert(&self, path: DocPath, fields: Fields) {
        self.docs.borrow_mut().insert(path, resolve(fields));
    }

    fn check(&self) -> PlatformResult<()> {
        if self.offline.get() {
            return Err(offline_error());
        }
        Ok(())
    }
}

fn resolve(fields: Fields) -> Fields {
    let now = Utc::now();
    fields
        .into_iter()
        .map(|(k, v)| match v {
            FieldValue::ServerTimestamp => (k, FieldValue::Timestamp(now)),
            other => (k, other),
        })
        .collect()
}

#[async_trait(?Send)]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocPath) -> PlatformResult<Option<Fields>> {
        self.check()?;
        Ok(self.peek(path))
    }

    async fn set(&self, path: &DocPath, fields: Fields) -> PlatformResult<()> {
        self.check()?;
        self.docs.borrow_mut().insert(path.clone(), resolve(fields));
        Ok(())
    }

    async fn update(&self, path: &DocPath, fields: Fields) -> PlatformResult<()> {
        self.check()?;

        let mut docs = self.docs.borrow_mut();
        let doc = docs.get_mut(path).ok_or_else(|| {
            PlatformError::rejected(ErrorCode::NotFound, format!("No document to update: {}", path))
        })?;
        doc.extend(resolve(fields));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[tokio::test]
    async fn test_create_account_rules() {
        let identity = MemoryIdentity::new();

        let err = identity.create_account("not-an-email", "secret1").await.unwrap_err();
        assert_eq!(err.code(), Some(&ErrorCode::InvalidEmail));

        let err = identity.create_account("a@x.io", "123").await.unwrap_err();
        assert_eq!(err.code(), Some(&ErrorCode::WeakPassword));

        let user = identity.create_account("a@x.io", "secret1").await.unwrap();
        assert_eq!(user.email, "a@x.io");
        assert_eq!(user.uid.len(), 32);
        assert_eq!(identity.current_user(), Some(user));

        let err = identity.create_account("a@x.io", "secret1").await.unwrap_err();
        assert_eq!(err.code(), Some(&ErrorCode::EmailAlreadyInUse));
    }

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let identity = MemoryIdentity::new();
        identity.create_account("a@x.io", "secret1").await.unwrap();
        identity.sign_out().await.unwrap();
        assert!(identity.current_user().is_none());

        let err = identity.sign_in("a@x.io", "wrong!!").await.unwrap_err();
        assert_eq!(err.code(), Some(&ErrorCode::InvalidCredential));

        let err = identity.sign_in("nobody@x.io", "secret1").await.unwrap_err();
        assert_eq!(err.code(), Some(&ErrorCode::InvalidCredential));

        let user = identity.sign_in("a@x.io", "secret1").await.unwrap();
        assert_eq!(identity.current_user(), Some(user));
    }

    #[tokio::test]
    async fn test_update_profile_persists_across_sessions() {
        let identity = MemoryIdentity::new();

        let err = identity
            .update_profile(&IdentityProfileUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err, PlatformError::NotSignedIn);

        identity.create_account("a@x.io", "secret1").await.unwrap();
        let updated = identity
            .update_profile(&IdentityProfileUpdate {
                display_name: Some("alice".into()),
                photo_url: None,
            })
            .await
            .unwrap();
        assert_eq!(updated.display_name.as_deref(), Some("alice"));

        identity.sign_out().await.unwrap();
        let user = identity.sign_in("a@x.io", "secret1").await.unwrap();
        assert_eq!(user.display_name.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_auth_state_notifications() {
        let identity = MemoryIdentity::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = identity.on_auth_state_changed(Rc::new(move |user: Option<&AuthUser>| {
            seen_clone.borrow_mut().push(user.is_some());
        }));

        identity.create_account("a@x.io", "secret1").await.unwrap();
        identity.sign_out().await.unwrap();

        assert_eq!(*seen.borrow(), vec![false, true, false]);
    }

    #[tokio::test]
    async fn test_offline_identity() {
        let identity = MemoryIdentity::new();
        identity.set_offline(true);
        let err = identity.sign_in("a@x.io", "secret1").await.unwrap_err();
        assert!(matches!(err, PlatformError::Transport(_)));
        assert_eq!(identity.calls(), 1);
    }

    #[tokio::test]
    async fn test_store_set_get_update() {
        let store = MemoryStore::new();
        let path = DocPath::user("u1");

        assert_eq!(store.get(&path).await.unwrap(), None);

        let err = store.update(&path, Fields::new()).await.unwrap_err();
        assert_eq!(err.code(), Some(&ErrorCode::NotFound));

        let mut fields = Fields::new();
        fields.insert("username".into(), "alice".into());
        fields.insert("createdAt".into(), FieldValue::ServerTimestamp);
        store.set(&path, fields).await.unwrap();

        let doc = store.get(&path).await.unwrap().unwrap();
        assert!(doc["createdAt"].as_timestamp().is_some());

        let mut patch = Fields::new();
        patch.insert("status".into(), "away".into());
        store.update(&path, patch).await.unwrap();

        let doc = store.peek(&path).unwrap();
        assert_eq!(doc["username"].as_str(), Some("alice"));
        assert_eq!(doc["status"].as_str(), Some("away"));
    }

    #[tokio::test]
    async fn test_offline_store() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let err = store.get(&DocPath::user("u1")).await.unwrap_err();
        assert!(matches!(err, PlatformError::Transport(_)));
    }
}
