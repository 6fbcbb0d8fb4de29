//! Platform Ports
//!
//! The external identity platform and document store, seen through two
//! traits so the services never reach for ambient handles:
//!
//! - [`IdentityProvider`]: accounts, sessions, auth-state notifications
//! - [`DocumentStore`]: per-user profile documents addressed as `users/{uid}`
//!
//! Adapters:
//! - [`memory`]: in-process fakes used by tests and the offline demo build
//! - [`firebase`]: REST clients for the hosted platform

mod auth_state;
mod error;
pub mod firebase;
pub mod memory;

pub use auth_state::{AuthListener, AuthStateHub, Subscription};
pub use error::{ErrorCode, PlatformError, PlatformResult};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identity record as issued by the identity platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Fields to change on the signed-in identity record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityProfileUpdate {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Location of a document: `{collection}/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath {
    collection: String,
    id: String,
}

impl DocPath {
    pub fn new(collection: &str, id: &str) -> Self {
        Self {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    /// `users/{uid}`
    pub fn user(uid: &str) -> Self {
        Self::new("users", uid)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A single document field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    /// Replaced by the store's clock when the write is applied
    ServerTimestamp,
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

/// Document contents keyed by field name
pub type Fields = BTreeMap<String, FieldValue>;

/// Account and session operations of the identity platform
#[async_trait(?Send)]
pub trait IdentityProvider {
    /// Create an account and sign it in
    async fn create_account(&self, email: &str, password: &str) -> PlatformResult<AuthUser>;

    async fn sign_in(&self, email: &str, password: &str) -> PlatformResult<AuthUser>;

    async fn sign_out(&self) -> PlatformResult<()>;

    /// Update display name and photo of the signed-in identity
    async fn update_profile(&self, update: &IdentityProfileUpdate) -> PlatformResult<AuthUser>;

    fn current_user(&self) -> Option<AuthUser>;

    /// Subscribe to sign-in state. The listener receives the current state
    /// right away and again on every transition.
    fn on_auth_state_changed(&self, listener: AuthListener) -> Subscription;
}

/// Document operations of the managed store
#[async_trait(?Send)]
pub trait DocumentStore {
    /// Fetch a document; `None` when it does not exist
    async fn get(&self, path: &DocPath) -> PlatformResult<Option<Fields>>;

    /// Create or fully replace a document
    async fn set(&self, path: &DocPath, fields: Fields) -> PlatformResult<()>;

    /// Merge fields into an existing document; fails with
    /// [`ErrorCode::NotFound`] when it does not exist
    async fn update(&self, path: &DocPath, fields: Fields) -> PlatformResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_path() {
        let path = DocPath::user("abc");
        assert_eq!(path.to_string(), "users/abc");
        assert_eq!(path.collection(), "users");
        assert_eq!(path.id(), "abc");
    }

    #[test]
    fn test_field_value_accessors() {
        assert_eq!(FieldValue::from("online").as_str(), Some("online"));
        assert_eq!(FieldValue::from(true).as_str(), None);
        let now = Utc::now();
        assert_eq!(FieldValue::from(now).as_timestamp(), Some(now));
        assert_eq!(FieldValue::ServerTimestamp.as_timestamp(), None);
    }
}
