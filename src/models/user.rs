//! User profile as stored in `users/{uid}`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::platform::{AuthUser, FieldValue, Fields};

/// Presence shown next to a user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Online,
    Offline,
    Away,
    Dnd,
}

impl UserStatus {
    pub const ALL: [UserStatus; 4] = [
        UserStatus::Online,
        UserStatus::Away,
        UserStatus::Dnd,
        UserStatus::Offline,
    ];

    /// Stored form
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Online => "online",
            UserStatus::Offline => "offline",
            UserStatus::Away => "away",
            UserStatus::Dnd => "dnd",
        }
    }

    /// Human-readable form
    pub fn label(&self) -> &'static str {
        match self {
            UserStatus::Online => "Online",
            UserStatus::Offline => "Offline",
            UserStatus::Away => "Away",
            UserStatus::Dnd => "Do Not Disturb",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "online" => Ok(UserStatus::Online),
            "offline" => Ok(UserStatus::Offline),
            "away" => Ok(UserStatus::Away),
            "dnd" => Ok(UserStatus::Dnd),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

/// A user profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub uid: String,
    pub username: String,
    pub email: String,
    #[serde(rename = "photoURL", default)]
    pub photo_url: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

impl User {
    /// Minimal profile derived from an identity record, used when the
    /// stored profile has not been loaded
    pub fn from_identity(auth: &AuthUser) -> Self {
        let username = auth
            .display_name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| {
                auth.email
                    .split('@')
                    .next()
                    .unwrap_or_default()
                    .to_string()
            });

        Self {
            uid: auth.uid.clone(),
            username,
            email: auth.email.clone(),
            photo_url: auth.photo_url.clone().unwrap_or_default(),
            status: UserStatus::Online,
            ..Default::default()
        }
    }

    /// Build from a stored document; `None` when a required field is absent
    pub fn from_fields(uid: &str, fields: &Fields) -> Option<Self> {
        let text = |key: &str| fields.get(key).and_then(FieldValue::as_str).map(str::to_string);
        let time = |key: &str| fields.get(key).and_then(FieldValue::as_timestamp);

        Some(Self {
            uid: text("uid").unwrap_or_else(|| uid.to_string()),
            username: text("username")?,
            email: text("email")?,
            photo_url: text("photoURL").unwrap_or_default(),
            bio: text("bio").unwrap_or_default(),
            status: text("status")
                .and_then(|s| s.parse().ok())
                .unwrap_or(UserStatus::Offline),
            created_at: time("createdAt"),
            last_seen: time("lastSeen"),
        })
    }

    /// First letter of the username, upper-cased, for avatar placeholders
    pub fn initial(&self) -> String {
        self.username
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "?".to_string())
    }
}
