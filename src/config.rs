//! Configuration System
//!
//! Handles loading configuration from TOML and key/value overrides.
//! The browser build embeds a TOML file and applies overrides captured from
//! the build environment; tests build configs directly.

use serde::Deserialize;

/// Prefix of the placeholder values in the credentials template
const PLACEHOLDER_PREFIX: &str = "YOUR_";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub firebase: FirebaseConfig,

    #[serde(default)]
    pub router: RouterConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which platform adapters the application runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Hosted identity platform and document store
    #[default]
    Firebase,
    /// In-process fakes; nothing leaves the page
    Memory,
}

impl BackendKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "firebase" => Some(Self::Firebase),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,
}

/// Credentials and endpoints of the hosted platform
#[derive(Debug, Clone, Deserialize)]
pub struct FirebaseConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub auth_domain: String,

    #[serde(default)]
    pub project_id: String,

    #[serde(default)]
    pub storage_bucket: String,

    #[serde(default)]
    pub messaging_sender_id: String,

    #[serde(default)]
    pub app_id: String,

    pub measurement_id: Option<String>,

    #[serde(default = "default_identity_url")]
    pub identity_url: String,

    #[serde(default = "default_token_url")]
    pub token_url: String,

    #[serde(default = "default_firestore_url")]
    pub firestore_url: String,
}

fn default_identity_url() -> String {
    "https://identitytoolkit.googleapis.com/v1".to_string()
}

fn default_token_url() -> String {
    "https://securetoken.googleapis.com/v1".to_string()
}

fn default_firestore_url() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            auth_domain: String::new(),
            project_id: String::new(),
            storage_bucket: String::new(),
            messaging_sender_id: String::new(),
            app_id: String::new(),
            measurement_id: None,
            identity_url: default_identity_url(),
            token_url: default_token_url(),
            firestore_url: default_firestore_url(),
        }
    }
}

/// Router configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    /// Id of the element views are mounted into
    #[serde(default = "default_root_id")]
    pub root_id: String,

    /// View shown when the fragment is empty or unknown
    #[serde(default = "default_view")]
    pub default_view: String,
}

fn default_root_id() -> String {
    "root".to_string()
}

fn default_view() -> String {
    "login".to_string()
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            root_id: default_root_id(),
            default_view: default_view(),
        }
    }
}

/// Auth form and session behavior
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// How long the inline error banner stays visible
    #[serde(default = "default_error_banner_ms")]
    pub error_banner_ms: u32,

    /// How long the inline success banner stays visible
    #[serde(default = "default_success_banner_ms")]
    pub success_banner_ms: u32,

    /// Whether the dashboard logout control ends the platform session
    /// before returning to the login view
    #[serde(default)]
    pub sign_out_on_logout: bool,
}

fn default_error_banner_ms() -> u32 {
    5000
}

fn default_success_banner_ms() -> u32 {
    3000
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            error_banner_ms: default_error_banner_ms(),
            success_banner_ms: default_success_banner_ms(),
            sign_out_on_logout: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `CHAT_*` overrides from a key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(kind) = lookup("CHAT_BACKEND") {
            match BackendKind::parse(&kind) {
                Some(kind) => self.backend.kind = kind,
                None => tracing::warn!("Ignoring unknown backend override: {}", kind),
            }
        }

        if let Some(api_key) = lookup("CHAT_FIREBASE_API_KEY") {
            self.firebase.api_key = api_key;
        }
        if let Some(auth_domain) = lookup("CHAT_FIREBASE_AUTH_DOMAIN") {
            self.firebase.auth_domain = auth_domain;
        }
        if let Some(project_id) = lookup("CHAT_FIREBASE_PROJECT_ID") {
            self.firebase.project_id = project_id;
        }
        if let Some(app_id) = lookup("CHAT_FIREBASE_APP_ID") {
            self.firebase.app_id = app_id;
        }

        if let Some(level) = lookup("CHAT_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(flag) = lookup("CHAT_SIGN_OUT_ON_LOGOUT") {
            if let Ok(flag) = flag.parse() {
                self.auth.sign_out_on_logout = flag;
            }
        }
    }

    /// Check that the selected backend has what it needs to start
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.router.root_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "router.root_id",
                value: self.router.root_id.clone(),
            });
        }

        if self.backend.kind == BackendKind::Firebase {
            if is_unset(&self.firebase.api_key) {
                return Err(ConfigError::MissingCredential("firebase.api_key"));
            }
            if is_unset(&self.firebase.project_id) {
                return Err(ConfigError::MissingCredential("firebase.project_id"));
            }
        }

        Ok(())
    }
}

fn is_unset(value: &str) -> bool {
    value.trim().is_empty() || value.starts_with(PLACEHOLDER_PREFIX)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Missing credential: {0} is empty or still a template placeholder")]
    MissingCredential(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Generate the credentials template
pub fn generate_default_config() -> String {
    r#"# Chat App Configuration
#
# Replace the placeholder values below with your project's web app
# credentials (project settings, "Your apps", web app config).
#
# Build-time environment variables override these settings:
# - CHAT_BACKEND
# - CHAT_FIREBASE_API_KEY
# - CHAT_FIREBASE_AUTH_DOMAIN
# - CHAT_FIREBASE_PROJECT_ID
# - CHAT_FIREBASE_APP_ID
# - CHAT_LOG_LEVEL
# - CHAT_SIGN_OUT_ON_LOGOUT

[backend]
# firebase: hosted identity platform and document store
# memory: in-page fakes, useful for demos and offline development
kind = "firebase"

[firebase]
api_key = "YOUR_API_KEY_HERE"
auth_domain = "YOUR_PROJECT_ID.firebaseapp.com"
project_id = "YOUR_PROJECT_ID"
storage_bucket = "YOUR_PROJECT_ID.firebasestorage.app"
messaging_sender_id = "YOUR_MESSAGING_SENDER_ID"
app_id = "YOUR_APP_ID"
# measurement_id = "YOUR_MEASUREMENT_ID"

# Point these at the local emulators during development
# identity_url = "http://localhost:9099/identitytoolkit.googleapis.com/v1"
# token_url = "http://localhost:9099/securetoken.googleapis.com/v1"
# firestore_url = "http://localhost:8080/v1"

[router]
# Id of the element views are mounted into
root_id = "root"

# View shown when the location fragment is empty or unknown
default_view = "login"

[auth]
# How long the inline auth error stays visible (ms)
error_banner_ms = 5000

# How long the inline success message stays visible (ms)
success_banner_ms = 3000

# End the platform session when the dashboard logout control is used
sign_out_on_logout = false

[logging]
# Log level: trace, debug, info, warn, error
level = "info"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.backend.kind, BackendKind::Firebase);
        assert_eq!(config.router.root_id, "root");
        assert_eq!(config.router.default_view, "login");
        assert_eq!(config.auth.error_banner_ms, 5000);
        assert_eq!(config.auth.success_banner_ms, 3000);
        assert!(!config.auth.sign_out_on_logout);
        assert_eq!(config.logging.level, "info");
        assert_eq!(
            config.firebase.identity_url,
            "https://identitytoolkit.googleapis.com/v1"
        );
    }

    #[test]
    fn test_template_parses_and_is_rejected_until_filled() {
        let config = AppConfig::from_toml_str(&generate_default_config()).unwrap();
        assert_eq!(config.firebase.api_key, "YOUR_API_KEY_HERE");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingCredential("firebase.api_key"))
        ));
    }

    #[test]
    fn test_memory_backend_needs_no_credentials() {
        let config = AppConfig::from_toml_str("[backend]\nkind = \"memory\"\n").unwrap();
        assert_eq!(config.backend.kind, BackendKind::Memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_use_defaults() {
        let config = AppConfig::from_toml_str(
            "[firebase]\napi_key = \"k\"\nproject_id = \"p\"\n[auth]\nsign_out_on_logout = true\n",
        )
        .unwrap();
        assert_eq!(config.firebase.firestore_url, "https://firestore.googleapis.com/v1");
        assert_eq!(config.auth.error_banner_ms, 5000);
        assert!(config.auth.sign_out_on_logout);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_error() {
        let err = AppConfig::from_toml_str("[router\nroot_id = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("CHAT_BACKEND", "memory"),
            ("CHAT_FIREBASE_API_KEY", "abc"),
            ("CHAT_LOG_LEVEL", "debug"),
            ("CHAT_SIGN_OUT_ON_LOGOUT", "true"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.backend.kind, BackendKind::Memory);
        assert_eq!(config.firebase.api_key, "abc");
        assert_eq!(config.logging.level, "debug");
        assert!(config.auth.sign_out_on_logout);
    }

    #[test]
    fn test_unknown_backend_override_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| (key == "CHAT_BACKEND").then(|| "postgres".to_string()));
        assert_eq!(config.backend.kind, BackendKind::Firebase);
    }

    #[test]
    fn test_empty_root_id_is_invalid() {
        let mut config = AppConfig::default();
        config.backend.kind = BackendKind::Memory;
        config.router.root_id = " ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key: "router.root_id", .. })
        ));
    }
}
