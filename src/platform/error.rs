//! Platform error types
//!
//! Errors surfaced by the identity provider and document store adapters.

use std::fmt;
use thiserror::Error;

/// Classification of a coded failure reported by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    EmailAlreadyInUse,
    WeakPassword,
    InvalidEmail,
    InvalidCredential,
    UserNotFound,
    WrongPassword,
    TooManyRequests,
    UserDisabled,
    TokenExpired,
    NotFound,
    PermissionDenied,
    Unauthenticated,
    Other(String),
}

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::EmailAlreadyInUse => "auth/email-already-in-use",
            ErrorCode::WeakPassword => "auth/weak-password",
            ErrorCode::InvalidEmail => "auth/invalid-email",
            ErrorCode::InvalidCredential => "auth/invalid-credential",
            ErrorCode::UserNotFound => "auth/user-not-found",
            ErrorCode::WrongPassword => "auth/wrong-password",
            ErrorCode::TooManyRequests => "auth/too-many-requests",
            ErrorCode::UserDisabled => "auth/user-disabled",
            ErrorCode::TokenExpired => "auth/user-token-expired",
            ErrorCode::NotFound => "not-found",
            ErrorCode::PermissionDenied => "permission-denied",
            ErrorCode::Unauthenticated => "unauthenticated",
            ErrorCode::Other(code) => code,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur when calling the platform
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlatformError {
    /// The platform processed the request and refused it
    #[error("{message} ({code})")]
    Rejected { code: ErrorCode, message: String },

    /// The request never got an answer
    #[error("Transport error: {0}")]
    Transport(String),

    /// The answer could not be understood
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The operation needs a signed-in user
    #[error("No user is signed in")]
    NotSignedIn,
}

impl PlatformError {
    pub fn rejected(code: ErrorCode, message: impl Into<String>) -> Self {
        PlatformError::Rejected {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> Option<&ErrorCode> {
        match self {
            PlatformError::Rejected { code, .. } => Some(code),
            _ => None,
        }
    }

    /// The platform's own message, without the code suffix
    pub fn raw_message(&self) -> String {
        match self {
            PlatformError::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for PlatformError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PlatformError::Malformed(err.to_string())
        } else {
            PlatformError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PlatformError {
    fn from(err: serde_json::Error) -> Self {
        PlatformError::Malformed(err.to_string())
    }
}

/// Result type alias for platform calls
pub type PlatformResult<T> = Result<T, PlatformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlatformError::rejected(ErrorCode::WeakPassword, "Password should be at least 6 characters");
        assert_eq!(
            err.to_string(),
            "Password should be at least 6 characters (auth/weak-password)"
        );
        assert_eq!(err.raw_message(), "Password should be at least 6 characters");
        assert_eq!(err.code(), Some(&ErrorCode::WeakPassword));

        let err = PlatformError::Transport("connection reset".to_string());
        assert_eq!(err.to_string(), "Transport error: connection reset");
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_other_code_passes_through() {
        assert_eq!(ErrorCode::Other("OPERATION_NOT_ALLOWED".into()).as_str(), "OPERATION_NOT_ALLOWED");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: PlatformError = json_err.into();
        assert!(matches!(err, PlatformError::Malformed(_)));
    }
}
