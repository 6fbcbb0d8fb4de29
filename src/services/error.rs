//! Service error types

use thiserror::Error;

use crate::platform::{ErrorCode, PlatformError};

/// Message shown when a failure carries no text of its own
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Errors from the user profile service
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UserServiceError {
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Invalid document at {path}: {reason}")]
    InvalidDocument { path: String, reason: String },
}

/// Errors from the auth service
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    /// The platform refused the request; the message is ready to show
    #[error("{0}")]
    Rejected(String),

    /// The request failed for reasons the user cannot act on
    #[error("Unexpected platform failure: {0}")]
    Unexpected(PlatformError),

    /// The account exists but its profile document could not be written
    #[error("Profile setup failed: {0}")]
    Profile(#[from] UserServiceError),
}

impl AuthError {
    /// Whether the failure carries a message meant for the user
    pub fn is_rejection(&self) -> bool {
        matches!(self, AuthError::Rejected(_))
    }

    /// Text for the user: the humanized wording for known codes, otherwise
    /// the platform's own message
    pub fn user_message(&self) -> String {
        let message = match self {
            AuthError::Rejected(message) => message.clone(),
            AuthError::Unexpected(err) => err.raw_message(),
            AuthError::Profile(UserServiceError::Platform(err)) => err.raw_message(),
            AuthError::Profile(err) => err.to_string(),
        };
        if message.trim().is_empty() {
            UNEXPECTED_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }

    /// Registration failures: duplicate email, weak password and malformed
    /// email get fixed wording, other coded failures keep the platform's text
    pub fn from_registration(err: PlatformError) -> Self {
        match err.code() {
            Some(ErrorCode::EmailAlreadyInUse) => {
                AuthError::Rejected("This email is already registered.".to_string())
            }
            Some(ErrorCode::WeakPassword) => {
                AuthError::Rejected("Password should be at least 6 characters.".to_string())
            }
            Some(ErrorCode::InvalidEmail) => {
                AuthError::Rejected("Please enter a valid email address.".to_string())
            }
            Some(_) => AuthError::Rejected(err.raw_message()),
            None => AuthError::Unexpected(err),
        }
    }

    /// Login failures: bad credentials and rate limiting get fixed wording
    pub fn from_login(err: PlatformError) -> Self {
        match err.code() {
            Some(ErrorCode::InvalidCredential)
            | Some(ErrorCode::UserNotFound)
            | Some(ErrorCode::WrongPassword) => {
                AuthError::Rejected("Invalid email or password.".to_string())
            }
            Some(ErrorCode::TooManyRequests) => AuthError::Rejected(
                "Too many failed attempts. Please try again later.".to_string(),
            ),
            Some(_) => AuthError::Rejected(err.raw_message()),
            None => AuthError::Unexpected(err),
        }
    }

    pub fn from_platform(err: PlatformError) -> Self {
        match err.code() {
            Some(_) => AuthError::Rejected(err.raw_message()),
            None => AuthError::Unexpected(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coded(code: ErrorCode) -> PlatformError {
        PlatformError::rejected(code, "raw platform text")
    }

    #[test]
    fn test_registration_messages() {
        assert_eq!(
            AuthError::from_registration(coded(ErrorCode::EmailAlreadyInUse)).user_message(),
            "This email is already registered."
        );
        assert_eq!(
            AuthError::from_registration(coded(ErrorCode::WeakPassword)).user_message(),
            "Password should be at least 6 characters."
        );
        assert_eq!(
            AuthError::from_registration(coded(ErrorCode::InvalidEmail)).user_message(),
            "Please enter a valid email address."
        );
        assert_eq!(
            AuthError::from_registration(coded(ErrorCode::UserDisabled)),
            AuthError::Rejected("raw platform text".into())
        );
    }

    #[test]
    fn test_login_messages() {
        for code in [
            ErrorCode::InvalidCredential,
            ErrorCode::UserNotFound,
            ErrorCode::WrongPassword,
        ] {
            assert_eq!(
                AuthError::from_login(coded(code)).user_message(),
                "Invalid email or password."
            );
        }
        assert_eq!(
            AuthError::from_login(coded(ErrorCode::TooManyRequests)).user_message(),
            "Too many failed attempts. Please try again later."
        );
        // registration wording does not leak into login
        assert_eq!(
            AuthError::from_login(coded(ErrorCode::EmailAlreadyInUse)).user_message(),
            "raw platform text"
        );
    }

    #[test]
    fn test_uncoded_failures_keep_platform_text() {
        let err = AuthError::from_login(PlatformError::Transport("offline".into()));
        assert!(!err.is_rejection());
        assert_eq!(err.user_message(), "Transport error: offline");

        let err = AuthError::from_registration(PlatformError::Malformed("bad json".into()));
        assert_eq!(err.user_message(), "Malformed response: bad json");

        let err = AuthError::from(UserServiceError::Platform(PlatformError::rejected(
            ErrorCode::PermissionDenied,
            "Missing or insufficient permissions.",
        )));
        assert!(matches!(err, AuthError::Profile(_)));
        assert_eq!(err.user_message(), "Missing or insufficient permissions.");

        let err = AuthError::from(UserServiceError::InvalidDocument {
            path: "users/u1".into(),
            reason: "no username".into(),
        });
        assert_eq!(err.user_message(), "Invalid document at users/u1: no username");
    }

    #[test]
    fn test_empty_platform_text_falls_back() {
        let err = AuthError::Unexpected(PlatformError::rejected(ErrorCode::Other(String::new()), ""));
        assert_eq!(err.user_message(), UNEXPECTED_ERROR_MESSAGE);
    }
}
