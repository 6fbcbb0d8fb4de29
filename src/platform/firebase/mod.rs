//! Firebase REST adapters
//!
//! - [`FirebaseIdentity`]: Identity Toolkit (`accounts:*`) and Secure Token APIs
//! - [`FirestoreStore`]: Firestore documents and `documents:commit`
//!
//! Both speak JSON over `reqwest`. Failed calls come back as
//! `{"error": {"code", "message", "status"}}`, which is classified into
//! [`ErrorCode`] here.

mod firestore;
mod identity;

pub use firestore::FirestoreStore;
pub use identity::FirebaseIdentity;

use async_trait::async_trait;
use reqwest::Response;
use serde::Deserialize;

use super::{ErrorCode, PlatformError, PlatformResult};

/// Supplies the ID token sent with document store requests
#[async_trait(?Send)]
pub trait TokenSource {
    /// A valid ID token for the signed-in user, or `None` when signed out
    async fn id_token(&self) -> PlatformResult<Option<String>>;
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

fn parse_error_body(body: &str) -> Option<ErrorBody> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error)
}

/// Map an Identity Toolkit error message such as
/// `WEAK_PASSWORD : Password should be at least 6 characters`
fn classify_identity_message(message: &str) -> PlatformError {
    let (token, detail) = match message.split_once(" : ") {
        Some((token, detail)) => (token.trim(), detail.trim()),
        None => (message.trim(), ""),
    };

    let (code, fallback) = match token {
        "EMAIL_EXISTS" => (
            ErrorCode::EmailAlreadyInUse,
            "The email address is already in use by another account.",
        ),
        "WEAK_PASSWORD" => (
            ErrorCode::WeakPassword,
            "Password should be at least 6 characters",
        ),
        "INVALID_EMAIL" => (ErrorCode::InvalidEmail, "The email address is badly formatted."),
        "INVALID_LOGIN_CREDENTIALS" => (
            ErrorCode::InvalidCredential,
            "The supplied auth credential is incorrect.",
        ),
        "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => (
            ErrorCode::UserNotFound,
            "There is no user record corresponding to this identifier.",
        ),
        "INVALID_PASSWORD" => (
            ErrorCode::WrongPassword,
            "The password is invalid or the user does not have a password.",
        ),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => (
            ErrorCode::TooManyRequests,
            "Access to this account has been temporarily disabled due to many failed login attempts.",
        ),
        "USER_DISABLED" => (
            ErrorCode::UserDisabled,
            "The user account has been disabled by an administrator.",
        ),
        "TOKEN_EXPIRED" | "INVALID_ID_TOKEN" | "INVALID_REFRESH_TOKEN" => (
            ErrorCode::TokenExpired,
            "The user's credential is no longer valid. The user must sign in again.",
        ),
        other => return PlatformError::rejected(ErrorCode::Other(other.to_string()), message),
    };

    let message = if detail.is_empty() { fallback } else { detail };
    PlatformError::rejected(code, message)
}

/// Map a Firestore error status such as `NOT_FOUND`
fn classify_store_status(status: &str, message: &str) -> PlatformError {
    let code = match status {
        "NOT_FOUND" => ErrorCode::NotFound,
        "PERMISSION_DENIED" => ErrorCode::PermissionDenied,
        "UNAUTHENTICATED" => ErrorCode::Unauthenticated,
        other => ErrorCode::Other(other.to_string()),
    };
    PlatformError::rejected(code, message)
}

fn identity_error(status: u16, body: &str) -> PlatformError {
    match parse_error_body(body) {
        Some(err) => classify_identity_message(&err.message),
        None => PlatformError::Malformed(format!("HTTP {} with unreadable body", status)),
    }
}

fn store_error(status: u16, body: &str) -> PlatformError {
    match parse_error_body(body) {
        Some(err) => classify_store_status(&err.status, &err.message),
        None => PlatformError::Malformed(format!("HTTP {} with unreadable body", status)),
    }
}

/// Turn a non-success response into a classified error
async fn read_failure(
    response: Response,
    classify: fn(u16, &str) -> PlatformError,
) -> PlatformError {
    let status = response.status().as_u16();
    match response.text().await {
        Ok(body) => classify(status, &body),
        Err(e) => PlatformError::from(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_messages() {
        let err = identity_error(
            400,
            r#"{"error":{"code":400,"message":"WEAK_PASSWORD : Password should be at least 6 characters","errors":[]}}"#,
        );
        assert_eq!(err.code(), Some(&ErrorCode::WeakPassword));
        assert_eq!(err.raw_message(), "Password should be at least 6 characters");

        let err = identity_error(400, r#"{"error":{"code":400,"message":"EMAIL_EXISTS"}}"#);
        assert_eq!(err.code(), Some(&ErrorCode::EmailAlreadyInUse));

        let err = identity_error(400, r#"{"error":{"code":400,"message":"INVALID_LOGIN_CREDENTIALS"}}"#);
        assert_eq!(err.code(), Some(&ErrorCode::InvalidCredential));

        let err = identity_error(400, r#"{"error":{"code":400,"message":"OPERATION_NOT_ALLOWED"}}"#);
        assert_eq!(err.code(), Some(&ErrorCode::Other("OPERATION_NOT_ALLOWED".into())));
        assert_eq!(err.raw_message(), "OPERATION_NOT_ALLOWED");
    }

    #[test]
    fn test_store_statuses() {
        let err = store_error(
            404,
            r#"{"error":{"code":404,"message":"No document to update","status":"NOT_FOUND"}}"#,
        );
        assert_eq!(err.code(), Some(&ErrorCode::NotFound));
        assert_eq!(err.raw_message(), "No document to update");

        let err = store_error(
            403,
            r#"{"error":{"code":403,"message":"Missing or insufficient permissions.","status":"PERMISSION_DENIED"}}"#,
        );
        assert_eq!(err.code(), Some(&ErrorCode::PermissionDenied));
    }

    #[test]
    fn test_unreadable_error_body() {
        let err = store_error(502, "<html>Bad Gateway</html>");
        assert_eq!(
            err,
            PlatformError::Malformed("HTTP 502 with unreadable body".to_string())
        );
    }
}
