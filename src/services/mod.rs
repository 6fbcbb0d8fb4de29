//! Services
//!
//! Thin async wrappers over the platform ports:
//! - [`AuthService`]: register, login, logout with presence mirroring
//! - [`UserService`]: profile documents under `users/{uid}`

mod auth;
mod error;
mod user;

pub use auth::{avatar_url, AuthResult, AuthService};
pub use error::{AuthError, UserServiceError, UNEXPECTED_ERROR_MESSAGE};
pub use user::{NewProfile, ProfileUpdate, UserResult, UserService, DEFAULT_BIO};
