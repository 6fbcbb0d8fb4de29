//! Domain models

mod user;
mod validation;

pub use user::{User, UserStatus};
pub use validation::{
    is_valid_email, is_valid_password, is_valid_username_charset, is_valid_username_length,
    MIN_PASSWORD_LEN, USERNAME_MAX_LEN, USERNAME_MIN_LEN,
};
