//! Router error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// No element with the configured root id exists
    #[error("Root element #{0} not found")]
    MissingRoot(String),

    #[error("View {0} not found")]
    ViewNotFound(String),
}
