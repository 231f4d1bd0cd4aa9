//! # Application Errors
//!
//! One error taxonomy for the whole crate. Policy decisions and the deadline
//! gate never construct these themselves; callers translate their booleans
//! and states into `Forbidden`.

use thiserror::Error;

/// Result type for core operations
pub type AppResult<T> = Result<T, AppError>;

/// Client-visible failure taxonomy
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Unknown order, item, or invite token
    #[error("Not found")]
    NotFound,

    /// Authorization or deadline-gate denial. An invalid admin secret uses
    /// the same shape as an unknown order so guessers learn nothing.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Malformed client input (deadline timestamps, config values)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage or lock failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    /// Shorthand for a `Forbidden` with a message
    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(message.into())
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::NotFound => 404,
            AppError::Forbidden(_) => 403,
            AppError::InvalidInput(_) => 400,
            AppError::Storage(_) => 500,
        }
    }

    /// Returns whether this error should be logged at warn level
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}
