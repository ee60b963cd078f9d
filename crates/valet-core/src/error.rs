//! Error types for the valet-core crate.
//!
//! All core operations return [`CoreError`] via [`CoreResult`].

use thiserror::Error;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in the core domain layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An explicit command was syntactically malformed.  The message is
    /// corrective and safe to show to the user verbatim.
    #[error("{message}")]
    Validation { message: String },

    /// A datetime string matched none of the accepted formats.
    #[error(
        "could not parse datetime from '{value}'; accepted formats: \
         2025-11-15, 2025-11-15 09:00, 2025-11-15T09:00"
    )]
    DateTimeParse { value: String },

    /// Configuration loading or validation failed.
    #[error("config error: {reason}")]
    Config { reason: String },
}

impl CoreError {
    /// Shorthand for a [`CoreError::Validation`] with a formatted message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
