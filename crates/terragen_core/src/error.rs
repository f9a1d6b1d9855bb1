//! Error types for the core module.

use thiserror::Error;

use crate::retry::Transient;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur during core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("external call failed: {message}")]
    External { message: String, transient: bool },

    #[error("{operation} failed after {attempts} attempts: {last}")]
    RetryExhausted {
        operation: String,
        attempts: u32,
        last: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl CoreError {
    /// Wrap an external-call failure, preserving whether it may be retried.
    pub fn external(message: impl Into<String>, transient: bool) -> Self {
        Self::External {
            message: message.into(),
            transient,
        }
    }
}

impl Transient for CoreError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::External { transient: true, .. })
    }
}
