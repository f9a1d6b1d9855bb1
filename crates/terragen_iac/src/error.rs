//! Error types for IaC module.

use thiserror::Error;

/// Result type alias for IaC operations.
pub type IacResult<T> = Result<T, IacError>;

/// Errors that can occur during IaC operations.
#[derive(Error, Debug)]
pub enum IacError {
    #[error("terraform CLI not available: {0}")]
    ToolNotAvailable(String),

    #[error("terraform {command} timed out after {seconds}s")]
    ToolTimeout { command: String, seconds: u64 },

    #[error("invalid bundle: {0}")]
    InvalidBundle(String),

    #[error("unknown GCP service: {0}")]
    UnknownService(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}
