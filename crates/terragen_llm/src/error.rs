//! Error types for the LLM adapter.

use terragen_core::Transient;
use thiserror::Error;

/// Result type alias for LLM operations.
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors that can occur when talking to a model provider.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM not configured. Set OPENAI_API_KEY or ANTHROPIC_API_KEY")]
    NotConfigured,

    #[error("rate limited by {provider}")]
    RateLimited { provider: String },

    #[error("{provider} API error {status}: {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// Classify an HTTP status into the matching error variant.
    pub fn from_status(provider: &str, status: u16, message: String) -> Self {
        if status == 429 {
            Self::RateLimited {
                provider: provider.to_string(),
            }
        } else {
            Self::Api {
                provider: provider.to_string(),
                status,
                message,
            }
        }
    }
}

impl Transient for LlmError {
    fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Network(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::NotConfigured | Self::InvalidResponse(_) => false,
        }
    }
}
