//! Error types for agents module.

use terragen_core::{CoreError, Transient};
use terragen_iac::IacError;
use terragen_llm::LlmError;
use thiserror::Error;

/// Result type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

/// Errors that can occur during agent operations.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("{agent} returned unparseable output: {message}")]
    Parse { agent: String, message: String },

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("IaC error: {0}")]
    Iac(#[from] IacError),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    /// Create a parse error for an agent's response.
    pub fn parse(agent: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            agent: agent.into(),
            message: message.into(),
        }
    }
}

impl Transient for AgentError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Llm(e) => e.is_transient(),
            Self::Core(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<AgentError> for CoreError {
    fn from(err: AgentError) -> Self {
        let transient = err.is_transient();
        CoreError::external(err.to_string(), transient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transience_follows_source() {
        let rate_limited = AgentError::Llm(LlmError::RateLimited {
            provider: "openai".into(),
        });
        assert!(rate_limited.is_transient());

        let parse = AgentError::parse("generator", "bad json");
        assert!(!parse.is_transient());
    }

    #[test]
    fn test_core_conversion_preserves_transience() {
        let err = AgentError::Llm(LlmError::Network("reset".into()));
        let core: CoreError = err.into();
        assert!(core.is_transient());
    }
}
