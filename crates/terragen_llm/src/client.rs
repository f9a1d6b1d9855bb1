//! Chat completion client for OpenAI and Anthropic APIs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use terragen_core::Role;
use tracing::debug;

use crate::error::{LlmError, LlmResult};
use crate::messages::ChatMessage;

/// LLM provider type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAI,
    Anthropic,
}

/// Response from a completion including usage info
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub model: String,
}

/// Anything that can complete a conversation.
///
/// The pipeline depends on this trait rather than on `LlmClient` directly so
/// tests can substitute a scripted completer.
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> LlmResult<Completion>;
}

/// LLM client that handles API calls.
///
/// Each call is a single attempt; the iteration controller owns the retry
/// policy for transient failures.
pub struct LlmClient {
    provider: LlmProvider,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl LlmClient {
    /// Create a new client with explicit configuration
    pub fn new(provider: LlmProvider, api_key: String, model: Option<String>) -> Self {
        let default_model = match provider {
            LlmProvider::OpenAI => "gpt-5-mini".to_string(),
            LlmProvider::Anthropic => "claude-sonnet-4.5".to_string(),
        };

        Self {
            provider,
            api_key,
            model: model.unwrap_or(default_model),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client from environment variables
    ///
    /// Checks in order:
    /// 1. OPENAI_API_KEY
    /// 2. ANTHROPIC_API_KEY
    pub fn from_env() -> LlmResult<Self> {
        // Check for custom model override
        let custom_model = std::env::var("TERRAGEN_MODEL").ok();

        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            if !api_key.is_empty() {
                return Ok(Self::new(LlmProvider::OpenAI, api_key, custom_model));
            }
        }

        if let Ok(api_key) = std::env::var("ANTHROPIC_API_KEY") {
            if !api_key.is_empty() {
                return Ok(Self::new(LlmProvider::Anthropic, api_key, custom_model));
            }
        }

        Err(LlmError::NotConfigured)
    }

    /// Create a client from workspace settings, falling back to env defaults
    ///
    /// Reads `.terragen/settings.json` for `defaultProvider` / `defaultModel`;
    /// the API key always comes from the environment.
    pub fn from_settings(workspace_root: &std::path::Path) -> LlmResult<Self> {
        let settings_path = workspace_root.join(".terragen").join("settings.json");

        let (provider_str, model) = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)
                .map_err(|e| LlmError::InvalidResponse(format!("settings unreadable: {e}")))?;
            let settings: serde_json::Value = serde_json::from_str(&content)
                .map_err(|e| LlmError::InvalidResponse(format!("settings malformed: {e}")))?;
            let provider = settings
                .get("defaultProvider")
                .and_then(|v| v.as_str())
                .unwrap_or("openai")
                .to_string();
            let model = settings
                .get("defaultModel")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());
            (provider, model)
        } else {
            return Self::from_env();
        };

        let (provider, api_key) = if provider_str == "anthropic" {
            let key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| LlmError::NotConfigured)?;
            if key.is_empty() {
                return Err(LlmError::NotConfigured);
            }
            (LlmProvider::Anthropic, key)
        } else {
            let key = std::env::var("OPENAI_API_KEY").map_err(|_| LlmError::NotConfigured)?;
            if key.is_empty() {
                return Err(LlmError::NotConfigured);
            }
            (LlmProvider::OpenAI, key)
        };

        Ok(Self::new(provider, api_key, model))
    }

    /// Get the current provider
    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }

    /// Get the current model
    pub fn model(&self) -> &str {
        &self.model
    }

    // OpenAI chat completion
    async fn complete_openai(&self, messages: &[ChatMessage]) -> LlmResult<Completion> {
        let url = "https://api.openai.com/v1/chat/completions";

        let openai_messages: Vec<OpenAIMessage> = messages
            .iter()
            .map(|m| OpenAIMessage {
                role: match m.role {
                    Role::System => "system".to_string(),
                    Role::User => "user".to_string(),
                    Role::Assistant => "assistant".to_string(),
                },
                content: m.content.clone(),
            })
            .collect();

        let request = OpenAIRequest {
            model: self.model.clone(),
            messages: openai_messages,
            max_completion_tokens: Some(8192),
        };

        debug!("Requesting OpenAI completion with {}", self.model);

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status("openai", status.as_u16(), body));
        }

        let result: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("failed to parse response: {e}")))?;

        let content = result
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| LlmError::InvalidResponse("no response from OpenAI".to_string()))?;

        let (input_tokens, output_tokens) = result
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        Ok(Completion {
            content,
            input_tokens,
            output_tokens,
            model: self.model.clone(),
        })
    }

    // Anthropic chat completion
    async fn complete_anthropic(&self, messages: &[ChatMessage]) -> LlmResult<Completion> {
        let url = "https://api.anthropic.com/v1/messages";

        // Anthropic requires the system message to be separate
        let system_message = messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.clone());

        let anthropic_messages: Vec<AnthropicMessage> = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| AnthropicMessage {
                role: match m.role {
                    Role::Assistant => "assistant".to_string(),
                    _ => "user".to_string(),
                },
                content: m.content.clone(),
            })
            .collect();

        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: 8192,
            system: system_message,
            messages: anthropic_messages,
        };

        debug!("Requesting Anthropic completion with {}", self.model);

        let response = self
            .client
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status("anthropic", status.as_u16(), body));
        }

        let result: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("failed to parse response: {e}")))?;

        let content = result
            .content
            .first()
            .map(|c| c.text.clone())
            .ok_or_else(|| LlmError::InvalidResponse("no response from Anthropic".to_string()))?;

        let (input_tokens, output_tokens) = result
            .usage
            .map(|u| (u.input_tokens, u.output_tokens))
            .unwrap_or((0, 0));

        Ok(Completion {
            content,
            input_tokens,
            output_tokens,
            model: self.model.clone(),
        })
    }
}

#[async_trait]
impl ChatCompleter for LlmClient {
    async fn complete(&self, messages: &[ChatMessage]) -> LlmResult<Completion> {
        match self.provider {
            LlmProvider::OpenAI => self.complete_openai(messages).await,
            LlmProvider::Anthropic => self.complete_anthropic(messages).await,
        }
    }
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: String,
}

// Anthropic API types
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_detection() {
        // Clear env vars for predictable test
        std::env::remove_var("OPENAI_API_KEY");
        std::env::remove_var("ANTHROPIC_API_KEY");
        std::env::remove_var("TERRAGEN_MODEL");

        // Should fail when no keys are set
        assert!(LlmClient::from_env().is_err());

        // Test with OpenAI key
        std::env::set_var("OPENAI_API_KEY", "test-key");
        let client = LlmClient::from_env().unwrap();
        assert_eq!(client.provider(), &LlmProvider::OpenAI);
        std::env::remove_var("OPENAI_API_KEY");

        // Test with Anthropic key
        std::env::set_var("ANTHROPIC_API_KEY", "test-key");
        let client = LlmClient::from_env().unwrap();
        assert_eq!(client.provider(), &LlmProvider::Anthropic);
        std::env::remove_var("ANTHROPIC_API_KEY");
    }

    #[test]
    fn test_default_models() {
        let openai = LlmClient::new(LlmProvider::OpenAI, "key".to_string(), None);
        assert_eq!(openai.model(), "gpt-5-mini");

        let anthropic = LlmClient::new(LlmProvider::Anthropic, "key".to_string(), None);
        assert_eq!(anthropic.model(), "claude-sonnet-4.5");
    }

    #[test]
    fn test_custom_model() {
        let client = LlmClient::new(
            LlmProvider::OpenAI,
            "key".to_string(),
            Some("gpt-4.1".to_string()),
        );
        assert_eq!(client.model(), "gpt-4.1");
    }
}
