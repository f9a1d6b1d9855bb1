//! Requirements extraction agent.
//!
//! Turns a free-text infrastructure request into a `RequirementsSpec`.

use std::sync::Arc;

use tracing::info;

use terragen_llm::{ChatCompleter, ChatMessage};

use crate::error::AgentResult;
use crate::roles::AgentRole;
use crate::schemas::RequirementsSpec;
use crate::support::parse_json;

const INSTRUCTION: &str = r#"You are an expert infrastructure requirements analyst specializing in Google Cloud Platform.

Your task is to parse natural language descriptions of applications and extract structured requirements.

Follow these steps:
1. Read and understand the user's application description
2. Identify all infrastructure components mentioned or implied
3. Determine resource requirements (compute, storage, networking, databases, etc.)
4. Infer reasonable defaults for unspecified requirements
5. Output a comprehensive JSON specification

The JSON output MUST follow this exact structure:
{
    "application_name": "string",
    "description": "string",
    "components": [
        {
            "type": "compute|storage|database|networking|messaging|other",
            "service": "specific GCP service name (e.g., cloud_run, gcs, cloud_sql)",
            "requirements": { "key": "value" },
            "notes": "any additional context"
        }
    ],
    "regions": ["list of GCP regions"],
    "environment": "dev|staging|prod",
    "estimated_scale": {
        "users": "number or range",
        "requests_per_second": "number or range",
        "data_size": "size estimate"
    }
}

Important guidelines:
- Be comprehensive but realistic
- Suggest appropriate GCP services based on requirements
- Include networking components (VPC, firewall rules) when needed
- Consider security best practices
- Infer missing details intelligently

Output JSON immediately in a ```json code block."#;

/// Agent that extracts structured requirements from free text.
pub struct RequirementsAgent {
    llm: Arc<dyn ChatCompleter>,
}

impl RequirementsAgent {
    pub fn new(llm: Arc<dyn ChatCompleter>) -> Self {
        Self { llm }
    }

    /// Extract requirements from the user's description.
    pub async fn extract(&self, user_input: &str) -> AgentResult<RequirementsSpec> {
        let messages = vec![
            ChatMessage::system(INSTRUCTION),
            ChatMessage::user(user_input),
        ];

        let completion = self.llm.complete(&messages).await?;
        let spec: RequirementsSpec =
            parse_json(AgentRole::Requirements.as_str(), &completion.content)?;

        info!(
            "Extracted requirements for '{}' with {} components",
            spec.application_name,
            spec.components.len()
        );
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terragen_llm::ScriptedCompleter;

    #[tokio::test]
    async fn test_extracts_spec_from_fenced_json() {
        let completer = ScriptedCompleter::new().reply(
            "```json\n{\"application_name\": \"web-shop\", \"components\": [{\"type\": \"compute\", \"service\": \"cloud_run\"}]}\n```",
        );
        let agent = RequirementsAgent::new(Arc::new(completer));

        let spec = agent.extract("a web shop on Cloud Run").await.unwrap();
        assert_eq!(spec.application_name, "web-shop");
        assert_eq!(spec.components.len(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_response_is_an_error() {
        let completer = ScriptedCompleter::new().reply("I cannot answer that.");
        let agent = RequirementsAgent::new(Arc::new(completer));

        let err = agent.extract("anything").await.unwrap_err();
        assert!(err.to_string().contains("requirements"));
    }
}
