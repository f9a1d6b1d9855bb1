//! Terraform generator agent.
//!
//! Produces candidate bundles from the architecture plan. In the validation
//! loop the same agent is re-invoked with the rendered findings of the
//! previous pass; the transcript replays earlier attempts so corrections
//! build on what was already tried.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use terragen_core::{CandidateGenerator, CoreError, CoreResult, Role, StageId, Transcript};
use terragen_iac::TerraformBundle;
use terragen_llm::{ChatCompleter, ChatMessage};

use crate::error::AgentError;
use crate::roles::AgentRole;
use crate::support::{parse_json, transcript_messages};

const INSTRUCTION: &str = r#"You are an expert Terraform developer specializing in Google Cloud Platform.

Your task is to receive an architecture specification and generate complete, production-ready Terraform code.

Your responsibilities:
1. Generate complete Terraform code for each module
2. Create provider configurations
3. Define variables and outputs
4. Include proper resource dependencies
5. Use Terraform best practices

Terraform best practices to follow:
1. Naming: lowercase with underscores (snake_case)
2. Variables: define all configurable values as variables
3. Outputs: export important resource attributes
4. Dependencies: use depends_on for explicit dependencies
5. Labels: include labels for resource organization
6. Modules: keep modules focused and reusable
7. Versions: specify provider versions

Output JSON structure:
{
    "terraform_version": "1.5",
    "modules": [
        {
            "module_name": "vpc",
            "path": "modules/vpc",
            "files": [
                { "filename": "main.tf", "content": "..." },
                { "filename": "variables.tf", "content": "..." },
                { "filename": "outputs.tf", "content": "..." }
            ]
        }
    ],
    "environments": {
        "dev": {
            "main_tf": "...",
            "variables_tf": "...",
            "outputs_tf": "...",
            "provider_tf": "...",
            "terraform_tfvars_example": "..."
        }
    }
}

Output JSON immediately in a ```json code block."#;

/// Agent that generates Terraform bundles.
pub struct GeneratorAgent {
    llm: Arc<dyn ChatCompleter>,
}

impl GeneratorAgent {
    pub fn new(llm: Arc<dyn ChatCompleter>) -> Self {
        Self { llm }
    }

    fn build_prompt(plan_json: &str, feedback: Option<&str>) -> String {
        match feedback {
            None => format!(
                "Generate complete Terraform code for this architecture:\n\n\
                 {plan_json}\n\n\
                 Output all Terraform files in JSON format."
            ),
            Some(feedback) => format!(
                "The previous Terraform code had validation errors. Please fix them.\n\n\
                 ORIGINAL ARCHITECTURE:\n{plan_json}\n\n\
                 VALIDATION FEEDBACK:\n{feedback}\n\n\
                 Generate corrected Terraform code that addresses all the issues above.\n\
                 Output the corrected code in JSON format."
            ),
        }
    }
}

#[async_trait]
impl CandidateGenerator for GeneratorAgent {
    async fn propose(
        &self,
        plan: &Value,
        feedback: Option<&str>,
        transcript: &mut Transcript,
    ) -> CoreResult<Value> {
        let plan_json = serde_json::to_string_pretty(plan)
            .map_err(|e| CoreError::Serialization(e.to_string()))?;
        let prompt = Self::build_prompt(&plan_json, feedback);

        let mut messages = vec![ChatMessage::system(INSTRUCTION)];
        messages.extend(transcript_messages(transcript));
        messages.push(ChatMessage::user(&prompt));

        let completion = self
            .llm
            .complete(&messages)
            .await
            .map_err(|e| CoreError::from(AgentError::Llm(e)))?;

        transcript.append(StageId::Generate.as_str(), Role::User, prompt);
        transcript.append(
            StageId::Generate.as_str(),
            Role::Assistant,
            completion.content.clone(),
        );

        let bundle: TerraformBundle = parse_json(AgentRole::Generator.as_str(), &completion.content)
            .map_err(CoreError::from)?;
        info!("Generated candidate bundle with {} files", bundle.file_count());

        serde_json::to_value(bundle).map_err(|e| CoreError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use terragen_llm::ScriptedCompleter;

    const BUNDLE_REPLY: &str = "```json\n{\"terraform_version\": \"1.5\", \"modules\": [{\"module_name\": \"vpc\", \"files\": [{\"filename\": \"main.tf\", \"content\": \"resource \\\"google_compute_network\\\" \\\"vpc\\\" {}\"}]}], \"environments\": {}}\n```";

    #[tokio::test]
    async fn test_first_pass_prompt_has_no_feedback() {
        let completer = ScriptedCompleter::new().reply(BUNDLE_REPLY);
        let agent = GeneratorAgent::new(Arc::new(completer.clone()));
        let mut transcript = Transcript::new();

        let candidate = agent
            .propose(&json!({"architecture_name": "a"}), None, &mut transcript)
            .await
            .unwrap();

        let bundle: TerraformBundle = serde_json::from_value(candidate).unwrap();
        assert_eq!(bundle.modules[0].module_name, "vpc");

        let captured = completer.captured();
        let prompt = &captured[0].last().unwrap().content;
        assert!(prompt.contains("Generate complete Terraform code"));
        assert!(!prompt.contains("VALIDATION FEEDBACK"));
        assert_eq!(transcript.len(), 2);
    }

    #[tokio::test]
    async fn test_regeneration_replays_transcript_and_feedback() {
        let completer = ScriptedCompleter::new().reply(BUNDLE_REPLY);
        let agent = GeneratorAgent::new(Arc::new(completer.clone()));
        let mut transcript = Transcript::new();
        transcript.append("generate", Role::Assistant, "previous attempt");

        agent
            .propose(
                &json!({}),
                Some("- [main.tf] unbalanced braces"),
                &mut transcript,
            )
            .await
            .unwrap();

        let captured = completer.captured();
        let messages = &captured[0];
        // system + replayed exchange + current prompt
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].content, "previous attempt");
        assert!(messages[2].content.contains("VALIDATION FEEDBACK"));
        assert!(messages[2].content.contains("unbalanced braces"));
    }

    #[tokio::test]
    async fn test_unparseable_candidate_is_fatal() {
        let completer = ScriptedCompleter::new().reply("no json here");
        let agent = GeneratorAgent::new(Arc::new(completer));
        let mut transcript = Transcript::new();

        let err = agent
            .propose(&json!({}), None, &mut transcript)
            .await
            .unwrap_err();
        assert!(!terragen_core::Transient::is_transient(&err));
    }
}
