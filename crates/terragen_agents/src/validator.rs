//! Validation critic agent and the composed validator stack.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use terragen_core::{
    CandidateValidator, CoreError, CoreResult, Finding, Review, Role, StageId, Transcript,
};
use terragen_iac::{LocalValidator, TerraformBundle};
use terragen_llm::{ChatCompleter, ChatMessage};

use crate::error::AgentError;
use crate::schemas::CriticReport;
use crate::support::{parse_json, transcript_messages};

const INSTRUCTION: &str = r#"You are a Terraform validation expert. Analyze Terraform code for errors and issues.

CRITICAL: Output ONLY valid JSON that matches this schema exactly:
{
  "validation_status": "passed" or "failed",
  "syntax_valid": true or false,
  "configuration_valid": true or false,
  "errors": [
    {
      "severity": "error" or "warning" or "info",
      "file": "path/to/file",
      "message": "Max 100 chars",
      "fix": "Max 100 chars"
    }
  ],
  "error_count": number,
  "summary": "Max 200 chars"
}

Rules:
- Max 10 errors
- Keep messages under 100 characters
- Keep summary under 200 characters
- No code snippets in messages

Check for:
1. Syntax errors
2. Missing required fields
3. Invalid resource references
4. Security issues (public IPs, open access)
5. Best practices violations

Output JSON immediately in a ```json code block."#;

/// LLM-backed reviewer producing a structured report.
pub struct CriticAgent {
    llm: Arc<dyn ChatCompleter>,
}

impl CriticAgent {
    pub fn new(llm: Arc<dyn ChatCompleter>) -> Self {
        Self { llm }
    }

    /// Critique a candidate bundle.
    ///
    /// An unparseable critic response degrades to a failed report with one
    /// synthetic finding rather than an error.
    pub async fn critique(
        &self,
        candidate: &Value,
        transcript: &mut Transcript,
    ) -> Result<CriticReport, AgentError> {
        let candidate_json = serde_json::to_string_pretty(candidate)
            .map_err(|e| AgentError::Serialization(e.to_string()))?;
        let prompt = format!(
            "Validate this Terraform code thoroughly:\n\n{candidate_json}\n\n\
             Provide detailed feedback in JSON format."
        );

        let mut messages = vec![ChatMessage::system(INSTRUCTION)];
        messages.extend(transcript_messages(transcript));
        messages.push(ChatMessage::user(&prompt));

        let completion = self.llm.complete(&messages).await?;

        let report = parse_json::<CriticReport>("critic", &completion.content)
            .unwrap_or_else(|e| CriticReport::unparseable(&e.to_string()));

        transcript.append(
            StageId::Validate.as_str(),
            Role::Assistant,
            report.summary.clone(),
        );
        debug!(
            "Critic verdict: {:?} with {} findings",
            report.validation_status,
            report.errors.len()
        );
        Ok(report)
    }
}

/// The loop's validator: structural checks, optional terraform CLI runs,
/// optional critic, merged into one review.
pub struct ValidatorStack {
    local: LocalValidator,
    critic: Option<CriticAgent>,
}

impl ValidatorStack {
    pub fn new(local: LocalValidator) -> Self {
        Self {
            local,
            critic: None,
        }
    }

    pub fn with_critic(mut self, critic: CriticAgent) -> Self {
        self.critic = Some(critic);
        self
    }
}

#[async_trait]
impl CandidateValidator for ValidatorStack {
    async fn review(&self, candidate: &Value, transcript: &mut Transcript) -> CoreResult<Review> {
        let bundle = match serde_json::from_value::<TerraformBundle>(candidate.clone()) {
            Ok(bundle) => bundle,
            Err(e) => {
                let review = Review::from_findings(vec![Finding::error(
                    "bundle",
                    format!("candidate is not a valid bundle: {e}"),
                )
                .with_fix("emit the documented bundle JSON structure")]);
                transcript.append(
                    StageId::Validate.as_str(),
                    Role::Assistant,
                    "candidate rejected: not a valid bundle",
                );
                return Ok(review);
            }
        };

        let mut findings = self.local.check(&bundle).await?;

        if let Some(critic) = &self.critic {
            let report = critic
                .critique(candidate, transcript)
                .await
                .map_err(CoreError::from)?;
            findings.extend(report.errors);
        }

        let review = Review::from_findings(findings);
        info!(
            "Validation verdict: {:?} ({} findings)",
            review.verdict,
            review.findings.len()
        );
        transcript.append(
            StageId::Validate.as_str(),
            Role::Assistant,
            format!(
                "verdict: {:?}, findings: {}",
                review.verdict,
                review.findings.len()
            ),
        );
        Ok(review)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use terragen_llm::ScriptedCompleter;

    fn clean_candidate() -> Value {
        json!({
            "terraform_version": "1.5",
            "modules": [{
                "module_name": "vpc",
                "files": [{ "filename": "main.tf", "content": "resource \"google_compute_network\" \"vpc\" {}\n" }]
            }],
            "environments": {}
        })
    }

    #[tokio::test]
    async fn test_stack_without_critic_uses_local_checks() {
        let stack = ValidatorStack::new(LocalValidator::new());
        let mut transcript = Transcript::new();

        let review = stack
            .review(&clean_candidate(), &mut transcript)
            .await
            .unwrap();
        assert!(review.passed());
    }

    #[tokio::test]
    async fn test_critic_findings_are_merged() {
        let completer = ScriptedCompleter::new().reply(
            "```json\n{\"validation_status\": \"failed\", \"syntax_valid\": true, \"configuration_valid\": false, \"errors\": [{\"severity\": \"error\", \"file\": \"modules/vpc/main.tf\", \"message\": \"missing name\", \"fix\": \"set name\"}], \"error_count\": 1, \"summary\": \"one error\"}\n```",
        );
        let stack = ValidatorStack::new(LocalValidator::new())
            .with_critic(CriticAgent::new(Arc::new(completer)));
        let mut transcript = Transcript::new();

        let review = stack
            .review(&clean_candidate(), &mut transcript)
            .await
            .unwrap();
        assert!(!review.passed());
        assert!(review.findings.iter().any(|f| f.message == "missing name"));
    }

    #[tokio::test]
    async fn test_unparseable_critic_degrades_to_failed_report() {
        let completer = ScriptedCompleter::new().reply("utter nonsense");
        let stack = ValidatorStack::new(LocalValidator::new())
            .with_critic(CriticAgent::new(Arc::new(completer)));
        let mut transcript = Transcript::new();

        let review = stack
            .review(&clean_candidate(), &mut transcript)
            .await
            .unwrap();
        assert!(!review.passed());
        assert!(review
            .findings
            .iter()
            .any(|f| f.message.contains("critic response unparseable")));
    }

    #[tokio::test]
    async fn test_warning_only_critique_still_passes() {
        let completer = ScriptedCompleter::new().reply(
            "```json\n{\"validation_status\": \"passed\", \"syntax_valid\": true, \"configuration_valid\": true, \"errors\": [{\"severity\": \"warning\", \"file\": \"modules/vpc/main.tf\", \"message\": \"no labels\", \"fix\": \"add labels\"}], \"error_count\": 0, \"summary\": \"ok\"}\n```",
        );
        let stack = ValidatorStack::new(LocalValidator::new())
            .with_critic(CriticAgent::new(Arc::new(completer)));
        let mut transcript = Transcript::new();

        let review = stack
            .review(&clean_candidate(), &mut transcript)
            .await
            .unwrap();
        assert!(review.passed());
        assert_eq!(review.findings.len(), 1);
    }

    #[tokio::test]
    async fn test_transient_critic_failure_propagates() {
        let completer = ScriptedCompleter::new().reply_rate_limited();
        let stack = ValidatorStack::new(LocalValidator::new())
            .with_critic(CriticAgent::new(Arc::new(completer)));
        let mut transcript = Transcript::new();

        let err = stack
            .review(&clean_candidate(), &mut transcript)
            .await
            .unwrap_err();
        assert!(terragen_core::Transient::is_transient(&err));
    }
}
