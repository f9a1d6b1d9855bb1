//! End-to-end generation pipeline.
//!
//! Drives the stages in order: requirements extraction, architecture
//! design, the generate/validate loop, documentation, and artifact
//! write-out. Strictly sequential; each stage blocks on the previous
//! result. Aborting a run mid-loop leaves the persisted iteration history
//! in place for diagnostics.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use terragen_core::{
    retry_with_backoff, Finding, RetryPolicy, Transcript, ValidationLoop,
};
use terragen_iac::{
    ArtifactWriter, CliCheckOptions, LocalValidator, TerraformBundle, TerraformCli,
};
use terragen_llm::ChatCompleter;

use crate::architecture::ArchitectAgent;
use crate::documentation::DocumentationAgent;
use crate::error::{AgentError, AgentResult};
use crate::generator::GeneratorAgent;
use crate::requirements::RequirementsAgent;
use crate::schemas::{ArchitecturePlan, DocumentationSet, RequirementsSpec};
use crate::validator::{CriticAgent, ValidatorStack};

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory the run writes its artifacts to
    pub output_dir: PathBuf,
    /// Iteration ceiling for the validation loop
    pub max_iterations: u32,
    /// Retry policy for transient external failures
    pub retry: RetryPolicy,
    /// Run the terraform CLI checks when the binary is available
    pub terraform_cli: bool,
    /// Also run terraform plan (implies terraform_cli)
    pub run_plan: bool,
    /// Include the LLM critic in the validator stack
    pub critic: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            max_iterations: 20,
            retry: RetryPolicy::default(),
            terraform_cli: true,
            run_plan: false,
            critic: true,
        }
    }
}

/// Everything a completed run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub requirements: RequirementsSpec,
    pub architecture: ArchitecturePlan,
    /// Whether the validation loop reached a Pass verdict
    pub converged: bool,
    /// Number of loop iterations run
    pub iterations: u32,
    pub bundle: TerraformBundle,
    /// Findings from the final validation pass
    pub final_findings: Vec<Finding>,
    pub documentation: DocumentationSet,
    pub output_dir: PathBuf,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
struct ValidationSummary {
    converged: bool,
    iterations: u32,
    findings: Vec<Finding>,
}

/// The end-to-end pipeline.
pub struct Pipeline {
    llm: Arc<dyn ChatCompleter>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(llm: Arc<dyn ChatCompleter>, config: PipelineConfig) -> Self {
        Self { llm, config }
    }

    /// Run the full pipeline for one request.
    pub async fn run(&self, user_input: &str) -> AgentResult<RunReport> {
        let started_at = Utc::now();

        // An unwritable output directory fails the run before any stage.
        std::fs::create_dir_all(&self.config.output_dir)?;
        let writer = ArtifactWriter::new(&self.config.output_dir);

        let mut transcript = Transcript::new();
        let run_id = transcript.run_id;
        info!("Starting run {} for request: {}", run_id, summarize(user_input));

        // Stage 1: requirements extraction
        let requirements_agent = Arc::new(RequirementsAgent::new(self.llm.clone()));
        let input = user_input.to_string();
        let requirements = retry_with_backoff(&self.config.retry, |_| {
            let agent = Arc::clone(&requirements_agent);
            let input = input.clone();
            async move { agent.extract(&input).await }
        })
        .await?;
        writer.write_metadata("requirements.json", &requirements)?;

        // Stage 2: architecture design
        let architect = Arc::new(ArchitectAgent::new(self.llm.clone()));
        let architecture = retry_with_backoff(&self.config.retry, |_| {
            let agent = Arc::clone(&architect);
            let requirements = requirements.clone();
            async move { agent.design(&requirements).await }
        })
        .await?;
        writer.write_metadata("architecture.json", &architecture)?;

        // Stages 3+4: the generate/validate loop
        let plan_value = serde_json::to_value(&architecture)
            .map_err(|e| AgentError::Serialization(e.to_string()))?;

        let generator = GeneratorAgent::new(self.llm.clone());
        let validator = self.build_validator();

        let looper = ValidationLoop::new(self.config.max_iterations)
            .with_retry(self.config.retry)
            .with_history_path(
                self.config
                    .output_dir
                    .join(".terragen")
                    .join("iterations.json"),
            );
        let outcome = looper
            .run(&plan_value, &generator, &validator, &mut transcript)
            .await?;

        let bundle: TerraformBundle = serde_json::from_value(outcome.candidate().clone())
            .map_err(|e| AgentError::Serialization(e.to_string()))?;
        let summary = ValidationSummary {
            converged: outcome.converged(),
            iterations: outcome.iterations(),
            findings: outcome
                .history()
                .last()
                .map(|r| r.findings.clone())
                .unwrap_or_default(),
        };

        // Stage 5: documentation, produced on exhaustion too
        let documenter = Arc::new(DocumentationAgent::new(self.llm.clone()));
        let documentation = retry_with_backoff(&self.config.retry, |_| {
            let agent = Arc::clone(&documenter);
            let architecture = architecture.clone();
            let bundle = bundle.clone();
            let summary = summary.clone();
            async move { agent.document(&architecture, &bundle, &summary).await }
        })
        .await?;

        // Write-out
        writer.write_bundle(&bundle)?;
        for (filename, content) in documentation.files() {
            writer.write_document(filename, content)?;
        }

        let report = RunReport {
            run_id,
            requirements,
            architecture,
            converged: summary.converged,
            iterations: summary.iterations,
            bundle,
            final_findings: summary.findings,
            documentation,
            output_dir: self.config.output_dir.clone(),
            started_at,
            completed_at: Utc::now(),
        };
        writer.write_metadata("run_report.json", &report)?;

        info!(
            "Run {} finished: converged={} after {} iterations",
            run_id, report.converged, report.iterations
        );
        Ok(report)
    }

    fn build_validator(&self) -> ValidatorStack {
        let mut local = LocalValidator::new();
        if self.config.terraform_cli || self.config.run_plan {
            local = local.with_cli(
                TerraformCli::new(),
                CliCheckOptions {
                    run_plan: self.config.run_plan,
                },
            );
        }

        let mut stack = ValidatorStack::new(local);
        if self.config.critic {
            stack = stack.with_critic(CriticAgent::new(self.llm.clone()));
        }
        stack
    }
}

fn summarize(input: &str) -> String {
    let joined = input.split_whitespace().collect::<Vec<_>>().join(" ");
    if joined.chars().count() <= 80 {
        return joined;
    }
    let mut summary: String = joined.chars().take(80).collect();
    summary.push('…');
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_iterations, 20);
        assert!(config.critic);
        assert!(!config.run_plan);
    }

    #[test]
    fn test_summarize_clamps_length() {
        let long = "word ".repeat(100);
        assert!(summarize(&long).chars().count() <= 81);
        assert_eq!(summarize("short request"), "short request");
    }
}
