//! Credential-less validator built from the local checks.

use async_trait::async_trait;
use serde_json::Value;
use terragen_core::{
    CandidateValidator, CoreError, CoreResult, Finding, Review, Role, StageId, Transcript,
};
use tracing::debug;

use crate::bundle::TerraformBundle;
use crate::checks::StructuralChecker;
use crate::cli::{CliCheckOptions, TerraformCli};

/// Validator combining structural checks with optional `terraform` CLI runs.
///
/// Produces a deterministic, best-effort verdict without requiring external
/// credentials: Pass iff no Error-severity finding.
pub struct LocalValidator {
    structural: StructuralChecker,
    cli: Option<(TerraformCli, CliCheckOptions)>,
}

impl Default for LocalValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalValidator {
    /// Structural checks only.
    pub fn new() -> Self {
        Self {
            structural: StructuralChecker::new(),
            cli: None,
        }
    }

    /// Also run the terraform CLI checks.
    pub fn with_cli(mut self, cli: TerraformCli, options: CliCheckOptions) -> Self {
        self.cli = Some((cli, options));
        self
    }

    /// Run all configured checks against a bundle.
    pub async fn check(&self, bundle: &TerraformBundle) -> CoreResult<Vec<Finding>> {
        let mut findings = self.structural.check_bundle(bundle);

        if let Some((cli, options)) = &self.cli {
            let cli_findings = cli
                .check_bundle(bundle, *options)
                .await
                .map_err(|e| CoreError::external(e.to_string(), false))?;
            findings.extend(cli_findings);
        }

        Ok(findings)
    }
}

#[async_trait]
impl CandidateValidator for LocalValidator {
    async fn review(&self, candidate: &Value, transcript: &mut Transcript) -> CoreResult<Review> {
        let review = match serde_json::from_value::<TerraformBundle>(candidate.clone()) {
            Ok(bundle) => {
                let findings = self.check(&bundle).await?;
                debug!("Local checks produced {} findings", findings.len());
                Review::from_findings(findings)
            }
            Err(e) => Review::from_findings(vec![Finding::error(
                "bundle",
                format!("candidate is not a valid bundle: {e}"),
            )
            .with_fix("emit the documented bundle JSON structure")]),
        };

        let summary = review
            .summary
            .clone()
            .unwrap_or_else(|| format!("local checks: {} findings", review.findings.len()));
        transcript.append(StageId::Validate.as_str(), Role::Assistant, summary);

        Ok(review)
    }
}
