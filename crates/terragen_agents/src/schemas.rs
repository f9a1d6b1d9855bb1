//! Typed output schemas for agent responses.
//!
//! Each agent outputs JSON matching one of these shapes. Parsing happens at
//! the agent boundary so the rest of the pipeline works with typed data.
//! Optional fields default rather than fail: model output varies.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use terragen_core::Finding;

fn default_environment() -> String {
    "dev".to_string()
}

/// One infrastructure component named in the requirements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentSpec {
    /// Component category (compute, storage, database, networking, ...)
    #[serde(rename = "type", default)]
    pub kind: String,
    /// GCP service name (e.g. cloud_run, gcs, cloud_sql)
    pub service: String,
    #[serde(default)]
    pub requirements: HashMap<String, Value>,
    #[serde(default)]
    pub notes: String,
}

/// Structured requirements extracted from the user's description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementsSpec {
    pub application_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub components: Vec<ComponentSpec>,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_scale: Option<Value>,
}

impl RequirementsSpec {
    /// Distinct services named across the components.
    pub fn services(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for component in &self.components {
            if !seen.contains(&component.service.as_str()) {
                seen.push(component.service.as_str());
            }
        }
        seen
    }
}

/// One Terraform module in the architecture plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanModule {
    pub module_name: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub resources: Vec<Value>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// The designed architecture: module topology and deployment ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchitecturePlan {
    pub architecture_name: String,
    #[serde(default)]
    pub description: String,
    pub modules: Vec<PlanModule>,
    #[serde(default)]
    pub deployment_order: Vec<String>,
    /// Service pairing notes filled in from the catalog, not by the model
    #[serde(default)]
    pub compatibility_notes: Vec<String>,
}

/// Overall critic verdict.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Passed,
    Failed,
}

/// Structured output from the validation critic.
///
/// Findings are capped and kept short so the feedback loop does not flood
/// later prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticReport {
    pub validation_status: ValidationStatus,
    #[serde(default)]
    pub syntax_valid: bool,
    #[serde(default)]
    pub configuration_valid: bool,
    #[serde(default)]
    pub errors: Vec<Finding>,
    #[serde(default)]
    pub error_count: u32,
    #[serde(default)]
    pub summary: String,
}

impl CriticReport {
    /// Fallback report for an unparseable critic response.
    pub fn unparseable(detail: &str) -> Self {
        let clipped: String = detail.chars().take(150).collect();
        Self {
            validation_status: ValidationStatus::Failed,
            syntax_valid: true,
            configuration_valid: false,
            errors: vec![Finding::error("unknown", "critic response unparseable")
                .with_fix("emit JSON matching the report schema")],
            error_count: 1,
            summary: format!("Parse error: {clipped}"),
        }
    }
}

/// Documentation produced for the generated infrastructure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentationSet {
    pub readme: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_guide: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture_diagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_guide: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub troubleshooting: Option<String>,
}

impl DocumentationSet {
    /// Filename/content pairs for write-out.
    pub fn files(&self) -> Vec<(&'static str, &str)> {
        let mut out = vec![("README.md", self.readme.as_str())];
        if let Some(guide) = &self.deployment_guide {
            out.push(("DEPLOYMENT.md", guide.as_str()));
        }
        if let Some(diagram) = &self.architecture_diagram {
            out.push(("architecture.mmd", diagram.as_str()));
        }
        if let Some(security) = &self.security_guide {
            out.push(("SECURITY.md", security.as_str()));
        }
        if let Some(troubleshooting) = &self.troubleshooting {
            out.push(("TROUBLESHOOTING.md", troubleshooting.as_str()));
        }
        out
    }
}
