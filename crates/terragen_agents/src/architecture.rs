//! Architecture design agent.
//!
//! Turns a `RequirementsSpec` into an `ArchitecturePlan`, consulting the
//! GCP service catalog for availability and pairing constraints.

use std::sync::Arc;

use tracing::info;

use terragen_iac::catalog;
use terragen_llm::{ChatCompleter, ChatMessage};

use crate::error::{AgentError, AgentResult};
use crate::roles::AgentRole;
use crate::schemas::{ArchitecturePlan, RequirementsSpec};
use crate::support::parse_json;

const INSTRUCTION: &str = r#"You are a senior cloud architect specializing in Google Cloud Platform and Terraform best practices.

Your task is to receive infrastructure requirements and design a comprehensive architecture with Terraform module structure.

CRITICAL: You MUST output ONLY valid JSON in the exact format specified below. Do NOT output explanations or plans.

Your responsibilities:
1. Design the overall architecture topology
2. Determine Terraform module structure
3. Define resource dependencies
4. Plan network architecture
5. Consider security and IAM requirements

Output JSON structure:
{
    "architecture_name": "string",
    "description": "string",
    "modules": [
        {
            "module_name": "string",
            "purpose": "string",
            "resources": [ { "type": "terraform resource type", "name": "string" } ],
            "outputs": ["list of output names"],
            "dependencies": ["list of module names"]
        }
    ],
    "deployment_order": ["ordered list of module names"]
}

Output JSON immediately in a ```json code block."#;

/// Agent that designs the module topology.
pub struct ArchitectAgent {
    llm: Arc<dyn ChatCompleter>,
}

impl ArchitectAgent {
    pub fn new(llm: Arc<dyn ChatCompleter>) -> Self {
        Self { llm }
    }

    /// Design an architecture for the extracted requirements.
    pub async fn design(&self, requirements: &RequirementsSpec) -> AgentResult<ArchitecturePlan> {
        let requirements_json = serde_json::to_string_pretty(requirements)
            .map_err(|e| AgentError::Serialization(e.to_string()))?;

        let prompt = format!(
            "Design a GCP infrastructure architecture based on these requirements:\n\n\
             {requirements_json}\n\n\
             Service catalog facts to respect:\n{catalog}\n\n\
             Output the complete architecture specification in JSON format.",
            catalog = catalog_brief(requirements),
        );

        let messages = vec![ChatMessage::system(INSTRUCTION), ChatMessage::user(prompt)];
        let completion = self.llm.complete(&messages).await?;
        let mut plan: ArchitecturePlan =
            parse_json(AgentRole::Architect.as_str(), &completion.content)?;

        plan.compatibility_notes = compatibility_notes(requirements);

        info!(
            "Designed architecture '{}' with {} modules",
            plan.architecture_name,
            plan.modules.len()
        );
        Ok(plan)
    }
}

// Availability and pairing facts from the catalog, rendered for the prompt.
fn catalog_brief(requirements: &RequirementsSpec) -> String {
    let mut lines = Vec::new();

    for service in requirements.services() {
        let api = catalog::service_api_name(service);
        if requirements.regions.is_empty() {
            lines.push(format!("- {service} ({api})"));
            continue;
        }
        for region in &requirements.regions {
            let availability = if catalog::service_available(service, region) {
                "available"
            } else {
                "NOT available"
            };
            lines.push(format!("- {service} ({api}) is {availability} in {region}"));
        }
    }

    lines.extend(compatibility_notes(requirements));

    if lines.is_empty() {
        "- none".to_string()
    } else {
        lines.join("\n")
    }
}

fn compatibility_notes(requirements: &RequirementsSpec) -> Vec<String> {
    let services = requirements.services();
    let mut notes = Vec::new();
    for (i, primary) in services.iter().enumerate() {
        for secondary in services.iter().skip(i + 1) {
            let compat = catalog::service_compatibility(primary, secondary);
            if !compat.requirements.is_empty() {
                notes.push(format!(
                    "{primary} + {secondary}: {} (requires {})",
                    compat.notes,
                    compat.requirements.join(", ")
                ));
            }
        }
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use terragen_llm::ScriptedCompleter;

    fn sample_requirements() -> RequirementsSpec {
        serde_json::from_value(serde_json::json!({
            "application_name": "web-shop",
            "components": [
                { "type": "compute", "service": "cloud_run" },
                { "type": "database", "service": "cloud_sql" }
            ],
            "regions": ["us-central1"]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_design_parses_and_annotates() {
        let completer = ScriptedCompleter::new().reply(
            "```json\n{\"architecture_name\": \"web-shop-arch\", \"modules\": [{\"module_name\": \"vpc\"}], \"deployment_order\": [\"vpc\"]}\n```",
        );
        let agent = ArchitectAgent::new(Arc::new(completer.clone()));

        let plan = agent.design(&sample_requirements()).await.unwrap();
        assert_eq!(plan.architecture_name, "web-shop-arch");
        // Catalog pairing note for cloud_run + cloud_sql is attached
        assert!(plan.compatibility_notes[0].contains("VPC connector"));

        // The prompt carried the availability facts
        let captured = completer.captured();
        assert!(captured[0][1].content.contains("available in us-central1"));
    }

    #[test]
    fn test_catalog_brief_marks_unavailable_regions() {
        let mut requirements = sample_requirements();
        requirements.regions = vec!["us-west2".to_string()];
        let brief = catalog_brief(&requirements);
        assert!(brief.contains("cloud_run"));
        assert!(brief.contains("NOT available in us-west2"));
    }
}
