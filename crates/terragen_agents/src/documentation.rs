//! Documentation agent.
//!
//! Runs once after the validation loop completes, converged or not, and
//! produces the README plus optional supplementary guides.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use terragen_iac::TerraformBundle;
use terragen_llm::{ChatCompleter, ChatMessage};

use crate::error::{AgentError, AgentResult};
use crate::roles::AgentRole;
use crate::schemas::{ArchitecturePlan, DocumentationSet};
use crate::support::parse_json;

const INSTRUCTION: &str = r#"You are a technical writer specializing in cloud infrastructure documentation.

Your task is to receive validated Terraform code and architecture information, then create comprehensive, professional documentation.

Your responsibilities:
1. Create a detailed README
2. Generate an architecture diagram (Mermaid format)
3. Create deployment instructions
4. Include troubleshooting tips
5. Document security considerations

The README should cover: project overview, architecture, module structure,
prerequisites, quick start, configuration variables, outputs, and security
considerations.

Output JSON structure:
{
    "readme": "Complete README.md content in Markdown",
    "deployment_guide": "Step-by-step deployment instructions",
    "architecture_diagram": "Mermaid diagram code",
    "security_guide": "Security best practices",
    "troubleshooting": "Common issues and solutions"
}

Output JSON immediately in a ```json code block."#;

/// Agent that writes the final documentation.
pub struct DocumentationAgent {
    llm: Arc<dyn ChatCompleter>,
}

impl DocumentationAgent {
    pub fn new(llm: Arc<dyn ChatCompleter>) -> Self {
        Self { llm }
    }

    /// Document the generated infrastructure.
    pub async fn document<S: Serialize>(
        &self,
        architecture: &ArchitecturePlan,
        bundle: &TerraformBundle,
        validation: &S,
    ) -> AgentResult<DocumentationSet> {
        let architecture_json = serde_json::to_string_pretty(architecture)
            .map_err(|e| AgentError::Serialization(e.to_string()))?;
        let bundle_json = serde_json::to_string_pretty(bundle)
            .map_err(|e| AgentError::Serialization(e.to_string()))?;
        let validation_json = serde_json::to_string_pretty(validation)
            .map_err(|e| AgentError::Serialization(e.to_string()))?;

        let prompt = format!(
            "Generate comprehensive documentation for this Terraform infrastructure:\n\n\
             ARCHITECTURE:\n{architecture_json}\n\n\
             TERRAFORM CODE:\n{bundle_json}\n\n\
             VALIDATION RESULTS:\n{validation_json}\n\n\
             Output in JSON format."
        );

        let messages = vec![ChatMessage::system(INSTRUCTION), ChatMessage::user(prompt)];
        let completion = self.llm.complete(&messages).await?;
        let docs: DocumentationSet =
            parse_json(AgentRole::Documenter.as_str(), &completion.content)?;

        info!("Generated {} documentation files", docs.files().len());
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terragen_llm::ScriptedCompleter;

    #[tokio::test]
    async fn test_document_parses_set() {
        let completer = ScriptedCompleter::new().reply(
            "```json\n{\"readme\": \"# Web Shop Infrastructure\", \"deployment_guide\": \"terraform apply\"}\n```",
        );
        let agent = DocumentationAgent::new(Arc::new(completer));

        let architecture: ArchitecturePlan = serde_json::from_value(serde_json::json!({
            "architecture_name": "web-shop-arch",
            "modules": []
        }))
        .unwrap();
        let bundle = TerraformBundle {
            terraform_version: "1.5".to_string(),
            modules: Vec::new(),
            environments: Default::default(),
        };

        let docs = agent
            .document(&architecture, &bundle, &serde_json::json!({ "converged": true }))
            .await
            .unwrap();
        assert!(docs.readme.starts_with("# Web Shop"));
        assert_eq!(docs.files().len(), 2);
    }
}
