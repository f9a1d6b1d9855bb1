//! Agent role definitions.

use serde::{Deserialize, Serialize};

use terragen_core::StageId;

/// Pipeline agent roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Requirements,
    Architect,
    Generator,
    Critic,
    Documenter,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Requirements => "requirements",
            AgentRole::Architect => "architect",
            AgentRole::Generator => "generator",
            AgentRole::Critic => "critic",
            AgentRole::Documenter => "documenter",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AgentRole::Requirements => "Extracts structured requirements from free text",
            AgentRole::Architect => "Designs the GCP module topology",
            AgentRole::Generator => "Generates Terraform code from the plan",
            AgentRole::Critic => "Reviews generated code and reports findings",
            AgentRole::Documenter => "Writes the README and deployment guides",
        }
    }

    /// The pipeline stage this role runs at.
    pub fn stage(&self) -> StageId {
        match self {
            AgentRole::Requirements => StageId::Requirements,
            AgentRole::Architect => StageId::Architecture,
            AgentRole::Generator => StageId::Generate,
            AgentRole::Critic => StageId::Validate,
            AgentRole::Documenter => StageId::Document,
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            AgentRole::Requirements,
            AgentRole::Architect,
            AgentRole::Generator,
            AgentRole::Critic,
            AgentRole::Documenter,
        ]
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
