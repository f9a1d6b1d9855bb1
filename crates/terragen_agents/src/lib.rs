//! # terragen_agents
//!
//! LLM-backed pipeline roles for terragen.
//!
//! Each role wraps a chat completer with a role-specific instruction and a
//! typed output schema: requirements extraction, architecture design,
//! Terraform generation, validation critique, and documentation. The
//! `Pipeline` drives them end to end, with the generate/validate loop from
//! `terragen_core` in the middle.

pub mod architecture;
pub mod documentation;
pub mod error;
pub mod generator;
pub mod pipeline;
pub mod requirements;
pub mod roles;
pub mod schemas;
mod support;
pub mod validator;

pub use architecture::ArchitectAgent;
pub use documentation::DocumentationAgent;
pub use error::{AgentError, AgentResult};
pub use generator::GeneratorAgent;
pub use pipeline::{Pipeline, PipelineConfig, RunReport};
pub use requirements::RequirementsAgent;
pub use roles::AgentRole;
pub use schemas::{
    ArchitecturePlan, ComponentSpec, CriticReport, DocumentationSet, PlanModule, RequirementsSpec,
    ValidationStatus,
};
pub use validator::{CriticAgent, ValidatorStack};
