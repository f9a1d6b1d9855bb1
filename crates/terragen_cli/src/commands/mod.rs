//! CLI command definitions.
//!
//! Each subcommand maps to one workflow: `generate` runs the full
//! agent pipeline, `check` runs the local validation checks against an
//! existing Terraform tree.

use clap::{Parser, Subcommand};

pub mod check;
pub mod generate;

/// terragen - multi-agent Terraform generator for GCP
#[derive(Parser)]
#[command(name = "terragen")]
#[command(version, about = "terragen - multi-agent Terraform generator for GCP")]
#[command(long_about = r#"
terragen turns a natural-language infrastructure request into validated
Terraform for Google Cloud Platform. A sequence of LLM-backed agents
extracts requirements, designs the architecture, generates the code, and
iterates against a validator until the code passes or the iteration
ceiling is reached.

WORKFLOWS:
  generate  → Run the full pipeline for a request
  check     → Run the local validation checks on an existing directory

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Did not converge
  4 - LLM configuration error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate Terraform from a natural-language request
    Generate(generate::GenerateArgs),

    /// Run local validation checks on an existing Terraform tree
    Check(check::CheckArgs),
}
