//! # terragen_iac
//!
//! Terraform bundle handling for terragen.
//!
//! This crate owns the generated-bundle data model, the local validation
//! checks (structural heuristics plus optional `terraform` CLI runs in a
//! disposable working directory), the GCP service catalog consulted during
//! architecture design, and the on-disk artifact layout.
//!
//! ## Example
//!
//! ```rust,ignore
//! use terragen_iac::{LocalValidator, StructuralChecker, TerraformBundle};
//!
//! let bundle: TerraformBundle = serde_json::from_str(payload)?;
//! let findings = StructuralChecker::new().check_bundle(&bundle);
//! ```

pub mod bundle;
pub mod catalog;
pub mod checks;
pub mod cli;
pub mod error;
pub mod layout;
pub mod validator;

pub use bundle::{EnvironmentConfig, TerraformBundle, TerraformFile, TerraformModule};
pub use catalog::{service_api_name, service_compatibility, service_regions, Compatibility};
pub use checks::StructuralChecker;
pub use cli::{CliCheckOptions, TerraformCli, ToolRun};
pub use error::{IacError, IacResult};
pub use layout::ArtifactWriter;
pub use validator::LocalValidator;
