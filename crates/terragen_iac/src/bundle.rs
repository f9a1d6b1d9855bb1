//! Generated Terraform bundle data model.
//!
//! A bundle is the candidate artifact exchanged between the generator and
//! validator: reusable modules plus environment configurations that call
//! them. The loop treats it as opaque JSON; this crate gives it shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

fn default_terraform_version() -> String {
    "1.5".to_string()
}

/// A single Terraform file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TerraformFile {
    /// Name of the file (e.g., "main.tf", "variables.tf")
    pub filename: String,
    /// Complete HCL content of the file
    pub content: String,
}

/// A reusable Terraform module with its constituent files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerraformModule {
    /// Identifier for the module (e.g., "vpc", "cloud_run")
    pub module_name: String,
    /// Relative path to the module directory (e.g., "modules/vpc")
    #[serde(default)]
    pub path: String,
    pub files: Vec<TerraformFile>,
}

impl TerraformModule {
    /// Relative directory of this module under the output root.
    pub fn directory(&self) -> String {
        if self.path.is_empty() {
            format!("modules/{}", self.module_name)
        } else {
            self.path.clone()
        }
    }
}

/// Environment-specific configuration calling the reusable modules.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EnvironmentConfig {
    pub main_tf: String,
    pub variables_tf: String,
    pub outputs_tf: String,
    pub provider_tf: String,
    #[serde(default)]
    pub terraform_tfvars_example: String,
}

impl EnvironmentConfig {
    /// Filename/content pairs in write-out order.
    pub fn files(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("main.tf", self.main_tf.as_str()),
            ("variables.tf", self.variables_tf.as_str()),
            ("outputs.tf", self.outputs_tf.as_str()),
            ("provider.tf", self.provider_tf.as_str()),
            (
                "terraform.tfvars.example",
                self.terraform_tfvars_example.as_str(),
            ),
        ]
    }
}

/// The complete generated Terraform codebase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerraformBundle {
    /// Required Terraform version (e.g., "1.5")
    #[serde(default = "default_terraform_version")]
    pub terraform_version: String,
    #[serde(default)]
    pub modules: Vec<TerraformModule>,
    /// Environment name -> configuration; ordered for deterministic output
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentConfig>,
}

impl TerraformBundle {
    /// Every (relative path, content) pair in the bundle.
    pub fn files(&self) -> Vec<(String, &str)> {
        let mut out = Vec::new();
        for module in &self.modules {
            let dir = module.directory();
            for file in &module.files {
                out.push((format!("{}/{}", dir, file.filename), file.content.as_str()));
            }
        }
        for (env_name, config) in &self.environments {
            for (filename, content) in config.files() {
                out.push((format!("environments/{}/{}", env_name, filename), content));
            }
        }
        out
    }

    /// Total number of files in the bundle.
    pub fn file_count(&self) -> usize {
        self.files().len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty() && self.environments.is_empty()
    }
}
