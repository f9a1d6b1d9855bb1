//! Output artifact layout.
//!
//! Writes the generated bundle into the fixed output shape: reusable
//! modules under `modules/`, environment configurations under
//! `environments/`, documentation and metadata snapshots at the root.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::bundle::TerraformBundle;
use crate::error::{IacError, IacResult};

/// Writer for the run's output directory.
pub struct ArtifactWriter {
    output_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write every file in the bundle, creating directories as needed.
    pub fn write_bundle(&self, bundle: &TerraformBundle) -> IacResult<Vec<PathBuf>> {
        let mut written = Vec::new();
        for (relative, content) in bundle.files() {
            // Model-produced paths must stay inside the output directory.
            let rel = Path::new(&relative);
            if rel.is_absolute()
                || rel
                    .components()
                    .any(|c| matches!(c, std::path::Component::ParentDir))
            {
                return Err(IacError::InvalidBundle(format!(
                    "refusing to write outside the output directory: {relative}"
                )));
            }
            let path = self.output_dir.join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, content)?;
            written.push(path);
        }
        info!(
            "Wrote {} Terraform files to {:?}",
            written.len(),
            self.output_dir
        );
        Ok(written)
    }

    /// Persist a metadata snapshot (e.g. requirements.json) as pretty JSON.
    pub fn write_metadata<T: Serialize>(&self, filename: &str, value: &T) -> IacResult<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(filename);
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| IacError::Serialization(e.to_string()))?;
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Write a documentation file at the output root.
    pub fn write_document(&self, filename: &str, content: &str) -> IacResult<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(filename);
        fs::write(&path, content)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{EnvironmentConfig, TerraformFile, TerraformModule};
    use tempfile::tempdir;

    fn sample_bundle() -> TerraformBundle {
        let mut bundle = TerraformBundle {
            terraform_version: "1.5".to_string(),
            modules: vec![TerraformModule {
                module_name: "vpc".to_string(),
                path: String::new(),
                files: vec![TerraformFile {
                    filename: "main.tf".to_string(),
                    content: "resource \"google_compute_network\" \"vpc\" {}\n".to_string(),
                }],
            }],
            environments: Default::default(),
        };
        bundle.environments.insert(
            "dev".to_string(),
            EnvironmentConfig {
                main_tf: "module \"vpc\" { source = \"../../modules/vpc\" }\n".to_string(),
                variables_tf: "variable \"project_id\" {}\n".to_string(),
                outputs_tf: "output \"network\" {}\n".to_string(),
                provider_tf: "provider \"google\" {}\n".to_string(),
                terraform_tfvars_example: "project_id = \"demo\"\n".to_string(),
            },
        );
        bundle
    }

    #[test]
    fn test_write_bundle_layout() {
        let dir = tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path());

        let written = writer.write_bundle(&sample_bundle()).unwrap();
        assert_eq!(written.len(), 6);
        assert!(dir.path().join("modules/vpc/main.tf").exists());
        assert!(dir.path().join("environments/dev/main.tf").exists());
        assert!(dir
            .path()
            .join("environments/dev/terraform.tfvars.example")
            .exists());
    }

    #[test]
    fn test_write_metadata_pretty_json() {
        let dir = tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path());

        let path = writer
            .write_metadata("requirements.json", &serde_json::json!({ "application_name": "demo" }))
            .unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("\"application_name\": \"demo\""));
    }

    #[test]
    fn test_refuses_path_escape() {
        let dir = tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path());

        let mut bundle = sample_bundle();
        bundle.modules[0].path = "../escape".to_string();
        assert!(matches!(
            writer.write_bundle(&bundle),
            Err(IacError::InvalidBundle(_))
        ));
    }

    #[test]
    fn test_write_document() {
        let dir = tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path());

        writer.write_document("README.md", "# Infrastructure\n").unwrap();
        assert!(dir.path().join("README.md").exists());
    }
}
