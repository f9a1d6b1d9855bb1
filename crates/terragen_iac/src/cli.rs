//! Optional `terraform` CLI checks in a disposable working directory.
//!
//! The bundle is materialized into a `TempDir` that is removed on every
//! exit path, success or failure. Only read-only commands are issued:
//! fmt/init/validate/plan. State stays local (`-backend=false`) and nothing
//! that can alter remote infrastructure is ever run. A missing binary
//! degrades to a warning so credential-less environments still get a
//! verdict from the structural checks.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tempfile::TempDir;
use terragen_core::Finding;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::bundle::TerraformBundle;
use crate::error::{IacError, IacResult};

/// Result of one tool invocation.
#[derive(Debug)]
pub struct ToolRun {
    pub success: bool,
    pub output: String,
    pub exit_code: i32,
}

/// Options for a CLI check pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliCheckOptions {
    /// Also run `terraform plan` after a successful validate
    pub run_plan: bool,
}

/// Terraform CLI wrapper with a fixed per-invocation timeout.
pub struct TerraformCli {
    binary: String,
    timeout: Duration,
}

impl Default for TerraformCli {
    fn default() -> Self {
        Self::new()
    }
}

impl TerraformCli {
    pub fn new() -> Self {
        Self {
            binary: "terraform".to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Use a custom binary name or path.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Override the per-invocation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run terraform fmt in check mode.
    pub async fn fmt_check(&self, working_dir: &Path) -> IacResult<ToolRun> {
        debug!("Running terraform fmt check in {:?}", working_dir);
        self.run_command(working_dir, &["fmt", "-check", "-recursive"])
            .await
    }

    /// Run terraform init without touching any remote backend.
    pub async fn init(&self, working_dir: &Path) -> IacResult<ToolRun> {
        debug!("Running terraform init in {:?}", working_dir);
        self.run_command(working_dir, &["init", "-input=false", "-backend=false"])
            .await
    }

    /// Run terraform validate.
    pub async fn validate(&self, working_dir: &Path) -> IacResult<ToolRun> {
        debug!("Running terraform validate in {:?}", working_dir);
        self.run_command(working_dir, &["validate", "-no-color"]).await
    }

    /// Run terraform plan (dry-run only, never apply).
    pub async fn plan(&self, working_dir: &Path) -> IacResult<ToolRun> {
        debug!("Running terraform plan in {:?}", working_dir);
        self.run_command(working_dir, &["plan", "-input=false", "-no-color"])
            .await
    }

    /// Materialize the bundle into `root` with its full directory layout.
    pub fn materialize(&self, root: &Path, bundle: &TerraformBundle) -> IacResult<()> {
        for (relative, content) in bundle.files() {
            let path = root.join(&relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, content)?;
        }
        Ok(())
    }

    /// Check a bundle inside a scoped temporary directory.
    ///
    /// The directory and everything in it are gone by the time this
    /// returns, whatever the outcome.
    pub async fn check_bundle(
        &self,
        bundle: &TerraformBundle,
        options: CliCheckOptions,
    ) -> IacResult<Vec<Finding>> {
        let workdir = TempDir::new()?;
        self.materialize(workdir.path(), bundle)?;

        let mut findings = Vec::new();
        for root in check_roots(bundle) {
            let dir = workdir.path().join(&root);
            match self.check_root(&dir, &root, options).await {
                Ok(mut f) => findings.append(&mut f),
                Err(IacError::ToolNotAvailable(binary)) => {
                    warn!("terraform CLI not found ({}); skipping CLI checks", binary);
                    findings.push(
                        Finding::warning(
                            "terraform",
                            "terraform CLI not found; CLI validation skipped",
                        )
                        .with_fix("install terraform to enable CLI checks"),
                    );
                    break;
                }
                Err(IacError::ToolTimeout { command, seconds }) => {
                    findings.push(
                        Finding::error(&root, format!("terraform {command} timed out after {seconds}s"))
                            .with_fix("simplify the configuration or raise the timeout"),
                    );
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "CLI checks produced {} findings across {} roots",
            findings.len(),
            check_roots(bundle).len()
        );
        Ok(findings)
    }

    async fn check_root(
        &self,
        dir: &Path,
        root: &str,
        options: CliCheckOptions,
    ) -> IacResult<Vec<Finding>> {
        let mut findings = Vec::new();

        let fmt = self.fmt_check(dir).await?;
        if !fmt.success {
            findings.push(
                Finding::warning(root, truncate("formatting differs from canonical style", &fmt.output))
                    .with_fix("run terraform fmt"),
            );
        }

        let init = self.init(dir).await?;
        if !init.success {
            findings.push(
                Finding::error(root, truncate("terraform init failed", &init.output))
                    .with_fix("fix provider requirements"),
            );
            return Ok(findings);
        }

        let validate = self.validate(dir).await?;
        if !validate.success {
            findings.push(
                Finding::error(root, truncate("terraform validate failed", &validate.output))
                    .with_fix("address the configuration errors reported"),
            );
            return Ok(findings);
        }

        if options.run_plan {
            let plan = self.plan(dir).await?;
            if !plan.success {
                findings.push(
                    Finding::error(root, truncate("terraform plan failed", &plan.output))
                        .with_fix("address the plan errors reported"),
                );
            }
        }

        Ok(findings)
    }

    async fn run_command(&self, working_dir: &Path, args: &[&str]) -> IacResult<ToolRun> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(IacError::ToolNotAvailable(self.binary.clone()));
            }
            Ok(Err(e)) => return Err(IacError::Io(e)),
            Err(_) => {
                return Err(IacError::ToolTimeout {
                    command: args.join(" "),
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.stderr.is_empty() {
            if !combined.is_empty() {
                combined.push('\n');
            }
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
        }

        Ok(ToolRun {
            success: output.status.success(),
            output: combined,
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

/// Directories the CLI is run in: each environment, or each module when the
/// bundle carries no environments.
fn check_roots(bundle: &TerraformBundle) -> Vec<String> {
    if !bundle.environments.is_empty() {
        bundle
            .environments
            .keys()
            .map(|env| format!("environments/{env}"))
            .collect()
    } else {
        bundle.modules.iter().map(|m| m.directory()).collect()
    }
}

// Findings feed back into model prompts, so diagnostics are clamped short.
fn truncate(prefix: &str, output: &str) -> String {
    const LIMIT: usize = 160;
    let detail: String = output.split_whitespace().collect::<Vec<_>>().join(" ");
    if detail.is_empty() {
        return prefix.to_string();
    }
    let clipped: String = detail.chars().take(LIMIT).collect();
    format!("{prefix}: {clipped}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{TerraformFile, TerraformModule};

    fn sample_bundle() -> TerraformBundle {
        TerraformBundle {
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
        }
    }

    #[test]
    fn test_materialized_tree_is_removed_with_tempdir() {
        let cli = TerraformCli::new();
        let bundle = sample_bundle();

        let workdir = TempDir::new().unwrap();
        let path = workdir.path().to_path_buf();
        cli.materialize(&path, &bundle).unwrap();
        assert!(path.join("modules/vpc/main.tf").exists());

        drop(workdir);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_missing_binary_degrades_to_warning() {
        let cli = TerraformCli::new().with_binary("terraform-binary-that-does-not-exist");
        let findings = cli
            .check_bundle(&sample_bundle(), CliCheckOptions::default())
            .await
            .unwrap();

        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("CLI validation skipped"));
        assert_eq!(findings[0].severity, terragen_core::Severity::Warning);
    }

    #[test]
    fn test_check_roots_prefers_environments() {
        let mut bundle = sample_bundle();
        assert_eq!(check_roots(&bundle), vec!["modules/vpc".to_string()]);

        bundle
            .environments
            .insert("dev".to_string(), Default::default());
        assert_eq!(check_roots(&bundle), vec!["environments/dev".to_string()]);
    }

    #[test]
    fn test_truncate_clamps_output() {
        let long = "x ".repeat(500);
        let message = truncate("terraform validate failed", &long);
        assert!(message.len() <= 160 + "terraform validate failed: ".len());
    }
}
