//! Check command - run local validation checks on an existing tree.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tempfile::TempDir;
use tracing::info;
use walkdir::WalkDir;

use terragen_core::{Finding, Severity};
use terragen_iac::{StructuralChecker, TerraformCli};

#[derive(Args)]
pub struct CheckArgs {
    /// Directory containing Terraform files
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// Also run terraform fmt/init/validate (in a disposable copy)
    #[arg(long)]
    terraform: bool,
}

pub async fn execute(args: CheckArgs) -> Result<()> {
    if !args.dir.exists() {
        anyhow::bail!("directory not found: {:?}", args.dir);
    }

    let files = collect_terraform_files(&args.dir)?;
    if files.is_empty() {
        anyhow::bail!("no .tf files found under {:?}", args.dir);
    }
    info!("Checking {} Terraform files", files.len());

    let checker = StructuralChecker::new();
    let mut findings: Vec<Finding> = Vec::new();
    for (relative, content) in &files {
        findings.extend(checker.check_file(relative, content));
    }

    if args.terraform {
        findings.extend(run_cli_checks(&files).await?);
    }

    let errors = findings
        .iter()
        .filter(|f| f.severity == Severity::Error)
        .count();

    for finding in &findings {
        let marker = match finding.severity {
            Severity::Error => "❌",
            Severity::Warning => "⚠️ ",
            Severity::Info => "ℹ️ ",
        };
        println!("{} [{}] {}", marker, finding.file, finding.message);
    }

    if errors > 0 {
        anyhow::bail!("validation failed with {} error(s)", errors);
    }
    println!("✅ All checks passed ({} findings)", findings.len());
    Ok(())
}

fn collect_terraform_files(dir: &PathBuf) -> Result<Vec<(String, String)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_file()
            && entry.path().extension().map(|e| e == "tf").unwrap_or(false)
        {
            let relative = entry
                .path()
                .strip_prefix(dir)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .into_owned();
            let content = std::fs::read_to_string(entry.path())?;
            files.push((relative, content));
        }
    }
    files.sort();
    Ok(files)
}

// The CLI runs against a disposable copy so no state lands in the tree
// being checked.
async fn run_cli_checks(files: &[(String, String)]) -> Result<Vec<Finding>> {
    let workdir = TempDir::new()?;
    for (relative, content) in files {
        let path = workdir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
    }

    let cli = TerraformCli::new();
    let mut findings = Vec::new();

    match cli.fmt_check(workdir.path()).await {
        Ok(run) if !run.success => {
            findings.push(
                Finding::warning(".", "formatting differs from canonical style")
                    .with_fix("run terraform fmt"),
            );
        }
        Ok(_) => {}
        Err(terragen_iac::IacError::ToolNotAvailable(_)) => {
            findings.push(Finding::warning(
                "terraform",
                "terraform CLI not found; CLI validation skipped",
            ));
            return Ok(findings);
        }
        Err(e) => return Err(e.into()),
    }

    let init = cli.init(workdir.path()).await?;
    if !init.success {
        findings.push(Finding::error(".", "terraform init failed"));
        return Ok(findings);
    }

    let validate = cli.validate(workdir.path()).await?;
    if !validate.success {
        findings.push(Finding::error(".", "terraform validate failed"));
    }

    Ok(findings)
}
