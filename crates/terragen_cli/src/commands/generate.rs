//! Generate command - run the full pipeline for one request.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use terragen_agents::{Pipeline, PipelineConfig};
use terragen_core::RetryPolicy;
use terragen_llm::{LlmClient, LlmProvider};

#[derive(Args)]
pub struct GenerateArgs {
    /// Natural-language infrastructure request
    request: Option<String>,

    /// Read the request from a file instead
    #[arg(short, long, conflicts_with = "request")]
    file: Option<PathBuf>,

    /// Output directory for generated artifacts
    #[arg(short, long, default_value = "./output")]
    output: PathBuf,

    /// Validation loop iteration ceiling
    #[arg(long, default_value_t = 20)]
    max_iterations: u32,

    /// Retry budget for transient LLM failures
    #[arg(long, default_value_t = 5)]
    retries: u32,

    /// Skip the terraform CLI checks
    #[arg(long)]
    skip_terraform: bool,

    /// Also run terraform plan during validation
    #[arg(long)]
    plan: bool,

    /// Skip the LLM validation critic
    #[arg(long)]
    skip_critic: bool,

    /// LLM provider override (openai or anthropic)
    #[arg(long)]
    provider: Option<String>,

    /// Model override
    #[arg(long)]
    model: Option<String>,

    /// Print the full run report as JSON
    #[arg(long)]
    json: bool,
}

pub async fn execute(args: GenerateArgs) -> Result<()> {
    let request = match (&args.request, &args.file) {
        (Some(request), _) => request.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read request file {:?}", path))?,
        (None, None) => anyhow::bail!("provide a request or --file"),
    };

    // A missing API key fails here, before any stage runs.
    let llm = build_client(&args)?;
    info!("Using model {}", llm.model());

    let config = PipelineConfig {
        output_dir: args.output.clone(),
        max_iterations: args.max_iterations,
        retry: RetryPolicy::new(args.retries),
        terraform_cli: !args.skip_terraform,
        run_plan: args.plan,
        critic: !args.skip_critic,
    };

    let pipeline = Pipeline::new(Arc::new(llm), config);
    let report = pipeline.run(&request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        if report.converged {
            return Ok(());
        }
        anyhow::bail!(
            "did not converge after {} iterations; best candidate written to {:?}",
            report.iterations,
            report.output_dir
        )
    }

    println!("Application:  {}", report.requirements.application_name);
    println!("Architecture: {}", report.architecture.architecture_name);
    println!(
        "Modules:      {}",
        report
            .bundle
            .modules
            .iter()
            .map(|m| m.module_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "Environments: {}",
        report
            .bundle
            .environments
            .keys()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Output:       {:?}", report.output_dir);

    if report.converged {
        println!(
            "✅ Validation passed after {} iteration(s)",
            report.iterations
        );
        Ok(())
    } else {
        println!(
            "⚠️  Validation did not converge within {} iterations",
            report.iterations
        );
        for finding in &report.final_findings {
            println!("   - [{}] {}", finding.file, finding.message);
        }
        anyhow::bail!(
            "did not converge after {} iterations; best candidate written to {:?}",
            report.iterations,
            report.output_dir
        )
    }
}

fn build_client(args: &GenerateArgs) -> Result<LlmClient> {
    if let Some(provider) = &args.provider {
        let (provider, key_var) = match provider.as_str() {
            "openai" => (LlmProvider::OpenAI, "OPENAI_API_KEY"),
            "anthropic" => (LlmProvider::Anthropic, "ANTHROPIC_API_KEY"),
            other => anyhow::bail!("unknown provider: {other}"),
        };
        let api_key = std::env::var(key_var)
            .with_context(|| format!("LLM not configured: {key_var} is not set"))?;
        return Ok(LlmClient::new(provider, api_key, args.model.clone()));
    }

    let current_dir = std::env::current_dir()?;
    Ok(LlmClient::from_settings(&current_dir)?)
}
