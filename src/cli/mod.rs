//! Command-line interface for prpipe.
//!
//! Provides commands for feeding a webhook delivery through the lifecycle,
//! and for cloning, destroying and inspecting a single PR pipeline by hand.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::{AwsOrchestrator, OrchestrationService};
use crate::config::LifecycleConfig;
use crate::core::{PipelineCloner, PipelineDestroyer, PipelineDirectory};
use crate::domain::{DispatchOutcome, PULL_REQUEST_EVENT};
use crate::webhook::{WebhookHandler, WebhookRequest, WebhookResponse};

/// prpipe - Ephemeral per-pull-request pipelines
#[derive(Parser, Debug)]
#[command(name = "prpipe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to .prpipe/config.yaml discovery)
    #[arg(long, global = true, env = "PRPIPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process a webhook delivery (body from --input or stdin)
    Dispatch {
        /// Event type header value
        #[arg(short, long, default_value = PULL_REQUEST_EVENT)]
        event: String,

        /// Delivery id header value
        #[arg(short, long)]
        delivery: Option<String>,

        /// Webhook body file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Clone the template pipeline for a pull request
    Clone {
        /// Pull request number
        pr_number: u64,

        /// Branch the pipeline should track
        #[arg(short, long)]
        branch: String,
    },

    /// Delete a pull request's stack and pipeline
    Destroy {
        /// Pull request number
        pr_number: u64,
    },

    /// Check whether a pull request's pipeline exists
    Exists {
        /// Pull request number
        pr_number: u64,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let config = LifecycleConfig::load(self.config.as_deref())?;

        if let Commands::Config = self.command {
            show_config(&config);
            return Ok(());
        }

        let service = AwsOrchestrator::from_env(config.call_timeout()).await;

        match self.command {
            Commands::Dispatch {
                event,
                delivery,
                input,
            } => dispatch(&config, &service, event, delivery, input).await,
            Commands::Clone { pr_number, branch } => {
                clone_pipeline(&config, &service, pr_number, &branch).await
            }
            Commands::Destroy { pr_number } => {
                destroy_pipeline(&config, &service, pr_number).await
            }
            Commands::Exists { pr_number } => {
                show_existence(&config, &service, pr_number).await
            }
            Commands::Config => unreachable!("handled above"),
        }
    }
}

/// Run one webhook delivery through the handler
async fn dispatch(
    config: &LifecycleConfig,
    service: &dyn OrchestrationService,
    event: String,
    delivery: Option<String>,
    input: Option<PathBuf>,
) -> Result<()> {
    let body = read_body(input)?;

    let mut request = WebhookRequest::new(Some(event), body);
    if let Some(delivery) = delivery {
        request = request.with_delivery_id(delivery);
    }

    let outcome = WebhookHandler::new(config, service).process(&request).await;
    let response = WebhookResponse::acknowledge(&request);

    println!(
        "{}",
        serde_json::to_string(&response).context("Failed to serialize response")?
    );
    eprintln!("\n[{}]", describe(&outcome));

    Ok(())
}

/// Clone the template for one pull request
async fn clone_pipeline(
    config: &LifecycleConfig,
    service: &dyn OrchestrationService,
    pr_number: u64,
    branch: &str,
) -> Result<()> {
    let target = config.pipeline_name(pr_number);

    let declaration = PipelineCloner::new(config, service)
        .clone_pipeline(&config.template_pipeline, &target, branch)
        .await?;

    println!("Pipeline: {}", declaration.name);
    println!("Cloned from: {}", config.template_pipeline);
    println!("Branch: {}", branch);
    println!("\nStages:");
    for stage in &declaration.stages {
        let actions: Vec<&str> = stage.actions.iter().map(|a| a.name.as_str()).collect();
        println!("  {}: {}", stage.name, actions.join(", "));
    }

    Ok(())
}

/// Tear down one pull request's pipeline
async fn destroy_pipeline(
    config: &LifecycleConfig,
    service: &dyn OrchestrationService,
    pr_number: u64,
) -> Result<()> {
    let target = config.pipeline_name(pr_number);

    let stack = PipelineDestroyer::new(config, service)
        .destroy(&target)
        .await?;

    println!("Stack deletion requested: {}", stack);
    println!("Pipeline deleted: {}", target);

    Ok(())
}

/// Print the three-way existence of one pull request's pipeline
async fn show_existence(
    config: &LifecycleConfig,
    service: &dyn OrchestrationService,
    pr_number: u64,
) -> Result<()> {
    let target = config.pipeline_name(pr_number);
    let existence = PipelineDirectory::new(service).existence(&target).await;

    println!("{}: {}", target, existence);

    Ok(())
}

fn show_config(config: &LifecycleConfig) {
    println!("Template pipeline: {}", config.template_pipeline);
    println!("Pipeline prefix: {}", config.pipeline_prefix);
    println!("Stack prefix: {}", config.stack_prefix);
    println!("Change set prefix: {}", config.change_set_prefix);
    println!("Source token: {}", config.redacted_token());
    println!("On unknown existence: {}", config.unknown_existence);
    match config.call_timeout_seconds {
        Some(secs) => println!("Call timeout: {}s", secs),
        None => println!("Call timeout: (SDK default)"),
    }
    match &config.config_file {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (none)"),
    }
}

/// Read the webhook body from a file or piped stdin
fn read_body(input: Option<PathBuf>) -> Result<String> {
    let body = if let Some(path) = input {
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?
    } else if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        buffer
    } else {
        anyhow::bail!("No webhook body provided. Use --input <file> or pipe to stdin");
    };

    if body.trim().is_empty() {
        anyhow::bail!("Webhook body is empty");
    }

    Ok(body)
}

/// One-line summary of a dispatch outcome
fn describe(outcome: &DispatchOutcome) -> String {
    match outcome {
        DispatchOutcome::Ignored { reason } => format!("ignored: {}", reason),
        DispatchOutcome::Created { pipeline } => format!("created {}", pipeline),
        DispatchOutcome::AlreadyProvisioned { pipeline } => {
            format!("{} already exists", pipeline)
        }
        DispatchOutcome::Destroyed { pipeline, stack } => {
            format!("deleted stack {} and pipeline {}", stack, pipeline)
        }
        DispatchOutcome::AlreadyTornDown { pipeline } => {
            format!("{} already removed", pipeline)
        }
        DispatchOutcome::Failed { failure } => {
            format!("failed ({}): {}", failure.kind, failure.message)
        }
    }
}
