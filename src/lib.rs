//! prpipe - Ephemeral per-pull-request pipelines
//!
//! Clones a template CodePipeline for every opened pull request and tears
//! the clone (and the CloudFormation stack it deployed) down again when the
//! pull request closes.
//!
//! # Architecture
//!
//! The system keeps no state of its own:
//! - Pipeline names are derived from the PR number, so re-deriving them is
//!   the only idempotency mechanism
//! - Whether a pipeline exists is asked of the service on every event
//! - Failures are reported as structured records, never to the webhook sender
//!
//! # Modules
//!
//! - `adapters`: Orchestration service seam (AWS CodePipeline/CloudFormation)
//! - `core`: Lifecycle logic (Directory, Cloner, Destroyer, Dispatcher)
//! - `domain`: Data structures (declarations, events, outcomes)
//! - `webhook`: Transport-agnostic webhook handling
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Feed a webhook delivery through the lifecycle
//! prpipe dispatch --event pull_request --input payload.json
//!
//! # Manage one PR pipeline by hand
//! prpipe clone 7 --branch feature/x
//! prpipe destroy 7
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod webhook;

// Re-export main types at crate root for convenience
pub use adapters::{AwsOrchestrator, OrchestrationService};
pub use config::{LifecycleConfig, UnknownExistencePolicy};
pub use crate::core::{Dispatcher, Existence, LifecycleError, PipelineCloner, PipelineDestroyer};
pub use domain::{DispatchOutcome, PipelineDeclaration, PrState, PullRequestEvent};
pub use webhook::{WebhookHandler, WebhookRequest, WebhookResponse};
