//! Lifecycle dispatcher.
//!
//! Maps one pull-request event to at most one clone or destroy. Holds no
//! state between calls: whether the pipeline exists is asked fresh every
//! time, and the derived pipeline name is the only idempotency key.

use tracing::{info, instrument};

use crate::adapters::OrchestrationService;
use crate::config::{LifecycleConfig, UnknownExistencePolicy};
use crate::domain::{DispatchOutcome, PrState, PullRequestEvent};

use super::cloner::PipelineCloner;
use super::destroyer::PipelineDestroyer;
use super::directory::{Existence, PipelineDirectory};
use super::error::LifecycleError;

/// Routes pull-request events to the cloner or destroyer
pub struct Dispatcher<'a> {
    config: &'a LifecycleConfig,
    service: &'a dyn OrchestrationService,
}

impl<'a> Dispatcher<'a> {
    pub fn new(config: &'a LifecycleConfig, service: &'a dyn OrchestrationService) -> Self {
        Self { config, service }
    }

    /// Handle one event; failures are reported and returned, never raised
    #[instrument(
        skip(self, event),
        fields(pr = event.number, state = %event.state, pipeline = tracing::field::Empty)
    )]
    pub async fn dispatch(&self, event: &PullRequestEvent) -> DispatchOutcome {
        let pipeline = self.config.pipeline_name(event.number);
        tracing::Span::current().record("pipeline", pipeline.as_str());

        info!(title = %event.title, branch = %event.head_branch, "Processing pull request");

        let outcome = match &event.state {
            PrState::Open => self.on_open(&pipeline, &event.head_branch).await,
            PrState::Closed => self.on_closed(&pipeline).await,
            PrState::Other(state) => {
                info!(%state, "Pull request state not handled");
                Ok(DispatchOutcome::ignored(format!(
                    "pull request state '{}' is not handled",
                    state
                )))
            }
        };

        match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                let failure = err.to_failure(&pipeline);
                failure.report();
                DispatchOutcome::Failed { failure }
            }
        }
    }

    async fn on_open(
        &self,
        pipeline: &str,
        branch: &str,
    ) -> Result<DispatchOutcome, LifecycleError> {
        if self.is_present(pipeline).await? {
            info!("Pipeline exists");
            return Ok(DispatchOutcome::AlreadyProvisioned {
                pipeline: pipeline.to_string(),
            });
        }

        info!("Pipeline does not exist");
        PipelineCloner::new(self.config, self.service)
            .clone_pipeline(&self.config.template_pipeline, pipeline, branch)
            .await?;

        Ok(DispatchOutcome::Created {
            pipeline: pipeline.to_string(),
        })
    }

    async fn on_closed(&self, pipeline: &str) -> Result<DispatchOutcome, LifecycleError> {
        if !self.is_present(pipeline).await? {
            info!("Pipeline already removed");
            return Ok(DispatchOutcome::AlreadyTornDown {
                pipeline: pipeline.to_string(),
            });
        }

        let stack = PipelineDestroyer::new(self.config, self.service)
            .destroy(pipeline)
            .await?;

        Ok(DispatchOutcome::Destroyed {
            pipeline: pipeline.to_string(),
            stack,
        })
    }

    /// Existence check with the configured policy for unknown answers
    async fn is_present(&self, pipeline: &str) -> Result<bool, LifecycleError> {
        match PipelineDirectory::new(self.service).existence(pipeline).await {
            Existence::Present => Ok(true),
            Existence::Absent => Ok(false),
            Existence::Unknown(reason) => match self.config.unknown_existence {
                UnknownExistencePolicy::AssumeAbsent => Ok(false),
                UnknownExistencePolicy::Abort => Err(LifecycleError::AmbiguousExistence {
                    pipeline: pipeline.to_string(),
                    reason,
                }),
            },
        }
    }
}
