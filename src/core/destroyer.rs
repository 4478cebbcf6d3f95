//! Pipeline destroyer.
//!
//! The pipeline's deploy actions reference the stack, so the stack is
//! always asked to go first. Stack deletion is asynchronous on the service
//! side and is not awaited here.

use tracing::{info, instrument};

use crate::adapters::OrchestrationService;
use crate::config::LifecycleConfig;
use crate::domain::Operation;

use super::error::LifecycleError;

/// Tears down a PR pipeline and the stack it deployed
pub struct PipelineDestroyer<'a> {
    config: &'a LifecycleConfig,
    service: &'a dyn OrchestrationService,
}

impl<'a> PipelineDestroyer<'a> {
    pub fn new(config: &'a LifecycleConfig, service: &'a dyn OrchestrationService) -> Self {
        Self { config, service }
    }

    /// Delete the target's stack, then the target pipeline
    ///
    /// Returns the name of the stack whose deletion was requested.
    #[instrument(skip(self), fields(backend = self.service.name()))]
    pub async fn destroy(&self, target: &str) -> Result<String, LifecycleError> {
        let stack = self.config.stack_name(target);

        self.service
            .delete_stack(&stack)
            .await
            .map_err(|e| LifecycleError::service_call(Operation::DeleteStack, target, &e))?;
        info!(%stack, "Stack deletion requested");

        self.service
            .delete_pipeline(target)
            .await
            .map_err(|e| LifecycleError::service_call(Operation::DeletePipeline, target, &e))?;
        info!("Pipeline deleted");

        Ok(stack)
    }
}
