//! Adapter interfaces for the orchestration service.
//!
//! Pipelines live in the CI/CD service and stacks in the infrastructure
//! service; this crate keeps no state of its own and asks them on every
//! call.

pub mod aws;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::PipelineDeclaration;

// Re-export the AWS adapter
pub use aws::AwsOrchestrator;

/// Trait for the external pipeline/stack orchestration service
#[async_trait]
pub trait OrchestrationService: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Fetch a pipeline declaration; `Ok(None)` means the service
    /// confirmed no such pipeline exists
    async fn get_pipeline(&self, name: &str) -> Result<Option<PipelineDeclaration>>;

    /// Submit a new pipeline declaration
    async fn create_pipeline(&self, declaration: &PipelineDeclaration) -> Result<()>;

    /// Request deletion of a pipeline
    async fn delete_pipeline(&self, name: &str) -> Result<()>;

    /// Request deletion of an infrastructure stack (does not wait for it)
    async fn delete_stack(&self, stack_name: &str) -> Result<()>;
}
