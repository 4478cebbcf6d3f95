//! Errors raised by the lifecycle components.

use thiserror::Error;

use crate::domain::{FailureKind, LifecycleFailure, Operation};

/// Lifecycle errors
#[derive(Debug, Clone, Error)]
pub enum LifecycleError {
    #[error("Template pipeline '{template}' not found")]
    TemplateNotFound { template: String },

    #[error("Template pipeline '{template}' has no Source action")]
    SourceActionMissing { template: String },

    #[error("{operation} failed for '{pipeline}': {message}")]
    ServiceCall {
        operation: Operation,
        pipeline: String,
        message: String,
    },

    #[error("Could not determine whether pipeline '{pipeline}' exists: {reason}")]
    AmbiguousExistence { pipeline: String, reason: String },
}

impl LifecycleError {
    /// Wrap a remote call error, keeping its full context chain
    pub fn service_call(
        operation: Operation,
        pipeline: impl Into<String>,
        err: &anyhow::Error,
    ) -> Self {
        Self::ServiceCall {
            operation,
            pipeline: pipeline.into(),
            message: format!("{:#}", err),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::TemplateNotFound { .. } => FailureKind::TemplateNotFound,
            Self::SourceActionMissing { .. } => FailureKind::SourceActionMissing,
            Self::ServiceCall { .. } => FailureKind::ServiceCallError,
            Self::AmbiguousExistence { .. } => FailureKind::AmbiguousExistence,
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            Self::TemplateNotFound { .. } => Operation::GetPipeline,
            Self::SourceActionMissing { .. } => Operation::Local,
            Self::ServiceCall { operation, .. } => *operation,
            Self::AmbiguousExistence { .. } => Operation::GetPipeline,
        }
    }

    /// Structured record for a failure attributed to `pipeline`
    pub fn to_failure(&self, pipeline: &str) -> LifecycleFailure {
        LifecycleFailure::new(self.kind(), self.operation(), pipeline, self.to_string())
    }
}
