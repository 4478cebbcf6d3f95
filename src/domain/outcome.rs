//! Dispatch outcomes and structured failure records.
//!
//! Failures never reach the webhook sender, so every one of them is
//! emitted as a structured record that logs can be queried by.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Remote operation a failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    GetPipeline,
    CreatePipeline,
    DeletePipeline,
    DeleteStack,
    /// Local work with no remote call (payload parsing, template checks)
    Local,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetPipeline => "get_pipeline",
            Self::CreatePipeline => "create_pipeline",
            Self::DeletePipeline => "delete_pipeline",
            Self::DeleteStack => "delete_stack",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure taxonomy used as the `failure_kind` log field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Template pipeline missing at clone time
    TemplateNotFound,

    /// Template has no Source action to point at the PR branch
    SourceActionMissing,

    /// Any remote call failure (network, permissions, throttling)
    ServiceCallError,

    /// Existence could not be determined
    AmbiguousExistence,

    /// Webhook body could not be read as a pull_request event
    PayloadParse,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TemplateNotFound => "template_not_found",
            Self::SourceActionMissing => "source_action_missing",
            Self::ServiceCallError => "service_call_error",
            Self::AmbiguousExistence => "ambiguous_existence",
            Self::PayloadParse => "payload_parse",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed lifecycle step.
///
/// Recorded instead of returned to the webhook sender.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleFailure {
    /// Unique identifier for this failure
    pub id: Uuid,

    /// When the failure was observed
    pub timestamp: DateTime<Utc>,

    pub kind: FailureKind,

    pub operation: Operation,

    /// Target pipeline (empty when no name could be derived)
    pub pipeline: String,

    /// Human-readable detail (NO secrets)
    pub message: String,
}

impl LifecycleFailure {
    pub fn new(
        kind: FailureKind,
        operation: Operation,
        pipeline: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
            operation,
            pipeline: pipeline.into(),
            message: message.into(),
        }
    }

    /// Emit this failure as a structured `error` record
    pub fn report(&self) {
        tracing::error!(
            failure_id = %self.id,
            failure_kind = %self.kind,
            operation = %self.operation,
            pipeline = %self.pipeline,
            error = %self.message,
            "Lifecycle operation failed"
        );
    }
}

/// What a single dispatch did
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Event not acted on (wrong event type or state)
    Ignored { reason: String },

    /// Target pipeline cloned from the template
    Created { pipeline: String },

    /// Open event for a pipeline that already exists
    AlreadyProvisioned { pipeline: String },

    /// Stack deletion requested, then pipeline deleted
    Destroyed { pipeline: String, stack: String },

    /// Close event for a pipeline that no longer exists
    AlreadyTornDown { pipeline: String },

    Failed { failure: LifecycleFailure },
}

impl DispatchOutcome {
    pub fn ignored(reason: impl Into<String>) -> Self {
        Self::Ignored {
            reason: reason.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Failure record, if this dispatch failed
    pub fn failure(&self) -> Option<&LifecycleFailure> {
        match self {
            Self::Failed { failure } => Some(failure),
            _ => None,
        }
    }
}
