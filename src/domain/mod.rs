//! Domain types for prpipe.
//!
//! This module contains the core data structures:
//! - Declaration: Pipeline, stage and action declarations
//! - Event: Normalized pull-request events
//! - Naming: Deterministic pipeline/stack/change-set names
//! - Outcome: Dispatch outcomes and failure records

pub mod declaration;
pub mod event;
pub mod naming;
pub mod outcome;

// Re-export commonly used types
pub use declaration::{
    Action, ActionCategory, ActionTypeId, ArtifactStore, EncryptionKey, PipelineDeclaration,
    Stage,
};
pub use event::{PrState, PullRequestEvent, PULL_REQUEST_EVENT};
pub use outcome::{DispatchOutcome, FailureKind, LifecycleFailure, Operation};
