//! Core lifecycle logic.
//!
//! This module contains:
//! - Directory: Pipeline existence checks and lookups
//! - Cloner: Template-to-PR pipeline derivation
//! - Destroyer: Stack-then-pipeline teardown
//! - Dispatcher: Pull-request event routing

pub mod cloner;
pub mod destroyer;
pub mod directory;
pub mod dispatcher;
pub mod error;

// Re-export commonly used types
pub use cloner::PipelineCloner;
pub use destroyer::PipelineDestroyer;
pub use directory::{Existence, PipelineDirectory};
pub use dispatcher::Dispatcher;
pub use error::LifecycleError;
