//! Pipeline directory: existence checks and declaration lookups.

use std::fmt;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::adapters::OrchestrationService;
use crate::domain::PipelineDeclaration;

/// Result of an existence check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Existence {
    /// The service returned the pipeline
    Present,
    /// The service confirmed there is no such pipeline
    Absent,
    /// The query failed; the pipeline may or may not exist
    Unknown(String),
}

impl Existence {
    /// Collapse to a boolean, counting `Unknown` as absent
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present)
    }
}

impl fmt::Display for Existence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => f.write_str("present"),
            Self::Absent => f.write_str("absent"),
            Self::Unknown(reason) => write!(f, "unknown ({})", reason),
        }
    }
}

/// Query surface over the orchestration service
pub struct PipelineDirectory<'a> {
    service: &'a dyn OrchestrationService,
}

impl<'a> PipelineDirectory<'a> {
    pub fn new(service: &'a dyn OrchestrationService) -> Self {
        Self { service }
    }

    /// Three-way existence check; never fails
    pub async fn existence(&self, name: &str) -> Existence {
        match self.service.get_pipeline(name).await {
            Ok(Some(_)) => Existence::Present,
            Ok(None) => Existence::Absent,
            Err(e) => {
                let reason = format!("{:#}", e);
                warn!(pipeline = name, error = %reason, "Existence check failed");
                Existence::Unknown(reason)
            }
        }
    }

    /// Boolean existence check; query errors count as absent
    pub async fn exists(&self, name: &str) -> bool {
        let existence = self.existence(name).await;
        debug!(pipeline = name, %existence, "Existence check");
        existence.is_present()
    }

    /// Fetch a pipeline declaration by exact name
    pub async fn fetch(&self, name: &str) -> Result<Option<PipelineDeclaration>> {
        self.service
            .get_pipeline(name)
            .await
            .with_context(|| format!("Failed to fetch pipeline '{}'", name))
    }
}
