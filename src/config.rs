//! Configuration for prpipe.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (PIPELINE_NAME, PREFIX_NAME, GITHUB_OAUTH_TOKEN,
//!    PRPIPE_STACK_PREFIX, PRPIPE_CHANGE_SET_PREFIX, PRPIPE_UNKNOWN_EXISTENCE,
//!    PRPIPE_CALL_TIMEOUT_SECONDS)
//! 2. Config file (.prpipe/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - An explicit path (--config or PRPIPE_CONFIG) wins
//! - Otherwise searches current directory and parents for .prpipe/config.yaml
//! - Finally ~/.prpipe/config.yaml
//!
//! The resolved [`LifecycleConfig`] is built once at startup and passed by
//! reference to everything that needs it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::naming;

pub const ENV_TEMPLATE: &str = "PIPELINE_NAME";
pub const ENV_PIPELINE_PREFIX: &str = "PREFIX_NAME";
pub const ENV_SOURCE_TOKEN: &str = "GITHUB_OAUTH_TOKEN";
pub const ENV_STACK_PREFIX: &str = "PRPIPE_STACK_PREFIX";
pub const ENV_CHANGE_SET_PREFIX: &str = "PRPIPE_CHANGE_SET_PREFIX";
pub const ENV_UNKNOWN_EXISTENCE: &str = "PRPIPE_UNKNOWN_EXISTENCE";
pub const ENV_CALL_TIMEOUT: &str = "PRPIPE_CALL_TIMEOUT_SECONDS";
pub const ENV_CONFIG_PATH: &str = "PRPIPE_CONFIG";

pub const DEFAULT_PIPELINE_PREFIX: &str = "pr-";
pub const DEFAULT_STACK_PREFIX: &str = "STACKFOR";
pub const DEFAULT_CHANGE_SET_PREFIX: &str = "CHANGESETFOR";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub source: Option<SourceSection>,
    #[serde(default)]
    pub service: Option<ServiceSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineSection {
    /// Template pipeline cloned for every pull request
    pub template: Option<String>,
    /// Prefix of per-PR pipeline names
    pub name_prefix: Option<String>,
    pub stack_prefix: Option<String>,
    pub change_set_prefix: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceSection {
    /// Prefer GITHUB_OAUTH_TOKEN; a token in a file is easy to leak
    pub oauth_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSection {
    pub on_unknown_existence: Option<UnknownExistencePolicy>,
    pub call_timeout_seconds: Option<u64>,
}

/// What the dispatcher does when existence cannot be determined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownExistencePolicy {
    /// Report an ambiguous-existence failure and do nothing
    #[default]
    Abort,
    /// Treat the pipeline as absent (legacy behavior)
    AssumeAbsent,
}

impl FromStr for UnknownExistencePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "assume-absent" | "assume_absent" => Ok(Self::AssumeAbsent),
            other => anyhow::bail!(
                "Invalid unknown-existence policy '{}' (expected 'abort' or 'assume-absent')",
                other
            ),
        }
    }
}

impl fmt::Display for UnknownExistencePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => f.write_str("abort"),
            Self::AssumeAbsent => f.write_str("assume-absent"),
        }
    }
}

/// Resolved lifecycle configuration
#[derive(Clone)]
pub struct LifecycleConfig {
    /// Template pipeline name
    pub template_pipeline: String,
    /// Prefix of per-PR pipeline names
    pub pipeline_prefix: String,
    /// Credential injected into the cloned Source action
    pub source_token: String,
    pub stack_prefix: String,
    pub change_set_prefix: String,
    pub unknown_existence: UnknownExistencePolicy,
    /// Per-call timeout for the orchestration service
    pub call_timeout_seconds: Option<u64>,
    /// Path to config file (if one was used)
    pub config_file: Option<PathBuf>,
}

impl fmt::Debug for LifecycleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleConfig")
            .field("template_pipeline", &self.template_pipeline)
            .field("pipeline_prefix", &self.pipeline_prefix)
            .field("source_token", &redact(&self.source_token))
            .field("stack_prefix", &self.stack_prefix)
            .field("change_set_prefix", &self.change_set_prefix)
            .field("unknown_existence", &self.unknown_existence)
            .field("call_timeout_seconds", &self.call_timeout_seconds)
            .field("config_file", &self.config_file)
            .finish()
    }
}

impl LifecycleConfig {
    /// Configuration with defaults for everything but the required options
    pub fn new(template_pipeline: impl Into<String>, source_token: impl Into<String>) -> Self {
        Self {
            template_pipeline: template_pipeline.into(),
            pipeline_prefix: DEFAULT_PIPELINE_PREFIX.to_string(),
            source_token: source_token.into(),
            stack_prefix: DEFAULT_STACK_PREFIX.to_string(),
            change_set_prefix: DEFAULT_CHANGE_SET_PREFIX.to_string(),
            unknown_existence: UnknownExistencePolicy::default(),
            call_timeout_seconds: None,
            config_file: None,
        }
    }

    pub fn with_pipeline_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.pipeline_prefix = prefix.into();
        self
    }

    pub fn with_stack_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.stack_prefix = prefix.into();
        self
    }

    pub fn with_unknown_existence(mut self, policy: UnknownExistencePolicy) -> Self {
        self.unknown_existence = policy;
        self
    }

    /// Load configuration from the process environment and config file
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let env = |key: &str| std::env::var(key).ok();

        let config_path = match explicit_path {
            Some(path) => Some(path.to_path_buf()),
            None => env(ENV_CONFIG_PATH)
                .map(PathBuf::from)
                .or_else(find_config_file),
        };

        let file = config_path
            .as_deref()
            .map(load_config_file)
            .transpose()?;

        let mut config = resolve(file, env)?;
        config.config_file = config_path;
        Ok(config)
    }

    /// Pipeline name for a pull request number
    pub fn pipeline_name(&self, pr_number: u64) -> String {
        naming::pipeline_name(&self.pipeline_prefix, pr_number)
    }

    /// Stack deployed by a target pipeline
    pub fn stack_name(&self, pipeline: &str) -> String {
        naming::stack_name(&self.stack_prefix, pipeline)
    }

    /// Change set created by a target pipeline
    pub fn change_set_name(&self, pipeline: &str) -> String {
        naming::change_set_name(&self.change_set_prefix, pipeline)
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_seconds.map(Duration::from_secs)
    }

    /// Credential suitable for display
    pub fn redacted_token(&self) -> String {
        redact(&self.source_token)
    }
}

fn redact(secret: &str) -> String {
    if secret.is_empty() {
        "<unset>".to_string()
    } else {
        "********".to_string()
    }
}

/// Find config file by searching current directory and parents, then home
fn find_config_file() -> Option<PathBuf> {
    if let Ok(mut current) = std::env::current_dir() {
        loop {
            let config_path = current.join(".prpipe").join("config.yaml");
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                break;
            }
        }
    }

    dirs::home_dir()
        .map(|home| home.join(".prpipe").join("config.yaml"))
        .filter(|path| path.exists())
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Merge config file and environment into a resolved configuration
fn resolve<F>(file: Option<ConfigFile>, env: F) -> Result<LifecycleConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let (pipeline, source, service) = match file {
        Some(file) => (file.pipeline, file.source, file.service),
        None => (PipelineSection::default(), None, None),
    };

    let template_pipeline = env(ENV_TEMPLATE)
        .or(pipeline.template)
        .filter(|s| !s.is_empty())
        .with_context(|| {
            format!(
                "Template pipeline not configured (set {} or pipeline.template)",
                ENV_TEMPLATE
            )
        })?;

    let source_token = env(ENV_SOURCE_TOKEN)
        .or_else(|| source.and_then(|s| s.oauth_token))
        .filter(|s| !s.is_empty())
        .with_context(|| {
            format!(
                "Source control token not configured (set {} or source.oauth_token)",
                ENV_SOURCE_TOKEN
            )
        })?;

    let pipeline_prefix = env(ENV_PIPELINE_PREFIX)
        .or(pipeline.name_prefix)
        .unwrap_or_else(|| DEFAULT_PIPELINE_PREFIX.to_string());

    let stack_prefix = env(ENV_STACK_PREFIX)
        .or(pipeline.stack_prefix)
        .unwrap_or_else(|| DEFAULT_STACK_PREFIX.to_string());

    let change_set_prefix = env(ENV_CHANGE_SET_PREFIX)
        .or(pipeline.change_set_prefix)
        .unwrap_or_else(|| DEFAULT_CHANGE_SET_PREFIX.to_string());

    let unknown_existence = match env(ENV_UNKNOWN_EXISTENCE) {
        Some(value) => value
            .parse()
            .with_context(|| format!("Invalid {}", ENV_UNKNOWN_EXISTENCE))?,
        None => service
            .as_ref()
            .and_then(|s| s.on_unknown_existence)
            .unwrap_or_default(),
    };

    let call_timeout_seconds = match env(ENV_CALL_TIMEOUT) {
        Some(value) => Some(
            value
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid {}: '{}'", ENV_CALL_TIMEOUT, value))?,
        ),
        None => service.as_ref().and_then(|s| s.call_timeout_seconds),
    };

    Ok(LifecycleConfig {
        template_pipeline,
        pipeline_prefix,
        source_token,
        stack_prefix,
        change_set_prefix,
        unknown_existence,
        call_timeout_seconds,
        config_file: None,
    })
}
