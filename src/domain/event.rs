//! Normalized pull-request events.
//!
//! The webhook body is GitHub's `pull_request` payload; only the fields the
//! lifecycle needs are kept.

use std::fmt;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Webhook event type that carries pull-request lifecycle changes
pub const PULL_REQUEST_EVENT: &str = "pull_request";

/// A pull request as seen by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestEvent {
    /// Pull request number
    pub number: u64,

    /// Title (logged only)
    pub title: String,

    /// Open/closed state
    pub state: PrState,

    /// Branch the pull request was opened from
    pub head_branch: String,
}

impl PullRequestEvent {
    pub fn new(number: u64, state: PrState, head_branch: impl Into<String>) -> Self {
        Self {
            number,
            title: String::new(),
            state,
            head_branch: head_branch.into(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Parse a GitHub `pull_request` webhook body
    pub fn from_webhook_body(body: &str) -> Result<Self> {
        let payload: WebhookPayload =
            serde_json::from_str(body).context("Failed to parse pull_request payload")?;
        Ok(payload.into())
    }
}

/// Pull request state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PrState {
    Open,
    Closed,
    /// Anything else GitHub may report; never acted on
    Other(String),
}

impl From<&str> for PrState {
    fn from(s: &str) -> Self {
        match s {
            "open" => Self::Open,
            "closed" => Self::Closed,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for PrState {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<PrState> for String {
    fn from(state: PrState) -> Self {
        state.to_string()
    }
}

impl fmt::Display for PrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("open"),
            Self::Closed => f.write_str("closed"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// Subset of the GitHub webhook schema
#[derive(Debug, Deserialize)]
struct WebhookPayload {
    pull_request: PullRequestPayload,
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    number: u64,
    #[serde(default)]
    title: String,
    state: String,
    head: HeadPayload,
}

#[derive(Debug, Deserialize)]
struct HeadPayload {
    #[serde(rename = "ref")]
    git_ref: String,
}

impl From<WebhookPayload> for PullRequestEvent {
    fn from(payload: WebhookPayload) -> Self {
        let pr = payload.pull_request;
        Self {
            number: pr.number,
            title: pr.title,
            state: PrState::from(pr.state),
            head_branch: pr.head.git_ref,
        }
    }
}
