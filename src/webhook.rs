//! Webhook entry point, independent of any transport.
//!
//! A host (serverless adapter, HTTP server, the CLI) hands over the event
//! type header and raw body; the sender always gets a 200 echoing the body,
//! whatever happened internally. Webhook senders retry on error responses,
//! so failures are only visible in the structured failure records.

use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::adapters::OrchestrationService;
use crate::config::LifecycleConfig;
use crate::core::Dispatcher;
use crate::domain::{
    DispatchOutcome, FailureKind, LifecycleFailure, Operation, PullRequestEvent,
    PULL_REQUEST_EVENT,
};

/// Header carrying the GitHub event type
pub const EVENT_HEADER: &str = "X-GitHub-Event";
/// Header carrying the GitHub delivery id
pub const DELIVERY_HEADER: &str = "X-GitHub-Delivery";

/// Inbound webhook delivery
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    /// Value of the event type header, if present
    pub event_type: Option<String>,

    /// Value of the delivery id header, if present
    pub delivery_id: Option<String>,

    /// Raw JSON body
    pub body: String,
}

impl WebhookRequest {
    pub fn new(event_type: Option<String>, body: impl Into<String>) -> Self {
        Self {
            event_type,
            delivery_id: None,
            body: body.into(),
        }
    }

    pub fn with_delivery_id(mut self, delivery_id: impl Into<String>) -> Self {
        self.delivery_id = Some(delivery_id.into());
        self
    }

    /// Build from header pairs; header names compare case-insensitively
    pub fn from_headers<'h, I>(headers: I, body: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = (&'h str, &'h str)>,
    {
        let mut event_type = None;
        let mut delivery_id = None;
        for (name, value) in headers {
            if name.eq_ignore_ascii_case(EVENT_HEADER) {
                event_type = Some(value.to_string());
            } else if name.eq_ignore_ascii_case(DELIVERY_HEADER) {
                delivery_id = Some(value.to_string());
            }
        }

        Self {
            event_type,
            delivery_id,
            body: body.into(),
        }
    }

    pub fn is_pull_request(&self) -> bool {
        self.event_type.as_deref() == Some(PULL_REQUEST_EVENT)
    }
}

/// Acknowledgment returned to the webhook sender
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookResponse {
    pub status_code: u16,
    pub body: String,
}

impl WebhookResponse {
    /// Success acknowledgment echoing the request body
    pub fn acknowledge(request: &WebhookRequest) -> Self {
        Self {
            status_code: 200,
            body: request.body.clone(),
        }
    }
}

/// Parses deliveries and feeds pull-request events to the dispatcher
pub struct WebhookHandler<'a> {
    config: &'a LifecycleConfig,
    service: &'a dyn OrchestrationService,
}

impl<'a> WebhookHandler<'a> {
    pub fn new(config: &'a LifecycleConfig, service: &'a dyn OrchestrationService) -> Self {
        Self { config, service }
    }

    /// Process a delivery and acknowledge it
    pub async fn handle(&self, request: &WebhookRequest) -> WebhookResponse {
        self.process(request).await;
        WebhookResponse::acknowledge(request)
    }

    /// Process a delivery and report what was done
    #[instrument(skip(self, request), fields(delivery = tracing::field::Empty))]
    pub async fn process(&self, request: &WebhookRequest) -> DispatchOutcome {
        let delivery = request
            .delivery_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        tracing::Span::current().record("delivery", delivery.as_str());

        let event_type = request.event_type.as_deref().unwrap_or("<none>");
        info!(event = event_type, "Processing webhook request");

        if !request.is_pull_request() {
            return DispatchOutcome::ignored(format!("event type '{}' is not handled", event_type));
        }

        let event = match PullRequestEvent::from_webhook_body(&request.body) {
            Ok(event) => event,
            Err(e) => {
                let failure = LifecycleFailure::new(
                    FailureKind::PayloadParse,
                    Operation::Local,
                    "",
                    format!("{:#}", e),
                );
                failure.report();
                return DispatchOutcome::Failed { failure };
            }
        };

        Dispatcher::new(self.config, self.service)
            .dispatch(&event)
            .await
    }
}
