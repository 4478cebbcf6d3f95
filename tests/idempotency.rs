//! Idempotency Integration Tests
//!
//! Repeated events for the same pull request must not create or destroy
//! twice; the derived pipeline name is the only key tying them together.

mod common;

use common::{template_pipeline, Call, FailOn, RecordingService};
use prpipe::{
    DispatchOutcome, Dispatcher, LifecycleConfig, PrState, PullRequestEvent,
    UnknownExistencePolicy,
};
use prpipe::domain::FailureKind;

fn config() -> LifecycleConfig {
    LifecycleConfig::new("base-pipeline", "ghp_token")
}

fn count(calls: &[Call], pred: impl Fn(&Call) -> bool) -> usize {
    calls.iter().filter(|c| pred(c)).count()
}

#[test]
fn test_pipeline_name_derivation_is_pure() {
    let config = config().with_pipeline_prefix("pr-");
    assert_eq!(config.pipeline_name(7), config.pipeline_name(7));
    assert_eq!(config.pipeline_name(7), "pr-7");
    assert_eq!(
        config.pipeline_name(u64::MAX),
        format!("pr-{}", u64::MAX)
    );
}

#[tokio::test]
async fn test_two_open_events_create_once() {
    let config = config();
    let service = RecordingService::new().with_pipeline(template_pipeline("base-pipeline"));
    let dispatcher = Dispatcher::new(&config, &service);
    let event = PullRequestEvent::new(12, PrState::Open, "feature/a");

    let first = dispatcher.dispatch(&event).await;
    let second = dispatcher.dispatch(&event).await;

    assert!(matches!(first, DispatchOutcome::Created { ref pipeline } if pipeline == "pr-12"));
    assert!(
        matches!(second, DispatchOutcome::AlreadyProvisioned { ref pipeline } if pipeline == "pr-12")
    );

    let calls = service.calls();
    assert_eq!(count(&calls, |c| matches!(c, Call::CreatePipeline(_))), 1);
}

#[tokio::test]
async fn test_two_closed_events_destroy_once() {
    let config = config();
    let service = RecordingService::new().with_pipeline(template_pipeline("base-pipeline"));
    let dispatcher = Dispatcher::new(&config, &service);

    dispatcher
        .dispatch(&PullRequestEvent::new(5, PrState::Open, "feature/b"))
        .await;

    let closed = PullRequestEvent::new(5, PrState::Closed, "feature/b");
    let first = dispatcher.dispatch(&closed).await;
    let second = dispatcher.dispatch(&closed).await;

    assert!(matches!(first, DispatchOutcome::Destroyed { .. }));
    assert!(matches!(second, DispatchOutcome::AlreadyTornDown { .. }));

    let calls = service.calls();
    assert_eq!(count(&calls, |c| matches!(c, Call::DeleteStack(_))), 1);
    assert_eq!(count(&calls, |c| matches!(c, Call::DeletePipeline(_))), 1);
}

#[tokio::test]
async fn test_close_without_pipeline_is_noop() {
    let config = config();
    let service = RecordingService::new();
    let dispatcher = Dispatcher::new(&config, &service);

    let outcome = dispatcher
        .dispatch(&PullRequestEvent::new(9, PrState::Closed, "x"))
        .await;

    assert!(matches!(outcome, DispatchOutcome::AlreadyTornDown { .. }));
    assert!(service.mutations().is_empty());
}

#[tokio::test]
async fn test_other_state_never_clones_or_destroys() {
    let config = config();
    let service = RecordingService::new().with_pipeline(template_pipeline("base-pipeline"));
    let dispatcher = Dispatcher::new(&config, &service);

    let outcome = dispatcher
        .dispatch(&PullRequestEvent::new(3, PrState::from("merged"), "x"))
        .await;

    assert!(matches!(outcome, DispatchOutcome::Ignored { .. }));
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_existence_aborts_by_default() {
    let config = config();
    let service = RecordingService::new().with_pipeline(template_pipeline("base-pipeline"));
    service.fail_on(FailOn::GetPipeline, "ThrottlingException: Rate exceeded");
    let dispatcher = Dispatcher::new(&config, &service);

    let open = dispatcher
        .dispatch(&PullRequestEvent::new(4, PrState::Open, "x"))
        .await;
    let closed = dispatcher
        .dispatch(&PullRequestEvent::new(4, PrState::Closed, "x"))
        .await;

    for outcome in [&open, &closed] {
        let failure = outcome.failure().expect("dispatch should fail");
        assert_eq!(failure.kind, FailureKind::AmbiguousExistence);
        assert_eq!(failure.pipeline, "pr-4");
        assert!(failure.message.contains("Rate exceeded"));
    }
    assert!(service.mutations().is_empty());
}

#[tokio::test]
async fn test_unknown_existence_assume_absent_attempts_clone() {
    let config = config().with_unknown_existence(UnknownExistencePolicy::AssumeAbsent);
    let service = RecordingService::new().with_pipeline(template_pipeline("base-pipeline"));
    service.fail_on(FailOn::GetPipeline, "ThrottlingException: Rate exceeded");
    let dispatcher = Dispatcher::new(&config, &service);

    let outcome = dispatcher
        .dispatch(&PullRequestEvent::new(4, PrState::Open, "x"))
        .await;

    // The existence check is treated as absent, then the template fetch
    // fails against the same throttled backend.
    let failure = outcome.failure().expect("clone should fail");
    assert_eq!(failure.kind, FailureKind::ServiceCallError);
    assert_eq!(
        service.calls(),
        vec![
            Call::GetPipeline("pr-4".to_string()),
            Call::GetPipeline("base-pipeline".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_duplicate_create_rejected_by_service_is_reported() {
    // Simulates a racing delivery that created the pipeline between the
    // existence check and the create call.
    let config = config();
    let service = RecordingService::new().with_pipeline(template_pipeline("base-pipeline"));
    service.fail_on(FailOn::CreatePipeline, "PipelineNameInUseException: pr-8");
    let dispatcher = Dispatcher::new(&config, &service);

    let outcome = dispatcher
        .dispatch(&PullRequestEvent::new(8, PrState::Open, "x"))
        .await;

    let failure = outcome.failure().expect("create should fail");
    assert_eq!(failure.kind, FailureKind::ServiceCallError);
    assert!(failure.message.contains("PipelineNameInUseException"));
}
