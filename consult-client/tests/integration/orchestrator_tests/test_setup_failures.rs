use consult_client::ClientError;
use consult_client::orchestrator::{FailureReason, NegotiationRole, OrchestratorEvent, Phase};
use consult_client::signaling::Anonymous;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::integration::{create_test_service, init_tracing};
use crate::utils::{MockEngineFactory, ParticipantSetup, TestParticipant, WAIT, fast_config};

#[tokio::test]
async fn test_missing_engine_is_terminal() {
    init_tracing();
    let service = create_test_service();

    let doc = TestParticipant::start_with(
        &service,
        "room-123",
        "doc-1",
        ParticipantSetup {
            engines: MockEngineFactory::unavailable(),
            ..ParticipantSetup::new(NegotiationRole::Initiator)
        },
    )
    .await;

    let phase = timeout(
        WAIT,
        doc.handle
            .wait_for(|p| matches!(p, Phase::Failed(FailureReason::EngineUnavailable(_)))),
    )
    .await
    .expect("fails in time");
    assert!(phase.is_ok());
    assert!(doc.media.issued().iter().all(|t| t.is_stopped()));
    assert!(!doc.signaling.is_connected().await);
}

#[tokio::test]
async fn test_unauthenticated_user_cannot_join() {
    init_tracing();
    let service = create_test_service();

    let doc = TestParticipant::start_with(
        &service,
        "room-123",
        "doc-1",
        ParticipantSetup {
            identity: Some(Arc::new(Anonymous)),
            ..ParticipantSetup::new(NegotiationRole::Initiator)
        },
    )
    .await;

    doc.wait_for_phase(Phase::Failed(FailureReason::Signaling(
        ClientError::AuthRequired,
    )))
    .await;
    assert_eq!(service.registry().session_count(), 0);
}

#[tokio::test]
async fn test_slow_setup_is_reported_without_failing() {
    init_tracing();
    let service = create_test_service();

    let mut doc = TestParticipant::start_with(
        &service,
        "room-123",
        "doc-1",
        ParticipantSetup {
            config: consult_client::OrchestratorConfig {
                setup_timeout: Duration::from_millis(100),
                ..fast_config()
            },
            ..ParticipantSetup::new(NegotiationRole::Initiator)
        },
    )
    .await;

    doc.wait_for_event(|e| *e == OrchestratorEvent::SlowSetup)
        .await;
    assert_eq!(doc.handle.phase(), Phase::Negotiating);
}
