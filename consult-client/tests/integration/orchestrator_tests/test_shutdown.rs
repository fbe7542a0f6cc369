use consult_client::OrchestratorError;
use consult_client::orchestrator::{NegotiationRole, OrchestratorEvent, Phase};
use consult_client::signaling::Connector;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::integration::{create_test_service, init_tracing};
use crate::utils::{
    HangingConnector, MockMediaSource, ParticipantSetup, TestParticipant, connected_pair,
    eventually, participant,
};

#[tokio::test]
async fn test_shutdown_releases_everything_once() {
    init_tracing();
    let service = create_test_service();

    let (doc, mut pat) = connected_pair(&service).await;
    assert!(eventually(|| doc.lifecycle.started() == 1).await);

    doc.handle.shutdown().await;
    doc.handle.shutdown().await;

    assert_eq!(doc.handle.phase(), Phase::Idle);
    assert_eq!(doc.lifecycle.ended(), 1);
    assert!(doc.engine().is_closed());
    assert!(doc.media.issued().iter().all(|t| t.is_stopped()));
    assert!(!doc.signaling.is_connected().await);

    let event = pat
        .wait_for_event(|e| matches!(e, OrchestratorEvent::PeerLeft(_)))
        .await;
    assert_eq!(event, OrchestratorEvent::PeerLeft(participant("doc-1")));

    assert!(matches!(
        doc.handle.start().await,
        Err(OrchestratorError::Stopped)
    ));
}

#[tokio::test]
async fn test_shutdown_interrupts_a_pending_join() {
    init_tracing();
    let service = create_test_service();
    let connector = Arc::new(HangingConnector::default());

    let doc = TestParticipant::start_with(
        &service,
        "room-123",
        "doc-1",
        ParticipantSetup {
            connector: Some(connector.clone() as Arc<dyn Connector>),
            ..ParticipantSetup::new(NegotiationRole::Initiator)
        },
    )
    .await;

    doc.wait_for_phase(Phase::Negotiating).await;
    assert!(eventually(|| connector.opens() == 1).await);

    let stopped = timeout(Duration::from_secs(1), doc.handle.shutdown()).await;
    assert!(stopped.is_ok(), "shutdown waited on the relay");

    assert_eq!(doc.handle.phase(), Phase::Idle);
    assert!(doc.engine().is_closed());
    assert!(doc.media.issued().iter().all(|t| t.is_stopped()));
    assert!(!doc.signaling.is_connected().await);
    assert_eq!(doc.lifecycle.ended(), 0);

    // A second call finds the orchestrator already gone.
    doc.handle.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_interrupts_media_acquisition() {
    init_tracing();
    let service = create_test_service();

    let doc = TestParticipant::start_with(
        &service,
        "room-123",
        "doc-1",
        ParticipantSetup {
            media: MockMediaSource::stalled(),
            ..ParticipantSetup::new(NegotiationRole::Initiator)
        },
    )
    .await;

    doc.wait_for_phase(Phase::AcquiringMedia).await;
    assert!(eventually(|| doc.media.attempts().len() == 1).await);

    let stopped = timeout(Duration::from_secs(1), doc.handle.shutdown()).await;
    assert!(stopped.is_ok(), "shutdown waited on the capture prompt");

    assert_eq!(doc.handle.phase(), Phase::Idle);
    assert_eq!(doc.engines.created(), 0);
    assert!(!doc.signaling.is_connected().await);
    assert_eq!(service.registry().session_count(), 0);
}
