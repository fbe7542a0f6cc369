use consult_client::orchestrator::{NegotiationRole, OrchestratorEvent, Phase};

use crate::integration::{create_test_service, init_tracing};
use crate::utils::{TestParticipant, connected_pair, participant};

#[tokio::test]
async fn test_peer_leaving_resets_and_rejoining_reconnects() {
    init_tracing();
    let service = create_test_service();

    let (mut doc, pat) = connected_pair(&service).await;
    let first_engine = doc.engine();

    pat.handle.shutdown().await;

    let event = doc
        .wait_for_event(|e| matches!(e, OrchestratorEvent::PeerLeft(_)))
        .await;
    assert_eq!(event, OrchestratorEvent::PeerLeft(participant("pat-1")));
    doc.wait_for_phase(Phase::Negotiating).await;

    assert_eq!(doc.engines.created(), 2);
    assert!(first_engine.is_closed());
    // Local media survives a peer leaving.
    assert!(doc.media.issued().iter().all(|t| !t.is_stopped()));
    assert_eq!(doc.engine().tracks().len(), 2);

    let pat =
        TestParticipant::start(&service, "room-123", "pat-1", NegotiationRole::Responder).await;
    doc.wait_for_phase(Phase::Connected).await;
    pat.wait_for_phase(Phase::Connected).await;
    assert_eq!(doc.engines.created(), 2);
}
