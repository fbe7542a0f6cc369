use consult_client::orchestrator::{NegotiationRole, Phase};
use consult_core::SignalKind;
use serde_json::json;

use crate::integration::{create_test_service, init_tracing};
use crate::utils::{ScriptedPeer, TestParticipant, candidate_line, eventually, participant};

#[tokio::test]
async fn test_candidates_before_the_offer_wait_for_it() {
    init_tracing();
    let service = create_test_service();

    let pat =
        TestParticipant::start(&service, "room-123", "pat-1", NegotiationRole::Responder).await;
    pat.wait_until_joined().await;

    let mut doc = ScriptedPeer::join(&service, "room-123", "doc-1").await;
    assert_eq!(doc.ack.peers, vec![participant("pat-1")]);

    // Unparseable, dropped without disturbing the rest.
    doc.send(SignalKind::Candidate, json!({ "bogus": true }), "pat-1")
        .await;
    for n in 1..=3 {
        doc.send_candidate(n, "pat-1").await;
    }
    doc.send_offer("pat-1").await;

    let answer = doc.next_signal(SignalKind::Answer).await;
    assert_eq!(answer.target_id, Some(participant("doc-1")));
    pat.wait_for_phase(Phase::Connected).await;

    let engine = pat.engine();
    let expected: Vec<String> = (1..=3).map(candidate_line).collect();
    assert_eq!(engine.applied_candidates(), expected);
    assert_eq!(engine.early_candidates(), 0);
}

#[tokio::test]
async fn test_candidates_before_the_answer_wait_for_it() {
    init_tracing();
    let service = create_test_service();

    let mut pat = ScriptedPeer::join(&service, "room-123", "pat-1").await;
    let doc =
        TestParticipant::start(&service, "room-123", "doc-1", NegotiationRole::Initiator).await;

    let offer = pat.next_signal(SignalKind::Offer).await;
    assert_eq!(offer.sender_id, participant("doc-1"));

    for n in 1..=3 {
        pat.send_candidate(n, "doc-1").await;
    }
    pat.send_answer("doc-1").await;

    doc.wait_for_phase(Phase::Connected).await;

    let engine = doc.engine();
    let expected: Vec<String> = (1..=3).map(candidate_line).collect();
    assert_eq!(engine.applied_candidates(), expected);
    assert_eq!(engine.early_candidates(), 0);
}

#[tokio::test]
async fn test_rejected_candidate_is_retried_on_the_next_description() {
    init_tracing();
    let service = create_test_service();

    let pat =
        TestParticipant::start(&service, "room-123", "pat-1", NegotiationRole::Responder).await;
    pat.wait_until_joined().await;

    let mut doc = ScriptedPeer::join(&service, "room-123", "doc-1").await;
    doc.send_offer("pat-1").await;
    doc.next_signal(SignalKind::Answer).await;
    pat.wait_for_phase(Phase::Connected).await;

    let engine = pat.engine();
    engine.reject_candidates(1);
    doc.send_candidate(1, "pat-1").await;
    doc.send_candidate(2, "pat-1").await;
    assert!(eventually(|| engine.applied_candidates() == vec![candidate_line(2)]).await);

    // Renegotiation brings the next remote description.
    doc.send_offer("pat-1").await;
    doc.next_signal(SignalKind::Answer).await;

    assert!(
        eventually(|| engine.applied_candidates() == vec![candidate_line(2), candidate_line(1)])
            .await
    );
    assert_eq!(engine.remote_offers(), 2);
    assert_eq!(pat.engines.created(), 1);
}
