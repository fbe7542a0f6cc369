use consult_core::{ServerMessage, SignalKind};

use crate::integration::{create_test_service, init_tracing};
use crate::utils::{TestConnection, answer, candidate, offer, participant, session};

/// doc-1 and pat-1 meet in room-123 and exchange offer, answer and
/// candidates; every envelope reaches exactly the other party.
#[tokio::test]
async fn test_offer_answer_exchange_between_two_members() {
    init_tracing();
    let (service, lifecycle) = create_test_service();

    let mut doc = TestConnection::open(&service);
    let mut pat = TestConnection::open(&service);

    let joined = doc.join("room-123", "doc-1").await.expect("doc joins");
    assert!(matches!(joined, ServerMessage::Joined { members: 1, .. }));

    let joined = pat.join("room-123", "pat-1").await.expect("pat joins");
    match joined {
        ServerMessage::Joined { members, peers, .. } => {
            assert_eq!(members, 2);
            assert_eq!(peers, vec![participant("doc-1")]);
        }
        other => panic!("unexpected reply {other:?}"),
    }

    doc.signal(offer("room-123", "doc-1", Some("pat-1")));
    let received = pat.next_signal().await.expect("offer");
    assert_eq!(received.kind, SignalKind::Offer);
    assert_eq!(received.sender_id, participant("doc-1"));

    pat.signal(answer("room-123", "pat-1", Some("doc-1")));
    let received = doc.next_signal().await.expect("answer");
    assert_eq!(received.kind, SignalKind::Answer);
    assert_eq!(received.sender_id, participant("pat-1"));

    // Candidates from one sender keep their send order.
    for n in 1..=3 {
        pat.signal(candidate("room-123", "pat-1", n));
    }
    for n in 1..=3 {
        let received = doc.next_signal().await.expect("candidate");
        let payload = received.candidate().expect("candidate payload");
        assert!(payload.candidate.starts_with(&format!("candidate:{n} ")));
    }

    assert!(doc.is_silent().await);
    assert!(pat.is_silent().await);

    let members = service
        .registry()
        .members(&session("room-123"))
        .await
        .expect("session is live");
    assert_eq!(members.len(), 2);

    assert!(lifecycle.wait_for_events(1, 1000).await);
}
