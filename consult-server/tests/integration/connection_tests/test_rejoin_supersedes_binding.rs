use consult_core::ServerMessage;
use consult_server::LeaveReason;

use crate::integration::{create_test_service, init_tracing};
use crate::utils::{TestConnection, offer, participant, raw_connection, session};

#[tokio::test]
async fn test_rejoin_replaces_binding_without_duplicating() {
    init_tracing();
    let (service, _) = create_test_service();
    let registry = service.registry();

    let (first, _rx1) = raw_connection();
    let (second, _rx2) = raw_connection();
    let first_id = first.id();
    let second_id = second.id();

    let joined = registry
        .join_session("room-123", "doc-1", first)
        .await
        .expect("first join");
    assert_eq!(joined.members, 1);
    assert_eq!(joined.superseded, None);

    // Reconnect of the same identity, idempotent in membership.
    for _ in 0..3 {
        let rejoined = registry
            .join_session("room-123", "doc-1", second.clone())
            .await
            .expect("rejoin");
        assert_eq!(rejoined.members, 1);
    }

    let members = registry.members(&session("room-123")).await.expect("live");
    assert_eq!(members, vec![participant("doc-1")]);
    assert_eq!(
        registry.binding_of(&participant("doc-1")),
        Some((session("room-123"), second_id))
    );

    // The superseded transport tearing down late must not evict the new one.
    assert!(registry.leave_session(first_id, LeaveReason::Disconnected).await.is_none());
    assert_eq!(
        registry.members(&session("room-123")).await,
        Some(vec![participant("doc-1")])
    );
}

#[tokio::test]
async fn test_rejoin_reports_superseded_connection() {
    init_tracing();
    let (service, _) = create_test_service();
    let registry = service.registry();

    let (first, _rx1) = raw_connection();
    let (second, _rx2) = raw_connection();
    let first_id = first.id();

    registry.join_session("room-123", "pat-1", first).await.expect("join");
    let outcome = registry
        .join_session("room-123", "pat-1", second)
        .await
        .expect("rejoin");

    assert_eq!(outcome.superseded, Some(first_id));
}

#[tokio::test]
async fn test_signals_follow_the_newest_connection() {
    init_tracing();
    let (service, _) = create_test_service();

    let mut doc = TestConnection::open(&service);
    let mut stale_pat = TestConnection::open(&service);
    let mut fresh_pat = TestConnection::open(&service);

    doc.join("room-123", "doc-1").await.expect("doc joins");
    stale_pat.join("room-123", "pat-1").await.expect("pat joins");
    let rejoin = fresh_pat.join("room-123", "pat-1").await.expect("pat rejoins");
    assert!(matches!(rejoin, ServerMessage::Joined { members: 2, .. }));

    doc.signal(offer("room-123", "doc-1", Some("pat-1")));

    let delivered = fresh_pat.next_signal().await.expect("offer on new connection");
    assert_eq!(delivered.sender_id, participant("doc-1"));
    assert!(stale_pat.is_silent().await, "stale connection must not receive signals");

    // The stale connection can no longer speak for pat-1.
    stale_pat.signal(offer("room-123", "pat-1", None));
    assert!(stale_pat.next_error().await.is_ok());
    assert!(doc.is_silent().await);
}
