use consult_core::SignalKind;
use consult_server::RegistryConfig;

use crate::integration::{create_test_service_with, init_tracing};
use crate::utils::{TestConnection, candidate};

#[tokio::test]
async fn test_untargeted_signal_reaches_every_other_member() {
    init_tracing();
    let (service, _) = create_test_service_with(RegistryConfig {
        max_members: None,
        ..RegistryConfig::default()
    });

    let mut members = Vec::new();
    for name in ["doc-1", "pat-1", "nurse-1", "interp-1"] {
        let mut conn = TestConnection::open(&service);
        conn.join("room-123", name).await.expect("join");
        members.push(conn);
    }

    members[0].signal(candidate("room-123", "doc-1", 7));

    for conn in members.iter_mut().skip(1) {
        let envelope = conn.next_signal().await.expect("broadcast delivered");
        assert_eq!(envelope.kind, SignalKind::Candidate);
        assert_eq!(envelope.sender_id.as_str(), "doc-1");
    }

    assert!(members[0].is_silent().await, "never echoed to the sender");
}

#[tokio::test]
async fn test_broadcast_stays_inside_the_session() {
    init_tracing();
    let (service, _) = create_test_service_with(RegistryConfig::default());

    let mut doc = TestConnection::open(&service);
    let mut pat = TestConnection::open(&service);
    let mut other = TestConnection::open(&service);

    doc.join("room-123", "doc-1").await.expect("doc joins");
    pat.join("room-123", "pat-1").await.expect("pat joins");
    other.join("room-456", "doc-2").await.expect("other joins");

    doc.signal(candidate("room-123", "doc-1", 1));

    assert!(pat.next_signal().await.is_ok());
    assert!(other.is_silent().await);
}
