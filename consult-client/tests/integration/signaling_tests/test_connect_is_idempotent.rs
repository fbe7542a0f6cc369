use crate::integration::{create_test_service, init_tracing};
use crate::utils::{LocalConnector, client_for, eventually, participant, session};

#[tokio::test]
async fn test_second_connect_reuses_the_transport() {
    init_tracing();
    let service = create_test_service();
    let connector = LocalConnector::new(&service);
    let client = client_for(connector.clone(), "pat-1");

    let first = client.connect(&session("room-123")).await.expect("connect");
    let second = client
        .connect(&session("room-123"))
        .await
        .expect("connect again");

    assert_eq!(first, second);
    assert_eq!(first.members, 1);
    assert!(first.peers.is_empty());
    assert_eq!(connector.opens(), 1);
    assert_eq!(
        service.registry().members(&session("room-123")).await,
        Some(vec![participant("pat-1")])
    );
}

#[tokio::test]
async fn test_concurrent_connects_share_one_attempt() {
    init_tracing();
    let service = create_test_service();
    let connector = LocalConnector::new(&service);
    let client = client_for(connector.clone(), "pat-1");
    let room = session("room-123");

    let (a, b, c) = tokio::join!(
        client.connect(&room),
        client.connect(&room),
        client.connect(&room)
    );

    let a = a.expect("first caller");
    assert_eq!(b, Ok(a.clone()));
    assert_eq!(c, Ok(a));
    assert_eq!(connector.opens(), 1);
}

#[tokio::test]
async fn test_second_participant_sees_the_first_as_peer() {
    init_tracing();
    let service = create_test_service();
    let doc = client_for(LocalConnector::new(&service), "doc-1");
    let pat = client_for(LocalConnector::new(&service), "pat-1");

    doc.connect(&session("room-123")).await.expect("doc joins");
    let ack = pat.connect(&session("room-123")).await.expect("pat joins");

    assert_eq!(ack.members, 2);
    assert_eq!(ack.peers, vec![participant("doc-1")]);
    assert_eq!(ack.participant_id, participant("pat-1"));
    assert!(!pat.ice_servers().await.is_empty());
}

#[tokio::test]
async fn test_connecting_elsewhere_leaves_the_previous_session() {
    init_tracing();
    let service = create_test_service();
    let connector = LocalConnector::new(&service);
    let client = client_for(connector.clone(), "pat-1");

    client.connect(&session("room-123")).await.expect("first");
    client.connect(&session("room-456")).await.expect("second");

    let registry = service.registry();
    assert!(eventually(|| !registry.contains_session(&session("room-123"))).await);
    assert!(registry.contains_session(&session("room-456")));
    assert_eq!(
        client.session().await.map(|ack| ack.session_id),
        Some(session("room-456"))
    );
    assert_eq!(connector.opens(), 2);
}
