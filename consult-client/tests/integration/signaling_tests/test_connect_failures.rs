use consult_client::signaling::{Anonymous, StaticIdentity};
use consult_client::{ClientError, SignalingClient, SignalingClientConfig};
use consult_core::ErrorCode;
use std::sync::Arc;
use std::time::Duration;

use crate::integration::{create_test_service, init_tracing};
use crate::utils::{HangingConnector, LocalConnector, client_for, participant, session};

fn quick_retries() -> SignalingClientConfig {
    SignalingClientConfig {
        connect_timeout: Duration::from_millis(100),
        max_attempts: 3,
        retry_backoff: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn test_transient_open_failures_are_retried() {
    init_tracing();
    let service = create_test_service();
    let connector = LocalConnector::flaky(&service, 2);
    let client = SignalingClient::new(
        connector.clone(),
        Arc::new(StaticIdentity(participant("pat-1"))),
        quick_retries(),
    );

    let ack = client.connect(&session("room-123")).await.expect("third try");
    assert_eq!(ack.members, 1);
    assert_eq!(connector.opens(), 3);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    init_tracing();
    let service = create_test_service();
    let connector = LocalConnector::flaky(&service, 3);
    let client = SignalingClient::new(
        connector.clone(),
        Arc::new(StaticIdentity(participant("pat-1"))),
        quick_retries(),
    );

    let err = client.connect(&session("room-123")).await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)), "got {err:?}");
    assert_eq!(connector.opens(), 3);
    assert!(!client.is_connected().await);

    // The failed attempt is not cached.
    client
        .connect(&session("room-123"))
        .await
        .expect("relay reachable now");
    assert_eq!(connector.opens(), 4);
}

#[tokio::test]
async fn test_unresponsive_relay_times_out() {
    init_tracing();
    let connector = Arc::new(HangingConnector::default());
    let client = SignalingClient::new(
        connector.clone(),
        Arc::new(StaticIdentity(participant("pat-1"))),
        SignalingClientConfig {
            max_attempts: 2,
            ..quick_retries()
        },
    );

    let err = client.connect(&session("room-123")).await.unwrap_err();
    assert_eq!(err, ClientError::ConnectTimeout);
    assert_eq!(connector.opens(), 2);
}

#[tokio::test]
async fn test_missing_identity_is_auth_required() {
    init_tracing();
    let service = create_test_service();
    let connector = LocalConnector::new(&service);
    let client = SignalingClient::new(
        connector.clone(),
        Arc::new(Anonymous),
        SignalingClientConfig::default(),
    );

    let err = client.connect(&session("room-123")).await.unwrap_err();
    assert_eq!(err, ClientError::AuthRequired);
    assert_eq!(connector.opens(), 0);
}

#[tokio::test]
async fn test_full_session_is_rejected_by_the_relay() {
    init_tracing();
    let service = create_test_service();
    let doc = client_for(LocalConnector::new(&service), "doc-1");
    let pat = client_for(LocalConnector::new(&service), "pat-1");
    let nurse = client_for(LocalConnector::new(&service), "nurse-1");

    doc.connect(&session("room-123")).await.expect("doc");
    pat.connect(&session("room-123")).await.expect("pat");

    let err = nurse.connect(&session("room-123")).await.unwrap_err();
    assert!(
        matches!(
            err,
            ClientError::Rejected {
                code: ErrorCode::SessionFull,
                ..
            }
        ),
        "got {err:?}"
    );
    assert!(!nurse.is_connected().await);
}
