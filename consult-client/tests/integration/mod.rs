
use consult_server::{RegistryConfig, SessionRegistry, SignalingService};
use consult_core::IceServerConfig;
use std::sync::Arc;
use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn create_test_service() -> SignalingService {
    let registry = SessionRegistry::new(
        RegistryConfig::default(),
        Arc::new(consult_core::NoopLifecycle),
    );
    SignalingService::new(
        registry,
        vec![IceServerConfig {
            urls: vec!["stun:stun.example.org:3478".to_owned()],
            username: None,
            credential: None,
        }],
    )
}
