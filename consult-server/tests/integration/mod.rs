
use std::sync::Arc;
use tracing::Level;

use consult_server::{RegistryConfig, SessionRegistry, SignalingService};

use crate::utils::RecordingLifecycle;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn create_test_service() -> (SignalingService, RecordingLifecycle) {
    create_test_service_with(RegistryConfig::default())
}

pub fn create_test_service_with(config: RegistryConfig) -> (SignalingService, RecordingLifecycle) {
    let lifecycle = RecordingLifecycle::new();
    let registry = SessionRegistry::new(config, Arc::new(lifecycle.clone()));
    (SignalingService::new(registry, Vec::new()), lifecycle)
}
