use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use consult_core::SessionLifecycle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::RelayConfig;
use crate::registry::SessionRegistry;
use crate::signaling::{SignalingService, ws_handler};

/// `/ws` for the signaling protocol, `/health` for probes.
pub fn router(service: SignalingService) -> Router {
    // Browser clients are served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(|| async { "ok" }))
        .layer(cors)
        .with_state(service)
}

/// Runs the relay until ctrl-c.
pub async fn serve(config: RelayConfig, lifecycle: Arc<dyn SessionLifecycle>) -> Result<()> {
    let registry = SessionRegistry::new(config.registry.clone(), lifecycle);
    let service = SignalingService::new(registry, config.ice_servers.clone());
    let app = router(service);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Signaling relay listening on ws://{}/ws", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("Relay server failed")?;

    Ok(())
}
