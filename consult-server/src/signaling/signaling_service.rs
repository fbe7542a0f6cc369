use consult_core::{ClientMessage, IceServerConfig, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::registry::{ConnectionHandle, SessionRegistry};
use crate::signaling::Connection;

struct SignalingInner {
    registry: SessionRegistry,
    ice_servers: Vec<IceServerConfig>,
}

/// Shared state behind every relay connection.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

/// Both halves of an in-process relay connection.
pub struct LocalConnection {
    pub tx: mpsc::UnboundedSender<ClientMessage>,
    pub rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl SignalingService {
    pub fn new(registry: SessionRegistry, ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                registry,
                ice_servers,
            }),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.inner.registry
    }

    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    /// Opens a connection that skips the socket but runs the same protocol
    /// loop. Dropping `tx` behaves like the transport closing.
    pub fn connect_local(&self) -> LocalConnection {
        let (client_tx, mut client_rx) = mpsc::unbounded_channel::<ClientMessage>();
        let (server_tx, server_rx) = mpsc::unbounded_channel::<ServerMessage>();

        let connection = Connection::open(self.clone(), ConnectionHandle::new(server_tx));

        tokio::spawn(async move {
            while let Some(msg) = client_rx.recv().await {
                connection.handle_message(msg).await;
            }
            connection.close().await;
        });

        LocalConnection {
            tx: client_tx,
            rx: server_rx,
        }
    }
}
