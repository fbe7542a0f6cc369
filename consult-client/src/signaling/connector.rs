use async_trait::async_trait;
use consult_core::{ClientMessage, ServerMessage};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use crate::error::ClientError;

/// Opens transports to the relay. One call, one fresh connection.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn open(&self) -> Result<TransportLink, ClientError>;
}

/// Aborts the tasks pumping a transport when the link goes away.
#[derive(Default)]
pub struct TaskGuard(Vec<JoinHandle<()>>);

impl TaskGuard {
    pub fn push(&mut self, task: JoinHandle<()>) {
        self.0.push(task);
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        for task in &self.0 {
            task.abort();
        }
    }
}

/// An open transport as typed message channels. Closing `tx` closes the
/// connection; `rx` ends when the relay side goes away.
pub struct TransportLink {
    pub tx: mpsc::UnboundedSender<ClientMessage>,
    pub rx: mpsc::UnboundedReceiver<ServerMessage>,
    pub guard: TaskGuard,
}

impl TransportLink {
    pub fn new(
        tx: mpsc::UnboundedSender<ClientMessage>,
        rx: mpsc::UnboundedReceiver<ServerMessage>,
    ) -> Self {
        Self {
            tx,
            rx,
            guard: TaskGuard::default(),
        }
    }
}

/// Websocket connector speaking the relay's JSON frames.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn open(&self) -> Result<TransportLink, ClientError> {
        let (socket, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        debug!("Websocket connected to {}", self.url);

        let (mut sink, mut stream) = socket.split();
        let (client_tx, mut client_rx) = mpsc::unbounded_channel::<ClientMessage>();
        let (server_tx, server_rx) = mpsc::unbounded_channel::<ServerMessage>();

        // Finishes on its own once `tx` is dropped, sending a close frame
        // on the way out.
        tokio::spawn(async move {
            while let Some(msg) = client_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to encode {:?}: {}", msg, e);
                        continue;
                    }
                };
                if sink.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let reader = tokio::spawn(async move {
            while let Some(Ok(frame)) = stream.next().await {
                match frame {
                    Message::Text(text) => {
                        match serde_json::from_str::<ServerMessage>(text.as_str()) {
                            Ok(msg) => {
                                if server_tx.send(msg).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("Unreadable relay frame: {}", e),
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            debug!("Relay stream ended");
        });

        let mut link = TransportLink::new(client_tx, server_rx);
        link.guard.push(reader);
        Ok(link)
    }
}
