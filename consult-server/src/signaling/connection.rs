use consult_core::{ClientMessage, ServerMessage, SignalingError};
use tracing::{debug, info, warn};

use crate::registry::{ConnectionHandle, LeaveReason};
use crate::signaling::SignalingService;

/// Per-transport protocol state shared by the websocket handler and
/// in-process connections. Every error is answered on this connection only.
pub struct Connection {
    service: SignalingService,
    handle: ConnectionHandle,
}

impl Connection {
    /// Registers the outbound half and greets it with the ICE configuration.
    pub fn open(service: SignalingService, handle: ConnectionHandle) -> Self {
        info!("Connection {} opened", handle.id());

        handle.send(ServerMessage::IceConfig {
            ice_servers: service.ice_servers(),
        });

        Self { service, handle }
    }

    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    /// Decodes one text frame; undecodable frames get a `malformed_message` reply.
    pub async fn handle_text(&self, text: &str) {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(msg) => self.handle_message(msg).await,
            Err(e) => {
                warn!("Invalid ClientMessage on {}: {}", self.handle.id(), e);
                self.reply_error(&SignalingError::MalformedMessage(e.to_string()));
            }
        }
    }

    pub async fn handle_message(&self, msg: ClientMessage) {
        let registry = self.service.registry();

        match msg {
            ClientMessage::JoinSession {
                session_id,
                participant_id,
            } => {
                // The session actor queues the `joined` ack itself.
                if let Err(e) = registry
                    .join_session(&session_id, &participant_id, self.handle.clone())
                    .await
                {
                    warn!("Join rejected on {}: {}", self.handle.id(), e);
                    self.reply_error(&e);
                }
            }

            ClientMessage::Signal(envelope) => {
                match registry.relay_signal(self.handle.id(), envelope).await {
                    Ok(outcome) => debug!(
                        "Relayed signal from {} to {} recipient(s)",
                        self.handle.id(),
                        outcome.delivered
                    ),
                    Err(e) => {
                        warn!("Relay rejected on {}: {}", self.handle.id(), e);
                        self.reply_error(&e);
                    }
                }
            }

            ClientMessage::LeaveSession => {
                registry
                    .leave_session(self.handle.id(), LeaveReason::Requested)
                    .await;
            }

            ClientMessage::Ping => {
                self.handle.send(ServerMessage::Pong);
            }
        }
    }

    /// Releases the registry binding of this transport, if it still owns one.
    pub async fn close(self) {
        let outcome = self
            .service
            .registry()
            .leave_session(self.handle.id(), LeaveReason::Disconnected)
            .await;

        match outcome {
            Some(left) => info!(
                "Connection {} closed, {} left {}",
                self.handle.id(),
                left.participant,
                left.session_id
            ),
            None => info!("Connection {} closed", self.handle.id()),
        }
    }

    fn reply_error(&self, err: &SignalingError) {
        self.handle.send(ServerMessage::error(err));
    }
}
