use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::registry::binding::{Binding, ConnectionHandle};
use crate::registry::session_command::{
    JoinOutcome, LeaveOutcome, LeaveReason, RelayOutcome, SessionCommand,
};
use crate::registry::session_registry::RegistryInner;
use consult_core::{
    ConnectionId, ParticipantId, ServerMessage, SessionId, SignalEnvelope, SignalingError,
    now_millis,
};

/// Actor owning one session's membership. Every mutation for the session,
/// including its share of the identity <-> connection bindings, runs on
/// this task, so concurrent joins and leaves for it are serialized.
pub(crate) struct Session {
    id: SessionId,
    generation: u64,
    members: HashMap<ParticipantId, ConnectionHandle>,
    command_rx: mpsc::Receiver<SessionCommand>,
    registry: Arc<RegistryInner>,
}

impl Session {
    pub fn new(
        id: SessionId,
        generation: u64,
        command_rx: mpsc::Receiver<SessionCommand>,
        registry: Arc<RegistryInner>,
    ) -> Self {
        Self {
            id,
            generation,
            members: HashMap::new(),
            command_rx,
            registry,
        }
    }

    /// Runs until the last member leaves. Must be spawned.
    pub async fn run(mut self) {
        info!("Session {} started", self.id);
        self.registry.lifecycle.on_session_started(&self.id).await;

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd);

            if self.members.is_empty() {
                break;
            }
        }

        self.shutdown().await;
    }

    fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Join {
                participant,
                connection,
                reply,
            } => {
                let _ = reply.send(self.join(participant, connection));
            }

            SessionCommand::Relay {
                from,
                envelope,
                reply,
            } => {
                let _ = reply.send(self.relay(from, envelope));
            }

            SessionCommand::Leave {
                participant,
                connection,
                reason,
                reply,
            } => {
                let _ = reply.send(self.leave(&participant, connection, reason));
            }

            SessionCommand::Members { reply } => {
                let _ = reply.send(self.member_ids());
            }
        }
    }

    fn join(
        &mut self,
        participant: ParticipantId,
        connection: ConnectionHandle,
    ) -> Result<JoinOutcome, SignalingError> {
        let existing = self.members.get(&participant).map(ConnectionHandle::id);

        if existing.is_none() {
            if let Some(limit) = self.registry.config.max_members {
                if self.members.len() >= limit {
                    warn!(
                        "Session {} is full, rejecting {}",
                        self.id, participant
                    );
                    return Err(SignalingError::SessionFull {
                        session: self.id.to_string(),
                        limit,
                    });
                }
            }
        }

        // The old transport is left open; its own teardown will find the
        // binding gone and do nothing.
        let superseded = existing.filter(|old| *old != connection.id());
        if let Some(old) = superseded {
            info!(
                "{} rejoined session {} on {}, superseding {}",
                participant,
                self.id,
                connection.id(),
                old
            );
        }

        let peers: Vec<ParticipantId> = self
            .member_ids()
            .into_iter()
            .filter(|id| id != &participant)
            .collect();

        for peer in &peers {
            if let Some(handle) = self.members.get(peer) {
                handle.send(ServerMessage::UserConnected {
                    participant_id: participant.clone(),
                });
            }
        }

        self.registry.bindings.bind(Binding {
            participant: participant.clone(),
            session: self.id.clone(),
            connection: connection.id(),
        });
        self.members.insert(participant.clone(), connection.clone());

        let members = self.members.len();

        // The ack is queued here so it always precedes any signal relayed
        // to this connection afterwards.
        connection.send(ServerMessage::Joined {
            session_id: self.id.clone(),
            participant_id: participant.clone(),
            members,
            peers: peers.clone(),
        });

        info!(
            "{} joined session {} ({} members)",
            participant, self.id, members
        );

        Ok(JoinOutcome {
            session_id: self.id.clone(),
            members,
            peers,
            superseded,
        })
    }

    fn relay(
        &self,
        from: ConnectionId,
        mut envelope: SignalEnvelope,
    ) -> Result<RelayOutcome, SignalingError> {
        let sender = envelope.sender_id.clone();

        match self.members.get(&sender) {
            Some(handle) if handle.id() == from => {}
            _ => {
                return Err(SignalingError::NotInSession {
                    participant: sender.to_string(),
                    session: self.id.to_string(),
                });
            }
        }

        envelope.relayed_at = Some(now_millis());

        let direct = envelope
            .target_id
            .as_ref()
            .filter(|target| **target != sender)
            .and_then(|target| self.members.get(target).map(|h| (target.clone(), h)));

        if let Some((target, handle)) = direct {
            debug!(
                "Relaying {:?} {} -> {} in {}",
                envelope.kind, sender, target, self.id
            );
            let delivered = usize::from(handle.send(ServerMessage::Signal(envelope)));
            return Ok(RelayOutcome { delivered });
        }

        let mut delivered = 0;
        for (id, handle) in &self.members {
            if *id == sender {
                continue;
            }
            if handle.send(ServerMessage::Signal(envelope.clone())) {
                delivered += 1;
            }
        }

        debug!(
            "Broadcast {:?} from {} to {} member(s) of {}",
            envelope.kind, sender, delivered, self.id
        );
        Ok(RelayOutcome { delivered })
    }

    fn leave(
        &mut self,
        participant: &ParticipantId,
        connection: ConnectionId,
        reason: LeaveReason,
    ) -> Option<LeaveOutcome> {
        let is_current = self
            .members
            .get(participant)
            .is_some_and(|h| h.id() == connection);

        if !is_current {
            debug!(
                "Ignoring stale leave of {} on {} ({:?})",
                participant, connection, reason
            );
            return None;
        }

        self.members.remove(participant);
        self.registry.bindings.unbind(participant, connection);

        for handle in self.members.values() {
            handle.send(ServerMessage::UserDisconnected {
                participant_id: participant.clone(),
            });
        }

        // Unregister before replying so the caller never observes an empty
        // session that still resolves.
        if self.members.is_empty() {
            self.unregister();
        }

        info!(
            "{} left session {} ({:?}, {} remaining)",
            participant,
            self.id,
            reason,
            self.members.len()
        );

        Some(LeaveOutcome {
            session_id: self.id.clone(),
            participant: participant.clone(),
            remaining: self.members.len(),
        })
    }

    fn unregister(&self) {
        let generation = self.generation;
        self.registry
            .sessions
            .remove_if(&self.id, |_, entry| entry.generation == generation);
    }

    fn member_ids(&self) -> Vec<ParticipantId> {
        let mut ids: Vec<ParticipantId> = self.members.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Unregisters the session and rejects whatever was queued behind the
    /// last leave, so callers retry against a fresh session.
    async fn shutdown(mut self) {
        self.unregister();

        self.command_rx.close();
        while let Ok(cmd) = self.command_rx.try_recv() {
            let closed = SignalingError::SessionClosed(self.id.to_string());
            match cmd {
                SessionCommand::Join { reply, .. } => {
                    let _ = reply.send(Err(closed));
                }
                SessionCommand::Relay { reply, .. } => {
                    let _ = reply.send(Err(closed));
                }
                SessionCommand::Leave { reply, .. } => {
                    let _ = reply.send(None);
                }
                SessionCommand::Members { reply } => {
                    let _ = reply.send(Vec::new());
                }
            }
        }

        self.registry.lifecycle.on_session_ended(&self.id).await;
        info!("Session {} ended", self.id);
    }
}
