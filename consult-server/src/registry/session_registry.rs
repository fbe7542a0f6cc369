use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::registry::binding::{Bindings, ConnectionHandle};
use crate::registry::session::Session;
use crate::registry::session_command::{
    JoinOutcome, LeaveOutcome, LeaveReason, RelayOutcome, SessionCommand,
};
use consult_core::{
    ConnectionId, NoopLifecycle, ParticipantId, SessionId, SessionLifecycle, SignalEnvelope,
    SignalingError,
};

pub(crate) struct SessionEntry {
    pub tx: mpsc::Sender<SessionCommand>,
    pub generation: u64,
}

pub(crate) struct RegistryInner {
    pub sessions: DashMap<SessionId, SessionEntry>,
    pub bindings: Bindings,
    pub lifecycle: Arc<dyn SessionLifecycle>,
    pub config: RegistryConfig,
    next_generation: AtomicU64,
}

/// Owns every live session and the identity <-> connection bindings.
/// Built once at service start and handed to request handlers by clone.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RegistryInner>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default(), Arc::new(NoopLifecycle))
    }
}

impl SessionRegistry {
    pub fn new(config: RegistryConfig, lifecycle: Arc<dyn SessionLifecycle>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                sessions: DashMap::new(),
                bindings: Bindings::default(),
                lifecycle,
                config,
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Adds `participant_id` to `session_id` on `connection`, creating the
    /// session if needed. Returns the member count and the other members.
    pub async fn join_session(
        &self,
        session_id: &str,
        participant_id: &str,
        connection: ConnectionHandle,
    ) -> Result<JoinOutcome, SignalingError> {
        let session_id = SessionId::parse(session_id)?;
        let participant = ParticipantId::parse(participant_id)?;

        // A connection belongs to one session at a time.
        if let Some(current) = self.inner.bindings.by_connection(&connection.id()) {
            if current.session != session_id || current.participant != participant {
                self.leave_session(connection.id(), LeaveReason::Moved)
                    .await;
            }
        }

        // Same identity still bound in another session: move it here.
        if let Some(previous) = self.inner.bindings.by_participant(&participant) {
            if previous.session != session_id {
                if let Some(tx) = self.sender(&previous.session) {
                    let (reply, rx) = oneshot::channel();
                    let cmd = SessionCommand::Leave {
                        participant: participant.clone(),
                        connection: previous.connection,
                        reason: LeaveReason::Moved,
                        reply,
                    };
                    if tx.send(cmd).await.is_ok() {
                        let _ = rx.await;
                    }
                }
            }
        }

        loop {
            let tx = self.get_or_spawn(&session_id);
            let (reply, rx) = oneshot::channel();
            let cmd = SessionCommand::Join {
                participant: participant.clone(),
                connection: connection.clone(),
                reply,
            };

            if tx.send(cmd).await.is_err() {
                debug!("Session {} closed under us, retrying join", session_id);
                continue;
            }

            match rx.await {
                Ok(Err(SignalingError::SessionClosed(_))) | Err(_) => {
                    debug!("Session {} closed under us, retrying join", session_id);
                    continue;
                }
                Ok(result) => return result,
            }
        }
    }

    /// Forwards `envelope` from the participant bound to `from`. The sender
    /// identity is always taken from the binding, never trusted from the
    /// envelope.
    pub async fn relay_signal(
        &self,
        from: ConnectionId,
        mut envelope: SignalEnvelope,
    ) -> Result<RelayOutcome, SignalingError> {
        let not_in_session = |envelope: &SignalEnvelope| SignalingError::NotInSession {
            participant: envelope.sender_id.to_string(),
            session: envelope.session_id.to_string(),
        };

        let Some(binding) = self.inner.bindings.by_connection(&from) else {
            warn!("Signal from unbound connection {}", from);
            return Err(not_in_session(&envelope));
        };

        if binding.session != envelope.session_id {
            warn!(
                "{} tried to signal into {} while bound to {}",
                binding.participant, envelope.session_id, binding.session
            );
            return Err(not_in_session(&envelope));
        }

        envelope.sender_id = binding.participant;

        let Some(tx) = self.sender(&envelope.session_id) else {
            return Err(not_in_session(&envelope));
        };

        let (reply, rx) = oneshot::channel();
        let err = not_in_session(&envelope);
        let cmd = SessionCommand::Relay {
            from,
            envelope,
            reply,
        };

        if tx.send(cmd).await.is_err() {
            return Err(err);
        }

        match rx.await {
            Ok(Err(SignalingError::SessionClosed(_))) | Err(_) => Err(err),
            Ok(result) => result,
        }
    }

    /// Removes whatever participant is bound to `connection`. A no-op for
    /// unbound or already superseded connections.
    pub async fn leave_session(
        &self,
        connection: ConnectionId,
        reason: LeaveReason,
    ) -> Option<LeaveOutcome> {
        let binding = self.inner.bindings.by_connection(&connection)?;
        let tx = self.sender(&binding.session)?;

        let (reply, rx) = oneshot::channel();
        let cmd = SessionCommand::Leave {
            participant: binding.participant,
            connection,
            reason,
            reply,
        };

        tx.send(cmd).await.ok()?;
        rx.await.ok().flatten()
    }

    /// Current members, or `None` if no such session is live.
    pub async fn members(&self, session_id: &SessionId) -> Option<Vec<ParticipantId>> {
        let tx = self.sender(session_id)?;
        let (reply, rx) = oneshot::channel();
        tx.send(SessionCommand::Members { reply }).await.ok()?;
        let members = rx.await.ok()?;
        (!members.is_empty()).then_some(members)
    }

    pub fn session_count(&self) -> usize {
        self.inner.sessions.len()
    }

    pub fn contains_session(&self, session_id: &SessionId) -> bool {
        self.inner.sessions.contains_key(session_id)
    }

    /// Session and connection currently bound to `participant`.
    pub fn binding_of(&self, participant: &ParticipantId) -> Option<(SessionId, ConnectionId)> {
        self.inner
            .bindings
            .by_participant(participant)
            .map(|b| (b.session, b.connection))
    }

    fn sender(&self, session_id: &SessionId) -> Option<mpsc::Sender<SessionCommand>> {
        self.inner.sessions.get(session_id).map(|e| e.tx.clone())
    }

    fn get_or_spawn(&self, session_id: &SessionId) -> mpsc::Sender<SessionCommand> {
        let entry = self
            .inner
            .sessions
            .entry(session_id.clone())
            .or_insert_with(|| {
                info!("Creating new session: {}", session_id);
                let (tx, rx) = mpsc::channel(self.inner.config.command_buffer);
                let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
                let session = Session::new(session_id.clone(), generation, rx, self.inner.clone());
                tokio::spawn(session.run());
                SessionEntry { tx, generation }
            });

        entry.tx.clone()
    }
}
