use consult_core::{ConnectionId, ParticipantId, ServerMessage, SessionId};
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::warn;

/// Outbound half of one live transport. Cloning is cheap; every clone
/// feeds the same socket writer.
#[derive(Clone, Debug)]
pub struct ConnectionHandle {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<ServerMessage>,
}

impl ConnectionHandle {
    pub fn new(tx: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self {
            id: ConnectionId::new(),
            tx,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Best effort: a closed writer only gets logged.
    pub fn send(&self, msg: ServerMessage) -> bool {
        if self.tx.send(msg).is_err() {
            warn!("Dropping message for closed connection {}", self.id);
            return false;
        }
        true
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Binding {
    pub participant: ParticipantId,
    pub session: SessionId,
    pub connection: ConnectionId,
}

/// The identity <-> connection bijection. Mutated only from inside the
/// owning session's actor, so updates for one session never interleave.
#[derive(Default)]
pub(crate) struct Bindings {
    by_participant: DashMap<ParticipantId, Binding>,
    by_connection: DashMap<ConnectionId, Binding>,
}

impl Bindings {
    /// Installs `binding`, dropping whatever connection the identity had before.
    pub fn bind(&self, binding: Binding) -> Option<Binding> {
        let previous = self
            .by_participant
            .insert(binding.participant.clone(), binding.clone());

        if let Some(old) = &previous {
            if old.connection != binding.connection {
                self.by_connection
                    .remove_if(&old.connection, |_, b| b.participant == old.participant);
            }
        }

        self.by_connection.insert(binding.connection, binding);
        previous
    }

    /// Removes the binding only if `connection` is still the one bound to
    /// `participant`; a stale teardown leaves a newer binding alone.
    pub fn unbind(&self, participant: &ParticipantId, connection: ConnectionId) -> bool {
        let removed = self
            .by_participant
            .remove_if(participant, |_, b| b.connection == connection)
            .is_some();

        self.by_connection
            .remove_if(&connection, |_, b| &b.participant == participant);

        removed
    }

    pub fn by_connection(&self, connection: &ConnectionId) -> Option<Binding> {
        self.by_connection.get(connection).map(|b| b.value().clone())
    }

    pub fn by_participant(&self, participant: &ParticipantId) -> Option<Binding> {
        self.by_participant.get(participant).map(|b| b.value().clone())
    }

    pub fn len(&self) -> usize {
        self.by_participant.len()
    }
}
