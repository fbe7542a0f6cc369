use crate::registry::binding::ConnectionHandle;
use consult_core::{ConnectionId, ParticipantId, SessionId, SignalEnvelope, SignalingError};
use tokio::sync::oneshot;

/// Commands processed by a session actor, one at a time.
#[derive(Debug)]
pub(crate) enum SessionCommand {
    /// Add (or re-bind) a participant on the given connection.
    Join {
        participant: ParticipantId,
        connection: ConnectionHandle,
        reply: oneshot::Sender<Result<JoinOutcome, SignalingError>>,
    },

    /// Forward an envelope whose sender was resolved by the registry.
    Relay {
        from: ConnectionId,
        envelope: SignalEnvelope,
        reply: oneshot::Sender<Result<RelayOutcome, SignalingError>>,
    },

    /// Drop a participant, if `connection` is still its live binding.
    Leave {
        participant: ParticipantId,
        connection: ConnectionId,
        reason: LeaveReason,
        reply: oneshot::Sender<Option<LeaveOutcome>>,
    },

    Members {
        reply: oneshot::Sender<Vec<ParticipantId>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub session_id: SessionId,
    /// Member count after the join.
    pub members: usize,
    /// Everyone else currently in the session.
    pub peers: Vec<ParticipantId>,
    /// Earlier connection of the same identity that this join replaced.
    pub superseded: Option<ConnectionId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayOutcome {
    pub delivered: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    pub session_id: SessionId,
    pub participant: ParticipantId,
    pub remaining: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveReason {
    /// The transport closed.
    Disconnected,
    /// The client sent `leave_session`.
    Requested,
    /// The same connection joined a different session.
    Moved,
}
