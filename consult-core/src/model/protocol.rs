use crate::error::SignalingError;
use crate::model::participant::ParticipantId;
use crate::model::session::SessionId;
use crate::model::signaling::{IceServerConfig, SignalEnvelope};
use serde::{Deserialize, Serialize};

/// Frames a participant sends to the relay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Identifiers stay raw strings here so malformed ones reach the relay
    /// and are rejected with an `invalid_identifier` reply instead of a
    /// generic parse failure.
    JoinSession {
        session_id: String,
        participant_id: String,
    },
    Signal(SignalEnvelope),
    LeaveSession,
    Ping,
}

/// Frames the relay sends to a participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d", rename_all = "snake_case")]
pub enum ServerMessage {
    IceConfig {
        ice_servers: Vec<IceServerConfig>,
    },
    Joined {
        session_id: SessionId,
        participant_id: ParticipantId,
        members: usize,
        peers: Vec<ParticipantId>,
    },
    UserConnected {
        participant_id: ParticipantId,
    },
    UserDisconnected {
        participant_id: ParticipantId,
    },
    Signal(SignalEnvelope),
    Error {
        code: ErrorCode,
        message: String,
    },
    Pong,
}

impl ServerMessage {
    pub fn error(err: &SignalingError) -> Self {
        Self::Error {
            code: ErrorCode::from(err),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidIdentifier,
    NotInSession,
    SessionFull,
    MalformedMessage,
    Internal,
}

impl From<&SignalingError> for ErrorCode {
    fn from(err: &SignalingError) -> Self {
        match err {
            SignalingError::InvalidIdentifier { .. } => ErrorCode::InvalidIdentifier,
            SignalingError::NotInSession { .. } => ErrorCode::NotInSession,
            SignalingError::SessionFull { .. } => ErrorCode::SessionFull,
            SignalingError::MalformedMessage(_) => ErrorCode::MalformedMessage,
            SignalingError::SessionClosed(_) => ErrorCode::Internal,
        }
    }
}
