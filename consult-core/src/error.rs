use crate::model::IdentifierKind;
use thiserror::Error;

/// Failures of registry and relay operations. Each one is reported only to
/// the connection that caused it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignalingError {
    #[error("invalid {kind}: {reason}")]
    InvalidIdentifier { kind: IdentifierKind, reason: String },

    #[error("participant {participant} is not a member of session {session}")]
    NotInSession { participant: String, session: String },

    #[error("session {session} is full ({limit} members)")]
    SessionFull { session: String, limit: usize },

    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// The session actor shut down between lookup and delivery.
    #[error("session {0} closed")]
    SessionClosed(String),
}
