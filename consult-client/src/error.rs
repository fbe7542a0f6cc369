use consult_core::ErrorCode;
use thiserror::Error;

use crate::orchestrator::MediaTier;

/// Failures of the signaling client. Cloneable because one pending
/// connection attempt may resolve several concurrent `connect` callers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("no participant identity available for this session")]
    AuthRequired,

    #[error("not connected to a session")]
    NotConnected,

    #[error("connection attempt timed out")]
    ConnectTimeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("relay rejected the request ({code:?}): {message}")]
    Rejected { code: ErrorCode, message: String },

    #[error("connection to the relay was lost")]
    ConnectionLost,

    /// `disconnect` (or a connect to another session) overtook this attempt.
    #[error("connection attempt was cancelled")]
    Cancelled,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("media permission denied: {0}")]
    Denied(String),

    #[error("{tier:?} capture unavailable: {reason}")]
    Unavailable { tier: MediaTier, reason: String },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("could not construct negotiation engine: {0}")]
    Construction(String),

    #[error("invalid session description: {0}")]
    InvalidDescription(String),

    #[error("invalid ice candidate: {0}")]
    InvalidCandidate(String),

    #[error("engine is closed")]
    Closed,

    #[error(transparent)]
    Rtc(#[from] webrtc::Error),
}

/// Errors surfaced by the orchestrator's handle and collaborators.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("role lookup failed: {0}")]
    RoleLookup(String),

    #[error(transparent)]
    Signaling(#[from] ClientError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("orchestrator has stopped")]
    Stopped,
}
