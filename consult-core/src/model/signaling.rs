use crate::model::participant::ParticipantId;
use crate::model::session::SessionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Offer,
    Answer,
    Candidate,
}

/// A negotiation message routed by the relay. The relay never looks inside
/// `payload`; only the two peers interpret it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalEnvelope {
    pub kind: SignalKind,
    pub session_id: SessionId,
    pub sender_id: ParticipantId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<ParticipantId>,
    pub payload: Value,
    /// Client clock, milliseconds since the unix epoch.
    pub timestamp: u64,
    /// Server clock, set by the relay on forwarding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relayed_at: Option<u64>,
}

impl SignalEnvelope {
    pub fn new(
        kind: SignalKind,
        session_id: SessionId,
        sender_id: ParticipantId,
        target_id: Option<ParticipantId>,
        payload: Value,
    ) -> Self {
        Self {
            kind,
            session_id,
            sender_id,
            target_id,
            payload,
            timestamp: now_millis(),
            relayed_at: None,
        }
    }

    pub fn description(&self) -> Result<DescriptionPayload, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }

    pub fn candidate(&self) -> Result<CandidatePayload, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

/// Payload of `offer` and `answer` envelopes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DescriptionPayload {
    pub sdp: String,
}

/// Payload of `candidate` envelopes, shaped like a browser `RTCIceCandidateInit`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePayload {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default, rename = "sdpMLineIndex")]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default)]
    pub username_fragment: Option<String>,
}

impl CandidatePayload {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_m_line_index: None,
            username_fragment: None,
        }
    }
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
