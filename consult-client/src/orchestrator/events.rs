use consult_core::ParticipantId;

use crate::error::ClientError;
use crate::orchestrator::engine::RemoteTrackInfo;
use crate::orchestrator::media::MediaTier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The negotiation engine could not be built.
    EngineUnavailable(String),
    /// The relay could not be joined.
    Signaling(ClientError),
    RoleLookup(String),
    /// Automatic recovery was already used up.
    RecoveryExhausted,
}

/// Coarse call state, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    AcquiringMedia,
    Negotiating,
    Connected,
    Recovering,
    Failed(FailureReason),
}

impl Phase {
    pub fn is_failed(&self) -> bool {
        matches!(self, Phase::Failed(_))
    }
}

/// Notifications for whoever drives the call UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorEvent {
    PhaseChanged(Phase),
    /// Capture fell back below the best tier.
    MediaDegraded { tier: MediaTier },
    /// No tier could be captured. The call continues receive-only.
    MediaDenied,
    RemoteTrack(RemoteTrackInfo),
    PeerJoined(ParticipantId),
    PeerLeft(ParticipantId),
    /// Setup is taking longer than expected. Not a failure.
    SlowSetup,
    NegotiationFailed(String),
    RecoveryStarted { attempt: u32 },
    RecoveryExhausted,
    SignalingError(ClientError),
}
