use consult_core::CandidatePayload;
use std::collections::VecDeque;

/// Offer/answer progress of the current engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SignalingPhase {
    /// No remote description yet. Remote candidates wait in `pending`,
    /// in arrival order.
    AwaitingRemoteDescription {
        pending: VecDeque<CandidatePayload>,
        /// We sent an offer and are waiting for its answer.
        local_offer: bool,
    },
    /// An exchange is in flight on an already negotiated engine.
    Negotiating,
    Stable,
}

impl Default for SignalingPhase {
    fn default() -> Self {
        Self::AwaitingRemoteDescription {
            pending: VecDeque::new(),
            local_offer: false,
        }
    }
}

impl SignalingPhase {
    /// Nothing has happened on this engine yet.
    pub fn is_pristine(&self) -> bool {
        matches!(
            self,
            Self::AwaitingRemoteDescription { pending, local_offer: false } if pending.is_empty()
        )
    }

    pub fn is_stable(&self) -> bool {
        matches!(self, Self::Stable)
    }

    /// An incoming offer now would collide with our own exchange.
    pub fn exchange_in_flight(&self) -> bool {
        matches!(
            self,
            Self::Negotiating | Self::AwaitingRemoteDescription { local_offer: true, .. }
        )
    }

    /// Queues `candidate` while no remote description exists. Otherwise
    /// hands it back for immediate use.
    pub fn buffer(&mut self, candidate: CandidatePayload) -> Option<CandidatePayload> {
        match self {
            Self::AwaitingRemoteDescription { pending, .. } => {
                pending.push_back(candidate);
                None
            }
            _ => Some(candidate),
        }
    }

    pub fn buffered(&self) -> usize {
        match self {
            Self::AwaitingRemoteDescription { pending, .. } => pending.len(),
            _ => 0,
        }
    }

    /// We sent an offer.
    pub fn offer_sent(&mut self) {
        match self {
            Self::AwaitingRemoteDescription { local_offer, .. } => *local_offer = true,
            _ => *self = Self::Negotiating,
        }
    }

    /// A remote description was applied. Returns whatever was buffered,
    /// oldest first.
    pub fn remote_applied(&mut self) -> VecDeque<CandidatePayload> {
        match std::mem::replace(self, Self::Negotiating) {
            Self::AwaitingRemoteDescription { pending, .. } => pending,
            _ => VecDeque::new(),
        }
    }

    pub fn settle(&mut self) {
        *self = Self::Stable;
    }
}
