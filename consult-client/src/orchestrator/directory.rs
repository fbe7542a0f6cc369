use async_trait::async_trait;
use consult_core::{ParticipantId, SessionId};

use crate::error::OrchestratorError;

/// Which side sends the first offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationRole {
    Initiator,
    Responder,
}

/// Consultation record lookup. Queried once per orchestrator.
#[async_trait]
pub trait SessionDirectory: Send + Sync + 'static {
    async fn role_for(
        &self,
        session_id: &SessionId,
        participant: &ParticipantId,
    ) -> Result<NegotiationRole, OrchestratorError>;
}

/// A fixed role, for callers that already know it.
#[async_trait]
impl SessionDirectory for NegotiationRole {
    async fn role_for(
        &self,
        _session_id: &SessionId,
        _participant: &ParticipantId,
    ) -> Result<NegotiationRole, OrchestratorError> {
        Ok(*self)
    }
}
