use async_trait::async_trait;
use consult_core::{ParticipantId, SessionId};

/// Resolves who the local user is in a given session. `None` means the
/// user is not authenticated for it.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    async fn identity_for(&self, session_id: &SessionId) -> Option<ParticipantId>;
}

/// Always answers with the same identity.
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub ParticipantId);

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn identity_for(&self, _session_id: &SessionId) -> Option<ParticipantId> {
        Some(self.0.clone())
    }
}

/// No signed-in user.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

#[async_trait]
impl IdentityProvider for Anonymous {
    async fn identity_for(&self, _session_id: &SessionId) -> Option<ParticipantId> {
        None
    }
}
