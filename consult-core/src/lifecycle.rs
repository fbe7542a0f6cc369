use crate::model::SessionId;
use async_trait::async_trait;

/// Notifications for the external consultation store / UI. Both hooks
/// default to no-ops so implementors only override what they track.
#[async_trait]
pub trait SessionLifecycle: Send + Sync + 'static {
    async fn on_session_started(&self, _session_id: &SessionId) {}

    async fn on_session_ended(&self, _session_id: &SessionId) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLifecycle;

#[async_trait]
impl SessionLifecycle for NoopLifecycle {}
