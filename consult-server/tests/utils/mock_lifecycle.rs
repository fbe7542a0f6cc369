use async_trait::async_trait;
use consult_core::{SessionId, SessionLifecycle};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Started(SessionId),
    Ended(SessionId),
}

/// SessionLifecycle that records every notification.
#[derive(Clone, Default)]
pub struct RecordingLifecycle {
    events: Arc<Mutex<Vec<LifecycleEvent>>>,
}

impl RecordingLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().await.clone()
    }

    /// Wait until at least `count` notifications were recorded.
    pub async fn wait_for_events(&self, count: usize, timeout_ms: u64) -> bool {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(timeout_ms);

        loop {
            if self.events.lock().await.len() >= count {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl SessionLifecycle for RecordingLifecycle {
    async fn on_session_started(&self, session_id: &SessionId) {
        tracing::debug!("[RecordingLifecycle] started {}", session_id);
        self.events
            .lock()
            .await
            .push(LifecycleEvent::Started(session_id.clone()));
    }

    async fn on_session_ended(&self, session_id: &SessionId) {
        tracing::debug!("[RecordingLifecycle] ended {}", session_id);
        self.events
            .lock()
            .await
            .push(LifecycleEvent::Ended(session_id.clone()));
    }
}
