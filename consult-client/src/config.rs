use consult_core::IceServerConfig;
use std::time::Duration;

use crate::orchestrator::MediaTier;

/// ICE servers handed to every negotiation engine.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: vec!["stun:stun.l.google.com:19302".to_owned()],
                username: None,
                credential: None,
            }],
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignalingClientConfig {
    /// Bound on opening the transport and on waiting for the join ack.
    pub connect_timeout: Duration,
    /// Transport open attempts per `connect`.
    pub max_attempts: usize,
    /// Fixed pause between failed attempts.
    pub retry_backoff: Duration,
}

impl Default for SignalingClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(20),
            max_attempts: 3,
            retry_backoff: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Capture tiers to try, best first. Anything after the first is
    /// reported as degraded.
    pub media_ladder: Vec<MediaTier>,
    /// After this long without reaching `Connected`, a slow-setup notice is
    /// emitted. Setup keeps going.
    pub setup_timeout: Duration,
    /// Pause between teardown and rebuild during automatic recovery.
    pub recovery_delay: Duration,
    /// Automatic recoveries per orchestrator lifetime. `retry` resets it.
    pub max_recoveries: u32,
    /// How long an incoming offer waits for an in-flight exchange to settle.
    pub stability_wait: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            media_ladder: MediaTier::LADDER.to_vec(),
            setup_timeout: Duration::from_secs(45),
            recovery_delay: Duration::from_secs(2),
            max_recoveries: 1,
            stability_wait: Duration::from_secs(2),
        }
    }
}
