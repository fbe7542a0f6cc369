use consult_core::IceServerConfig;
use std::net::SocketAddr;

/// Limits applied by the session registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Distinct identities allowed per session. `None` leaves sessions
    /// uncapped; the negotiation side assumes exactly two media peers.
    pub max_members: Option<usize>,
    /// Capacity of each session actor's command queue.
    pub command_buffer: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_members: Some(2),
            command_buffer: 100,
        }
    }
}

/// Settings for the relay process.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind_addr: SocketAddr,
    /// Advertised to every client right after it connects.
    pub ice_servers: Vec<IceServerConfig>,
    pub registry: RegistryConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            ice_servers: vec![IceServerConfig {
                urls: vec!["stun:stun.l.google.com:19302".to_owned()],
                username: None,
                credential: None,
            }],
            registry: RegistryConfig::default(),
        }
    }
}
