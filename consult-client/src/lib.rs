mod config;
mod error;
mod fallback;
pub mod orchestrator;
pub mod signaling;

pub use config::{OrchestratorConfig, SignalingClientConfig, TransportConfig};
pub use error::{ClientError, EngineError, MediaError, OrchestratorError};
pub use fallback::first_success;
pub use signaling::{JoinAck, SignalingClient};
