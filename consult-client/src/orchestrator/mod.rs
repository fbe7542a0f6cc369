mod directory;
mod engine;
mod events;
mod handle;
mod media;
mod negotiation;
mod peer_orchestrator;
mod rtc_engine;

pub use directory::{NegotiationRole, SessionDirectory};
pub use engine::{
    Connectivity, DescriptionKind, EngineEvent, EngineEventSink, EngineFactory, NegotiationEngine,
    RemoteTrackInfo,
};
pub use events::{FailureReason, OrchestratorEvent, Phase};
pub use handle::OrchestratorHandle;
pub use media::{CaptureTrack, LocalMedia, LocalTrack, MediaSource, MediaTier, TrackKind};
pub use peer_orchestrator::{OrchestratorDeps, PeerOrchestrator};
pub use rtc_engine::{RtcEngine, RtcEngineFactory};
