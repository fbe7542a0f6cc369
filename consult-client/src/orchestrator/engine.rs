use async_trait::async_trait;
use consult_core::{CandidatePayload, DescriptionPayload};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::EngineError;
use crate::orchestrator::media::{LocalTrack, TrackKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionKind {
    Offer,
    Answer,
}

/// Media-path state as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrackInfo {
    pub id: String,
    pub stream_id: String,
    pub kind: TrackKind,
}

/// What an engine reports back to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    LocalCandidate(CandidatePayload),
    RemoteTrack(RemoteTrackInfo),
    Connectivity(Connectivity),
    NegotiationNeeded,
}

/// Where an engine sends its events. Every event carries the generation
/// of the engine that produced it, so events from a replaced engine can
/// be told apart.
#[derive(Debug, Clone)]
pub struct EngineEventSink {
    generation: u64,
    tx: mpsc::UnboundedSender<(u64, EngineEvent)>,
}

impl EngineEventSink {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<(u64, EngineEvent)>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Dropped silently once the owner is gone.
    pub fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send((self.generation, event));
    }
}

/// One peer connection's offer/answer and ICE machinery.
#[async_trait]
pub trait NegotiationEngine: Send + Sync {
    async fn add_track(&self, track: &LocalTrack) -> Result<(), EngineError>;

    /// Creates an offer and applies it as the local description.
    async fn create_offer(&self) -> Result<DescriptionPayload, EngineError>;

    /// Creates an answer to the applied remote offer and applies it locally.
    async fn create_answer(&self) -> Result<DescriptionPayload, EngineError>;

    async fn set_remote_description(
        &self,
        kind: DescriptionKind,
        description: DescriptionPayload,
    ) -> Result<(), EngineError>;

    async fn add_ice_candidate(&self, candidate: CandidatePayload) -> Result<(), EngineError>;

    async fn close(&self) -> Result<(), EngineError>;
}

#[async_trait]
pub trait EngineFactory: Send + Sync + 'static {
    async fn create(
        &self,
        events: EngineEventSink,
    ) -> Result<Arc<dyn NegotiationEngine>, EngineError>;
}
