use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;

use crate::error::MediaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

/// Capture quality, best first. Acquisition walks down [`MediaTier::LADDER`]
/// until one succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaTier {
    HdAudioVideo,
    SdAudioVideo,
    AudioOnly,
}

impl MediaTier {
    pub const LADDER: [MediaTier; 3] = [
        MediaTier::HdAudioVideo,
        MediaTier::SdAudioVideo,
        MediaTier::AudioOnly,
    ];

    /// Requested video size, or `None` for audio-only.
    pub fn video_resolution(&self) -> Option<(u32, u32)> {
        match self {
            MediaTier::HdAudioVideo => Some((1280, 720)),
            MediaTier::SdAudioVideo => Some((640, 480)),
            MediaTier::AudioOnly => None,
        }
    }
}

/// A live local capture track.
pub trait CaptureTrack: Send + Sync + Debug {
    fn id(&self) -> &str;
    fn kind(&self) -> TrackKind;
    /// Releases the device. Must tolerate repeated calls.
    fn stop(&self);
}

pub type LocalTrack = Arc<dyn CaptureTrack>;

/// Camera and microphone access.
#[async_trait]
pub trait MediaSource: Send + Sync + 'static {
    async fn acquire(&self, tier: MediaTier) -> Result<Vec<LocalTrack>, MediaError>;
}

/// Tracks currently owned by the orchestrator.
#[derive(Debug, Default, Clone)]
pub struct LocalMedia {
    /// Tier that succeeded, `None` when running receive-only.
    pub tier: Option<MediaTier>,
    pub tracks: Vec<LocalTrack>,
}

impl LocalMedia {
    pub fn receive_only() -> Self {
        Self::default()
    }

    pub fn has_video(&self) -> bool {
        self.tracks.iter().any(|t| t.kind() == TrackKind::Video)
    }

    pub fn stop_all(&mut self) {
        for track in self.tracks.drain(..) {
            debug!("Stopping local {:?} track {}", track.kind(), track.id());
            track.stop();
        }
        self.tier = None;
    }
}
