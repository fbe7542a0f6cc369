use async_trait::async_trait;
use consult_client::MediaError;
use consult_client::orchestrator::{CaptureTrack, LocalTrack, MediaSource, MediaTier, TrackKind};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

static NEXT_TRACK: AtomicUsize = AtomicUsize::new(1);

#[derive(Debug)]
pub struct MockTrack {
    id: String,
    kind: TrackKind,
    stopped: AtomicBool,
}

impl MockTrack {
    pub fn new(kind: TrackKind) -> Arc<Self> {
        let n = NEXT_TRACK.fetch_add(1, Ordering::SeqCst);
        Arc::new(Self {
            id: format!("{kind:?}-{n}").to_lowercase(),
            kind,
            stopped: AtomicBool::new(false),
        })
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl CaptureTrack for MockTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Hands out mock tracks, refusing the tiers it was told to refuse.
#[derive(Default)]
pub struct MockMediaSource {
    refused: HashSet<MediaTier>,
    /// A device prompt nobody answers.
    stalled: bool,
    attempts: Mutex<Vec<MediaTier>>,
    issued: Mutex<Vec<Arc<MockTrack>>>,
}

impl MockMediaSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn refusing(tiers: &[MediaTier]) -> Arc<Self> {
        Arc::new(Self {
            refused: tiers.iter().copied().collect(),
            ..Self::default()
        })
    }

    pub fn stalled() -> Arc<Self> {
        Arc::new(Self {
            stalled: true,
            ..Self::default()
        })
    }

    pub fn attempts(&self) -> Vec<MediaTier> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn issued(&self) -> Vec<Arc<MockTrack>> {
        self.issued.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaSource for MockMediaSource {
    async fn acquire(&self, tier: MediaTier) -> Result<Vec<LocalTrack>, MediaError> {
        self.attempts.lock().unwrap().push(tier);
        if self.stalled {
            std::future::pending::<()>().await;
        }

        if self.refused.contains(&tier) {
            return Err(if tier == MediaTier::AudioOnly {
                MediaError::Denied("microphone blocked".to_owned())
            } else {
                MediaError::Unavailable {
                    tier,
                    reason: "camera busy".to_owned(),
                }
            });
        }

        let mut tracks = vec![MockTrack::new(TrackKind::Audio)];
        if tier.video_resolution().is_some() {
            tracks.push(MockTrack::new(TrackKind::Video));
        }

        self.issued.lock().unwrap().extend(tracks.iter().cloned());
        Ok(tracks.into_iter().map(|t| t as LocalTrack).collect())
    }
}
