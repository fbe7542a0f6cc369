use async_trait::async_trait;
use consult_core::{CandidatePayload, DescriptionPayload};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

use crate::config::TransportConfig;
use crate::error::EngineError;
use crate::orchestrator::engine::{
    Connectivity, DescriptionKind, EngineEvent, EngineEventSink, EngineFactory, NegotiationEngine,
    RemoteTrackInfo,
};
use crate::orchestrator::media::{LocalTrack, TrackKind};

/// Builds [`RtcEngine`]s from one transport configuration.
#[derive(Debug, Clone, Default)]
pub struct RtcEngineFactory {
    config: TransportConfig,
}

impl RtcEngineFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EngineFactory for RtcEngineFactory {
    async fn create(
        &self,
        events: EngineEventSink,
    ) -> Result<Arc<dyn NegotiationEngine>, EngineError> {
        let engine = RtcEngine::new(&self.config, events)
            .await
            .map_err(|e| EngineError::Construction(e.to_string()))?;
        Ok(Arc::new(engine))
    }
}

/// A webrtc peer connection behind [`NegotiationEngine`].
pub struct RtcEngine {
    peer_connection: Arc<RTCPeerConnection>,
    /// Outgoing tracks, by capture track id. The capture pipeline writes
    /// samples into these.
    local_tracks: Mutex<Vec<(String, Arc<TrackLocalStaticSample>)>>,
}

impl RtcEngine {
    pub async fn new(config: &TransportConfig, events: EngineEventSink) -> Result<Self, EngineError> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);
        let generation = events.generation();

        let state_events = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let events = state_events.clone();
                Box::pin(async move {
                    info!("Engine {} peer connection state: {:?}", generation, s);
                    let state = match s {
                        RTCPeerConnectionState::New => Connectivity::New,
                        RTCPeerConnectionState::Connecting => Connectivity::Connecting,
                        RTCPeerConnectionState::Connected => Connectivity::Connected,
                        RTCPeerConnectionState::Disconnected => Connectivity::Disconnected,
                        RTCPeerConnectionState::Failed => Connectivity::Failed,
                        RTCPeerConnectionState::Closed => Connectivity::Closed,
                        RTCPeerConnectionState::Unspecified => return,
                    };
                    events.emit(EngineEvent::Connectivity(state));
                })
            },
        ));

        let ice_events = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let events = ice_events.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let init = match candidate.to_json() {
                    Ok(init) => init,
                    Err(e) => {
                        warn!("Could not serialize local candidate: {}", e);
                        return;
                    }
                };
                events.emit(EngineEvent::LocalCandidate(CandidatePayload {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                    username_fragment: init.username_fragment,
                }));
            })
        }));

        let track_events = events.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let events = track_events.clone();
                Box::pin(async move {
                    let kind = match track.kind() {
                        RTPCodecType::Audio => TrackKind::Audio,
                        RTPCodecType::Video => TrackKind::Video,
                        RTPCodecType::Unspecified => return,
                    };
                    debug!("Remote {:?} track {} on engine {}", kind, track.id(), generation);
                    events.emit(EngineEvent::RemoteTrack(RemoteTrackInfo {
                        id: track.id(),
                        stream_id: track.stream_id(),
                        kind,
                    }));
                })
            },
        ));

        let negotiation_events = events;
        peer_connection.on_negotiation_needed(Box::new(move || {
            let events = negotiation_events.clone();
            Box::pin(async move {
                events.emit(EngineEvent::NegotiationNeeded);
            })
        }));

        Ok(Self {
            peer_connection,
            local_tracks: Mutex::new(Vec::new()),
        })
    }

    /// The outgoing sample track fed by capture track `id`.
    pub async fn sample_track(&self, id: &str) -> Option<Arc<TrackLocalStaticSample>> {
        self.local_tracks
            .lock()
            .await
            .iter()
            .find(|(track_id, _)| track_id == id)
            .map(|(_, track)| track.clone())
    }
}

#[async_trait]
impl NegotiationEngine for RtcEngine {
    async fn add_track(&self, track: &LocalTrack) -> Result<(), EngineError> {
        let mime_type = match track.kind() {
            TrackKind::Audio => MIME_TYPE_OPUS,
            TrackKind::Video => MIME_TYPE_VP8,
        };

        let sample_track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: mime_type.to_owned(),
                ..Default::default()
            },
            track.id().to_owned(),
            "consult".to_owned(),
        ));

        self.peer_connection
            .add_track(Arc::clone(&sample_track) as Arc<dyn TrackLocal + Send + Sync>)
            .await?;

        self.local_tracks
            .lock()
            .await
            .push((track.id().to_owned(), sample_track));
        Ok(())
    }

    async fn create_offer(&self) -> Result<DescriptionPayload, EngineError> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(DescriptionPayload { sdp: offer.sdp })
    }

    async fn create_answer(&self) -> Result<DescriptionPayload, EngineError> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(DescriptionPayload { sdp: answer.sdp })
    }

    async fn set_remote_description(
        &self,
        kind: DescriptionKind,
        description: DescriptionPayload,
    ) -> Result<(), EngineError> {
        let description = match kind {
            DescriptionKind::Offer => RTCSessionDescription::offer(description.sdp),
            DescriptionKind::Answer => RTCSessionDescription::answer(description.sdp),
        }
        .map_err(|e| EngineError::InvalidDescription(e.to_string()))?;

        self.peer_connection
            .set_remote_description(description)
            .await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: CandidatePayload) -> Result<(), EngineError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .map_err(|e| EngineError::InvalidCandidate(e.to_string()))
    }

    async fn close(&self) -> Result<(), EngineError> {
        self.peer_connection.close().await?;
        Ok(())
    }
}
