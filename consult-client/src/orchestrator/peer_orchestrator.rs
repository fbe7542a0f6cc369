use consult_core::{
    CandidatePayload, ParticipantId, SessionId, SessionLifecycle, SignalEnvelope, SignalKind,
};
use serde::Serialize;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info, warn};

use crate::config::OrchestratorConfig;
use crate::error::{ClientError, EngineError, MediaError};
use crate::fallback::first_success;
use crate::orchestrator::directory::{NegotiationRole, SessionDirectory};
use crate::orchestrator::engine::{
    Connectivity, DescriptionKind, EngineEvent, EngineEventSink, EngineFactory, NegotiationEngine,
};
use crate::orchestrator::events::{FailureReason, OrchestratorEvent, Phase};
use crate::orchestrator::handle::{Command, OrchestratorHandle};
use crate::orchestrator::media::{LocalMedia, LocalTrack, MediaSource, MediaTier};
use crate::orchestrator::negotiation::SignalingPhase;
use crate::signaling::SignalingClient;

/// Everything the orchestrator talks to.
pub struct OrchestratorDeps {
    pub signaling: SignalingClient,
    pub media: Arc<dyn MediaSource>,
    pub engines: Arc<dyn EngineFactory>,
    pub directory: Arc<dyn SessionDirectory>,
    pub lifecycle: Arc<dyn SessionLifecycle>,
}

#[derive(Debug)]
enum SignalingEvent {
    UserJoined(ParticipantId),
    UserLeft(ParticipantId),
    Signal(SignalEnvelope),
    Error(ClientError),
}

/// Drives one participant's side of a two-party call: media, the
/// negotiation engine, the relay connection and recovery. Runs as a single
/// task; commands, relay events, engine events and timers are handled one
/// at a time in arrival order.
pub struct PeerOrchestrator {
    session_id: SessionId,
    config: OrchestratorConfig,
    deps: OrchestratorDeps,

    phase_tx: watch::Sender<Phase>,
    events_tx: mpsc::UnboundedSender<OrchestratorEvent>,
    command_rx: mpsc::Receiver<Command>,
    engine_tx: mpsc::UnboundedSender<(u64, EngineEvent)>,
    engine_rx: mpsc::UnboundedReceiver<(u64, EngineEvent)>,
    signaling_tx: mpsc::UnboundedSender<(u64, SignalingEvent)>,
    signaling_rx: mpsc::UnboundedReceiver<(u64, SignalingEvent)>,

    me: Option<ParticipantId>,
    remote: Option<ParticipantId>,
    role: Option<NegotiationRole>,
    media: LocalMedia,
    engine: Option<Arc<dyn NegotiationEngine>>,
    engine_generation: u64,
    signaling_epoch: u64,
    negotiation: SignalingPhase,
    /// Candidates the engine refused while a description was in place.
    /// Retried on the next remote description.
    retry_candidates: VecDeque<CandidatePayload>,
    /// An offer that arrived mid-exchange, with the time it is applied
    /// regardless.
    deferred_offer: Option<(SignalEnvelope, Instant)>,
    renegotiate: bool,
    setup_deadline: Option<Instant>,
    recovery_at: Option<Instant>,
    recoveries: u32,
    session_started: bool,
    /// Commands that arrived while a setup step was pending.
    queued_commands: VecDeque<Command>,
    stopping: bool,
    shutdown_acks: Vec<oneshot::Sender<()>>,
}

impl PeerOrchestrator {
    /// Spawns the orchestrator for `session_id`. It stays idle until
    /// [`OrchestratorHandle::start`].
    pub fn spawn(
        session_id: SessionId,
        config: OrchestratorConfig,
        deps: OrchestratorDeps,
    ) -> (OrchestratorHandle, mpsc::UnboundedReceiver<OrchestratorEvent>) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (phase_tx, phase_rx) = watch::channel(Phase::Idle);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (engine_tx, engine_rx) = mpsc::unbounded_channel();
        let (signaling_tx, signaling_rx) = mpsc::unbounded_channel();

        let orchestrator = Self {
            session_id,
            config,
            deps,
            phase_tx,
            events_tx,
            command_rx,
            engine_tx,
            engine_rx,
            signaling_tx,
            signaling_rx,
            me: None,
            remote: None,
            role: None,
            media: LocalMedia::receive_only(),
            engine: None,
            engine_generation: 0,
            signaling_epoch: 0,
            negotiation: SignalingPhase::default(),
            retry_candidates: VecDeque::new(),
            deferred_offer: None,
            renegotiate: false,
            setup_deadline: None,
            recovery_at: None,
            recoveries: 0,
            session_started: false,
            queued_commands: VecDeque::new(),
            stopping: false,
            shutdown_acks: Vec::new(),
        };

        tokio::spawn(orchestrator.run());
        (OrchestratorHandle::new(command_tx, phase_rx), events_rx)
    }

    async fn run(mut self) {
        info!("Orchestrator for {} running", self.session_id);

        loop {
            if self.stopping {
                self.teardown().await;
                for ack in self.shutdown_acks.drain(..) {
                    let _ = ack.send(());
                }
                break;
            }
            if let Some(cmd) = self.queued_commands.pop_front() {
                self.handle_command(cmd).await;
                continue;
            }

            let setup_deadline = self.setup_deadline;
            let recovery_at = self.recovery_at;
            let offer_due = self.deferred_offer.as_ref().map(|(_, at)| *at);

            tokio::select! {
                cmd = self.command_rx.recv() => {
                    if let Some(cmd) = self.take_stop(cmd) {
                        self.handle_command(cmd).await;
                    }
                }

                Some((generation, event)) = self.engine_rx.recv() => {
                    if generation == self.engine_generation && self.engine.is_some() {
                        self.handle_engine_event(event).await;
                    } else {
                        debug!("Ignoring {:?} from retired engine {}", event, generation);
                    }
                }

                Some((epoch, event)) = self.signaling_rx.recv() => {
                    if epoch == self.signaling_epoch {
                        self.handle_signaling_event(event).await;
                    } else {
                        debug!("Ignoring {:?} from an earlier relay connection", event);
                    }
                }

                _ = sleep_until_some(setup_deadline) => self.on_setup_timeout(),

                _ = sleep_until_some(recovery_at) => {
                    self.recovery_at = None;
                    info!("Rebuilding call in {}", self.session_id);
                    self.setup().await;
                }

                _ = sleep_until_some(offer_due) => self.apply_deferred_offer().await,
            }
        }

        info!("Orchestrator for {} stopped", self.session_id);
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Start => {
                if self.phase() == Phase::Idle {
                    self.setup().await;
                } else {
                    debug!("Start ignored in {:?}", self.phase());
                }
            }
            Command::AddTrack(track) => self.add_track(track).await,
            Command::Retry => {
                if self.phase().is_failed() {
                    info!("Retrying call in {}", self.session_id);
                    self.recoveries = 0;
                    self.teardown_call().await;
                    self.setup().await;
                } else {
                    debug!("Retry ignored in {:?}", self.phase());
                }
            }
            // Handled by the run loop.
            Command::Shutdown(_) => {}
        }
    }

    /// Records a shutdown, or the last handle going away. Any other
    /// command is handed back.
    fn take_stop(&mut self, cmd: Option<Command>) -> Option<Command> {
        match cmd {
            Some(Command::Shutdown(ack)) => {
                self.stopping = true;
                self.shutdown_acks.push(ack);
                None
            }
            None => {
                self.stopping = true;
                None
            }
            Some(cmd) => Some(cmd),
        }
    }

    /// Awaits `step` while still taking commands. `None` if a stop was
    /// requested first; the step is dropped unfinished. Other commands
    /// are queued for the run loop.
    async fn interruptible<T>(&mut self, step: impl Future<Output = T>) -> Option<T> {
        tokio::pin!(step);
        loop {
            tokio::select! {
                out = &mut step => return Some(out),
                cmd = self.command_rx.recv() => {
                    if let Some(cmd) = self.take_stop(cmd) {
                        self.queued_commands.push_back(cmd);
                    }
                    if self.stopping {
                        debug!("Setup step in {} abandoned", self.session_id);
                        return None;
                    }
                }
            }
        }
    }

    async fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::LocalCandidate(candidate) => {
                self.send_signal(SignalKind::Candidate, &candidate).await;
            }
            EngineEvent::RemoteTrack(track) => {
                info!("Remote {:?} track {} arrived", track.kind, track.id);
                self.emit(OrchestratorEvent::RemoteTrack(track));
            }
            EngineEvent::NegotiationNeeded => {
                if self.negotiation.is_pristine() {
                    debug!("Negotiation needed before the first offer, ignoring");
                } else if self.negotiation.is_stable() && self.remote.is_some() {
                    info!("Renegotiating with {:?}", self.remote);
                    self.send_offer().await;
                } else {
                    debug!("Negotiation needed mid-exchange, queued");
                    self.renegotiate = true;
                }
            }
            EngineEvent::Connectivity(state) => self.on_connectivity(state).await,
        }
    }

    async fn handle_signaling_event(&mut self, event: SignalingEvent) {
        match event {
            SignalingEvent::UserJoined(participant) => self.on_peer_joined(participant).await,
            SignalingEvent::UserLeft(participant) => self.on_peer_left(participant).await,
            SignalingEvent::Signal(envelope) => self.on_signal(envelope).await,
            SignalingEvent::Error(err) => {
                warn!("Relay reported: {}", err);
                self.emit(OrchestratorEvent::SignalingError(err));
            }
        }
    }

    /// Acquiring media, then negotiating: engine, relay join, role, and
    /// the first offer if it is ours to send.
    async fn setup(&mut self) {
        self.set_phase(Phase::AcquiringMedia);
        let capturing = capture(self.deps.media.clone(), self.config.media_ladder.clone());
        let Some(captured) = self.interruptible(capturing).await else {
            return;
        };
        self.media = self.adopt_media(captured);

        self.set_phase(Phase::Negotiating);
        self.setup_deadline = Some(Instant::now() + self.config.setup_timeout);

        if let Err(e) = self.build_engine().await {
            error!("Negotiation engine unavailable: {}", e);
            self.fail(FailureReason::EngineUnavailable(e.to_string()))
                .await;
            return;
        }

        self.register_signaling_handlers();
        let client = self.deps.signaling.clone();
        let session_id = self.session_id.clone();
        let connect = async move { client.connect(&session_id).await };
        let Some(joined) = self.interruptible(connect).await else {
            return;
        };
        let ack = match joined {
            Ok(ack) => ack,
            Err(e) => {
                self.fail(FailureReason::Signaling(e)).await;
                return;
            }
        };

        self.me = Some(ack.participant_id.clone());
        self.remote = ack.peers.first().cloned();

        let role = match self.role {
            Some(role) => role,
            None => {
                let directory = self.deps.directory.clone();
                let session_id = self.session_id.clone();
                let me = ack.participant_id.clone();
                let lookup = async move { directory.role_for(&session_id, &me).await };
                let Some(lookup) = self.interruptible(lookup).await else {
                    return;
                };
                match lookup {
                    Ok(role) => {
                        self.role = Some(role);
                        role
                    }
                    Err(e) => {
                        self.fail(FailureReason::RoleLookup(e.to_string())).await;
                        return;
                    }
                }
            }
        };

        info!(
            "{} is {:?} in {} ({} member(s))",
            ack.participant_id, role, self.session_id, ack.members
        );

        if role == NegotiationRole::Initiator && self.remote.is_some() {
            self.send_offer().await;
        }
    }

    fn adopt_media(&self, captured: Captured) -> LocalMedia {
        let preferred = self.config.media_ladder.first().copied();
        match captured {
            Ok((tier, tracks)) => {
                info!("Captured {} local track(s) at {:?}", tracks.len(), tier);
                if Some(tier) != preferred {
                    self.emit(OrchestratorEvent::MediaDegraded { tier });
                }
                LocalMedia {
                    tier: Some(tier),
                    tracks,
                }
            }
            Err(failures) => {
                warn!(
                    "No capture tier available ({} failures), continuing receive-only",
                    failures.len()
                );
                self.emit(OrchestratorEvent::MediaDenied);
                LocalMedia::receive_only()
            }
        }
    }

    /// Points the client's handlers at this orchestrator under a fresh
    /// epoch.
    fn register_signaling_handlers(&mut self) {
        self.signaling_epoch += 1;
        let epoch = self.signaling_epoch;
        let client = &self.deps.signaling;

        let tx = self.signaling_tx.clone();
        client.on_user_joined(move |p| {
            let _ = tx.send((epoch, SignalingEvent::UserJoined(p)));
        });
        let tx = self.signaling_tx.clone();
        client.on_user_left(move |p| {
            let _ = tx.send((epoch, SignalingEvent::UserLeft(p)));
        });
        let tx = self.signaling_tx.clone();
        client.on_signal(move |envelope| {
            let _ = tx.send((epoch, SignalingEvent::Signal(envelope)));
        });
        let tx = self.signaling_tx.clone();
        client.on_error(move |err| {
            let _ = tx.send((epoch, SignalingEvent::Error(err)));
        });
    }

    /// Replaces the engine with a fresh one carrying the current tracks.
    async fn build_engine(&mut self) -> Result<(), EngineError> {
        self.close_engine().await;

        self.engine_generation += 1;
        let sink = EngineEventSink::new(self.engine_generation, self.engine_tx.clone());
        let engine = self.deps.engines.create(sink).await?;

        for track in &self.media.tracks {
            if let Err(e) = engine.add_track(track).await {
                let _ = engine.close().await;
                return Err(e);
            }
        }

        debug!(
            "Engine {} ready with {} track(s)",
            self.engine_generation,
            self.media.tracks.len()
        );
        self.engine = Some(engine);
        Ok(())
    }

    async fn close_engine(&mut self) {
        if let Some(engine) = self.engine.take() {
            if let Err(e) = engine.close().await {
                warn!("Error closing engine: {}", e);
            }
        }
        self.negotiation = SignalingPhase::default();
        self.retry_candidates.clear();
        self.deferred_offer = None;
        self.renegotiate = false;
    }

    async fn add_track(&mut self, track: LocalTrack) {
        info!("Adding local {:?} track {}", track.kind(), track.id());
        self.media.tracks.push(track.clone());

        if let Some(engine) = self.engine.clone() {
            if let Err(e) = engine.add_track(&track).await {
                self.negotiation_failed(format!("could not add track: {e}"));
            }
        }
    }

    async fn on_peer_joined(&mut self, participant: ParticipantId) {
        if self.me.as_ref() == Some(&participant) {
            return;
        }
        info!("{} joined {}", participant, self.session_id);
        self.emit(OrchestratorEvent::PeerJoined(participant.clone()));

        if self.engine.is_none() {
            self.remote = Some(participant);
            return;
        }

        // A returning peer starts from a clean engine.
        if !self.negotiation.is_pristine() || self.phase() == Phase::Connected {
            if !self.restart_negotiation().await {
                return;
            }
        }

        self.remote = Some(participant);
        if self.role == Some(NegotiationRole::Initiator) {
            self.send_offer().await;
        }
    }

    async fn on_peer_left(&mut self, participant: ParticipantId) {
        if self.remote.as_ref() != Some(&participant) {
            debug!("{} left, not our peer", participant);
            return;
        }
        info!("Peer {} left {}", participant, self.session_id);
        self.remote = None;
        self.emit(OrchestratorEvent::PeerLeft(participant));

        if self.engine.is_some() {
            self.restart_negotiation().await;
        }
    }

    /// New engine, same media, back to negotiating. False if the engine
    /// could not be rebuilt.
    async fn restart_negotiation(&mut self) -> bool {
        if let Err(e) = self.build_engine().await {
            error!("Negotiation engine unavailable: {}", e);
            self.fail(FailureReason::EngineUnavailable(e.to_string()))
                .await;
            return false;
        }
        if self.phase() != Phase::Negotiating {
            self.set_phase(Phase::Negotiating);
            self.setup_deadline = Some(Instant::now() + self.config.setup_timeout);
        }
        true
    }

    async fn on_signal(&mut self, envelope: SignalEnvelope) {
        if envelope.session_id != self.session_id || self.me.as_ref() == Some(&envelope.sender_id)
        {
            debug!("Dropping foreign {:?} envelope", envelope.kind);
            return;
        }
        if self.engine.is_none() {
            debug!("No engine, dropping {:?} from {}", envelope.kind, envelope.sender_id);
            return;
        }

        match envelope.kind {
            SignalKind::Offer => {
                if self.negotiation.exchange_in_flight() {
                    debug!(
                        "Offer from {} arrived mid-exchange, deferring",
                        envelope.sender_id
                    );
                    let due = Instant::now() + self.config.stability_wait;
                    self.deferred_offer = Some((envelope, due));
                } else {
                    self.apply_offer(envelope).await;
                }
            }
            SignalKind::Answer => self.apply_answer(envelope).await,
            SignalKind::Candidate => self.on_remote_candidate(envelope).await,
        }
    }

    async fn apply_offer(&mut self, envelope: SignalEnvelope) {
        let Some(engine) = self.engine.clone() else {
            return;
        };
        let description = match envelope.description() {
            Ok(description) => description,
            Err(e) => {
                self.negotiation_failed(format!("malformed offer from {}: {e}", envelope.sender_id));
                return;
            }
        };

        self.remote = Some(envelope.sender_id.clone());

        if let Err(e) = engine
            .set_remote_description(DescriptionKind::Offer, description)
            .await
        {
            self.negotiation_failed(format!("could not apply offer: {e}"));
            return;
        }
        let buffered = self.negotiation.remote_applied();
        self.drain_candidates(engine.as_ref(), buffered).await;

        match engine.create_answer().await {
            Ok(answer) => {
                debug!("Answering offer from {}", envelope.sender_id);
                self.send_signal(SignalKind::Answer, &answer).await;
                self.settled().await;
            }
            Err(e) => self.negotiation_failed(format!("could not create answer: {e}")),
        }
    }

    async fn apply_answer(&mut self, envelope: SignalEnvelope) {
        let Some(engine) = self.engine.clone() else {
            return;
        };
        if !self.negotiation.exchange_in_flight() {
            debug!("Answer from {} without an offer in flight", envelope.sender_id);
        }
        let description = match envelope.description() {
            Ok(description) => description,
            Err(e) => {
                self.negotiation_failed(format!("malformed answer from {}: {e}", envelope.sender_id));
                return;
            }
        };

        if let Err(e) = engine
            .set_remote_description(DescriptionKind::Answer, description)
            .await
        {
            self.negotiation_failed(format!("could not apply answer: {e}"));
            return;
        }
        let buffered = self.negotiation.remote_applied();
        self.drain_candidates(engine.as_ref(), buffered).await;
        self.settled().await;
    }

    async fn on_remote_candidate(&mut self, envelope: SignalEnvelope) {
        let candidate = match envelope.candidate() {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!("Skipping malformed candidate from {}: {}", envelope.sender_id, e);
                return;
            }
        };

        let Some(candidate) = self.negotiation.buffer(candidate) else {
            debug!(
                "Buffered remote candidate, {} waiting for a description",
                self.negotiation.buffered()
            );
            return;
        };

        let Some(engine) = self.engine.clone() else {
            return;
        };
        if let Err(e) = engine.add_ice_candidate(candidate.clone()).await {
            warn!("Candidate rejected, keeping it for the next description: {}", e);
            self.retry_candidates.push_back(candidate);
        }
    }

    /// Applies earlier rejects, then `buffered`, oldest first. Failures are
    /// logged and skipped.
    async fn drain_candidates(
        &mut self,
        engine: &dyn NegotiationEngine,
        buffered: VecDeque<CandidatePayload>,
    ) {
        let queued: Vec<CandidatePayload> =
            self.retry_candidates.drain(..).chain(buffered).collect();
        if queued.is_empty() {
            return;
        }

        debug!("Applying {} queued remote candidate(s)", queued.len());
        for candidate in queued {
            if let Err(e) = engine.add_ice_candidate(candidate).await {
                warn!("Skipping queued candidate: {}", e);
            }
        }
    }

    async fn settled(&mut self) {
        self.negotiation.settle();

        // Picked up by the run loop straight away.
        if let Some((_, due)) = &mut self.deferred_offer {
            *due = Instant::now();
            return;
        }

        if std::mem::take(&mut self.renegotiate) && self.remote.is_some() {
            info!("Running queued renegotiation");
            self.send_offer().await;
        }
    }

    async fn apply_deferred_offer(&mut self) {
        let Some((envelope, _)) = self.deferred_offer.take() else {
            return;
        };
        if self.negotiation.exchange_in_flight() {
            warn!(
                "Exchange still in flight after {:?}, applying offer from {} anyway",
                self.config.stability_wait, envelope.sender_id
            );
        }
        self.apply_offer(envelope).await;
    }

    async fn send_offer(&mut self) {
        let Some(engine) = self.engine.clone() else {
            return;
        };
        match engine.create_offer().await {
            Ok(offer) => {
                self.negotiation.offer_sent();
                debug!("Sending offer to {:?}", self.remote);
                self.send_signal(SignalKind::Offer, &offer).await;
            }
            Err(e) => self.negotiation_failed(format!("could not create offer: {e}")),
        }
    }

    async fn send_signal(&mut self, kind: SignalKind, payload: &impl Serialize) {
        let payload = match serde_json::to_value(payload) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Could not encode {:?} payload: {}", kind, e);
                return;
            }
        };

        let target = self.remote.clone();
        if let Err(e) = self.deps.signaling.send_signal(kind, payload, target).await {
            warn!("Could not send {:?}: {}", kind, e);
            self.emit(OrchestratorEvent::SignalingError(e));
        }
    }

    async fn on_connectivity(&mut self, state: Connectivity) {
        match state {
            Connectivity::Connected => {
                self.setup_deadline = None;
                self.set_phase(Phase::Connected);
                if !self.session_started {
                    self.session_started = true;
                    self.deps
                        .lifecycle
                        .on_session_started(&self.session_id)
                        .await;
                }
            }
            Connectivity::Disconnected | Connectivity::Failed => {
                if matches!(self.phase(), Phase::Connected | Phase::Negotiating) {
                    self.network_lost(state).await;
                }
            }
            other => debug!("Media path {:?}", other),
        }
    }

    async fn network_lost(&mut self, state: Connectivity) {
        warn!("Media path {:?} in {}", state, self.session_id);

        if self.recoveries >= self.config.max_recoveries {
            error!("Recovery already used up for {}", self.session_id);
            self.emit(OrchestratorEvent::RecoveryExhausted);
            self.fail(FailureReason::RecoveryExhausted).await;
            return;
        }

        self.recoveries += 1;
        info!(
            "Recovering call in {} (attempt {})",
            self.session_id, self.recoveries
        );
        self.emit(OrchestratorEvent::RecoveryStarted {
            attempt: self.recoveries,
        });
        self.set_phase(Phase::Recovering);
        self.teardown_call().await;
        self.recovery_at = Some(Instant::now() + self.config.recovery_delay);
    }

    fn on_setup_timeout(&mut self) {
        self.setup_deadline = None;
        if self.phase() != Phase::Connected {
            warn!(
                "Still not connected in {} after {:?}",
                self.session_id, self.config.setup_timeout
            );
            self.emit(OrchestratorEvent::SlowSetup);
        }
    }

    fn negotiation_failed(&mut self, reason: String) {
        warn!("Negotiation step failed: {}", reason);
        self.emit(OrchestratorEvent::NegotiationFailed(reason));
    }

    /// Drops engine and media but keeps the relay connection.
    async fn fail(&mut self, reason: FailureReason) {
        self.close_engine().await;
        self.media.stop_all();
        self.setup_deadline = None;
        self.set_phase(Phase::Failed(reason));
    }

    async fn teardown_call(&mut self) {
        self.close_engine().await;
        self.media.stop_all();
        self.deps.signaling.disconnect().await;
        self.signaling_epoch += 1;
        self.remote = None;
        self.setup_deadline = None;
    }

    async fn teardown(&mut self) {
        self.teardown_call().await;
        self.recovery_at = None;

        if std::mem::take(&mut self.session_started) {
            self.deps.lifecycle.on_session_ended(&self.session_id).await;
        }
        self.set_phase(Phase::Idle);
    }

    fn phase(&self) -> Phase {
        self.phase_tx.borrow().clone()
    }

    fn set_phase(&mut self, phase: Phase) {
        let previous = self.phase();
        if previous == phase {
            return;
        }
        info!("{}: {:?} -> {:?}", self.session_id, previous, phase);
        self.phase_tx.send_replace(phase.clone());
        self.emit(OrchestratorEvent::PhaseChanged(phase));
    }

    fn emit(&self, event: OrchestratorEvent) {
        let _ = self.events_tx.send(event);
    }
}

type Captured = Result<(MediaTier, Vec<LocalTrack>), Vec<MediaError>>;

/// Walks `ladder` until a tier can be captured.
async fn capture(source: Arc<dyn MediaSource>, ladder: Vec<MediaTier>) -> Captured {
    first_success(ladder, Duration::ZERO, |tier| {
        let source = source.clone();
        async move { source.acquire(tier).await }
    })
    .await
}

async fn sleep_until_some(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
