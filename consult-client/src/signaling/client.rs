use consult_core::{
    ClientMessage, IceServerConfig, ParticipantId, ServerMessage, SessionId, SignalEnvelope,
    SignalKind,
};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::sync::{Arc, RwLock};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout, timeout_at};
use tracing::{debug, info, warn};

use crate::config::SignalingClientConfig;
use crate::error::ClientError;
use crate::fallback::first_success;
use crate::signaling::connector::{Connector, TaskGuard, TransportLink};
use crate::signaling::handlers::{self, EventHandlers, SharedHandlers};
use crate::signaling::identity::IdentityProvider;

/// What the relay reported when the join completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinAck {
    pub session_id: SessionId,
    pub participant_id: ParticipantId,
    pub members: usize,
    /// Members other than us at join time.
    pub peers: Vec<ParticipantId>,
}

type PendingConnect = Shared<BoxFuture<'static, Result<JoinAck, ClientError>>>;

struct ActiveLink {
    outbound: mpsc::UnboundedSender<ClientMessage>,
    reader: JoinHandle<()>,
    _guard: TaskGuard,
}

impl ActiveLink {
    fn is_alive(&self) -> bool {
        !self.outbound.is_closed() && !self.reader.is_finished()
    }
}

impl Drop for ActiveLink {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// A transport whose join succeeded but is not installed yet. `backlog`
/// holds relay messages that arrived before the ack.
struct JoinedLink {
    outbound: mpsc::UnboundedSender<ClientMessage>,
    inbound: mpsc::UnboundedReceiver<ServerMessage>,
    guard: TaskGuard,
    backlog: Vec<ServerMessage>,
    ice_servers: Vec<IceServerConfig>,
}

#[derive(Default)]
struct ClientState {
    /// Bumped whenever the current link or pending attempt is abandoned.
    epoch: u64,
    link: Option<ActiveLink>,
    joined: Option<JoinAck>,
    pending: Option<(SessionId, PendingConnect)>,
    ice_servers: Vec<IceServerConfig>,
}

impl ClientState {
    fn current_for(&self, session_id: &SessionId) -> Option<JoinAck> {
        let link = self.link.as_ref()?;
        let joined = self.joined.as_ref()?;
        (link.is_alive() && &joined.session_id == session_id).then(|| joined.clone())
    }

    fn reset(&mut self) {
        self.epoch += 1;
        self.link = None;
        self.joined = None;
        self.pending = None;
    }
}

struct ClientInner {
    connector: Arc<dyn Connector>,
    identity: Arc<dyn IdentityProvider>,
    config: SignalingClientConfig,
    state: Mutex<ClientState>,
    handlers: SharedHandlers,
}

/// One participant's connection to the relay. Clones share the connection.
#[derive(Clone)]
pub struct SignalingClient {
    inner: Arc<ClientInner>,
}

impl SignalingClient {
    pub fn new(
        connector: Arc<dyn Connector>,
        identity: Arc<dyn IdentityProvider>,
        config: SignalingClientConfig,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                connector,
                identity,
                config,
                state: Mutex::new(ClientState::default()),
                handlers: Arc::new(RwLock::new(EventHandlers::default())),
            }),
        }
    }

    /// Joins `session_id`. Already joined to it: returns at once. A join to
    /// it in flight: waits for that attempt instead of opening another
    /// transport. Joined elsewhere: tears that connection down first.
    pub async fn connect(&self, session_id: &SessionId) -> Result<JoinAck, ClientError> {
        let mut state = self.inner.state.lock().await;

        if let Some(ack) = state.current_for(session_id) {
            debug!("Already connected to {}", session_id);
            return Ok(ack);
        }

        let in_flight = state
            .pending
            .as_ref()
            .filter(|(pending_session, _)| pending_session == session_id)
            .map(|(_, pending)| pending.clone());

        if let Some(pending) = in_flight {
            drop(state);
            debug!("Joining in-flight connect to {}", session_id);
            return pending.await;
        }

        if state.link.is_some() || state.pending.is_some() {
            info!("Leaving current session to connect to {}", session_id);
        }
        state.reset();

        let attempt = Self::establish(self.inner.clone(), session_id.clone(), state.epoch)
            .boxed()
            .shared();
        state.pending = Some((session_id.clone(), attempt.clone()));
        drop(state);

        attempt.await
    }

    /// Sends one negotiation message through the relay. `target` of `None`
    /// reaches every other member.
    pub async fn send_signal(
        &self,
        kind: SignalKind,
        payload: Value,
        target: Option<ParticipantId>,
    ) -> Result<(), ClientError> {
        let state = self.inner.state.lock().await;
        let (Some(link), Some(joined)) = (&state.link, &state.joined) else {
            return Err(ClientError::NotConnected);
        };

        let envelope = SignalEnvelope::new(
            kind,
            joined.session_id.clone(),
            joined.participant_id.clone(),
            target,
            payload,
        );

        link.outbound
            .send(ClientMessage::Signal(envelope))
            .map_err(|_| ClientError::NotConnected)
    }

    /// Drops every handler and closes the transport. Safe to call any
    /// number of times.
    pub async fn disconnect(&self) {
        match self.inner.handlers.write() {
            Ok(mut handlers) => *handlers = EventHandlers::default(),
            Err(poisoned) => *poisoned.into_inner() = EventHandlers::default(),
        }

        let mut state = self.inner.state.lock().await;
        if let Some(joined) = &state.joined {
            info!(
                "{} disconnecting from {}",
                joined.participant_id, joined.session_id
            );
        }
        state.reset();
    }

    pub async fn is_connected(&self) -> bool {
        let state = self.inner.state.lock().await;
        state.joined.is_some() && state.link.as_ref().is_some_and(ActiveLink::is_alive)
    }

    /// The current join, if any.
    pub async fn session(&self) -> Option<JoinAck> {
        self.inner.state.lock().await.joined.clone()
    }

    pub async fn session_id(&self) -> Option<SessionId> {
        self.session().await.map(|ack| ack.session_id)
    }

    pub async fn participant_id(&self) -> Option<ParticipantId> {
        self.session().await.map(|ack| ack.participant_id)
    }

    /// ICE servers advertised by the relay on the last successful connect.
    pub async fn ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.state.lock().await.ice_servers.clone()
    }

    pub fn on_user_joined(&self, f: impl Fn(ParticipantId) + Send + Sync + 'static) {
        self.set_handlers(|h| h.user_joined = Some(Arc::new(f)));
    }

    pub fn on_user_left(&self, f: impl Fn(ParticipantId) + Send + Sync + 'static) {
        self.set_handlers(|h| h.user_left = Some(Arc::new(f)));
    }

    pub fn on_signal(&self, f: impl Fn(SignalEnvelope) + Send + Sync + 'static) {
        self.set_handlers(|h| h.signal = Some(Arc::new(f)));
    }

    pub fn on_error(&self, f: impl Fn(ClientError) + Send + Sync + 'static) {
        self.set_handlers(|h| h.error = Some(Arc::new(f)));
    }

    fn set_handlers(&self, update: impl FnOnce(&mut EventHandlers)) {
        match self.inner.handlers.write() {
            Ok(mut handlers) => update(&mut handlers),
            Err(poisoned) => update(&mut poisoned.into_inner()),
        }
    }

    async fn establish(
        inner: Arc<ClientInner>,
        session_id: SessionId,
        epoch: u64,
    ) -> Result<JoinAck, ClientError> {
        let result = Self::open_and_join(&inner, &session_id).await;

        let mut state = inner.state.lock().await;
        if state.epoch != epoch {
            debug!("Connect to {} was overtaken, dropping it", session_id);
            return Err(ClientError::Cancelled);
        }
        state.pending = None;

        let (ack, joined) = result.inspect_err(|e| {
            warn!("Failed to connect to {}: {}", session_id, e);
        })?;

        let JoinedLink {
            outbound,
            mut inbound,
            guard,
            backlog,
            ice_servers,
        } = joined;

        let handlers = inner.handlers.clone();
        let reader = tokio::spawn(async move {
            for msg in backlog {
                handlers::dispatch(&handlers, msg);
            }
            while let Some(msg) = inbound.recv().await {
                handlers::dispatch(&handlers, msg);
            }
            warn!("Relay connection lost");
            handlers::report(&handlers, ClientError::ConnectionLost);
        });

        info!(
            "{} joined {} ({} members)",
            ack.participant_id, ack.session_id, ack.members
        );

        state.link = Some(ActiveLink {
            outbound,
            reader,
            _guard: guard,
        });
        state.joined = Some(ack.clone());
        state.ice_servers = ice_servers;

        Ok(ack)
    }

    async fn open_and_join(
        inner: &ClientInner,
        session_id: &SessionId,
    ) -> Result<(JoinAck, JoinedLink), ClientError> {
        let participant = inner
            .identity
            .identity_for(session_id)
            .await
            .ok_or(ClientError::AuthRequired)?;

        let config = &inner.config;
        let connector = &inner.connector;

        let (_, link) = first_success(
            1..=config.max_attempts.max(1),
            config.retry_backoff,
            |attempt| async move {
                debug!("Opening relay transport, attempt {}", attempt);
                match timeout(config.connect_timeout, connector.open()).await {
                    Ok(result) => result,
                    Err(_) => Err(ClientError::ConnectTimeout),
                }
            },
        )
        .await
        .map_err(|mut failures| failures.pop().unwrap_or(ClientError::ConnectTimeout))?;

        let TransportLink { tx, mut rx, guard } = link;

        tx.send(ClientMessage::JoinSession {
            session_id: session_id.to_string(),
            participant_id: participant.to_string(),
        })
        .map_err(|_| ClientError::ConnectionLost)?;

        let deadline = Instant::now() + config.connect_timeout;
        let mut backlog = Vec::new();
        let mut ice_servers = Vec::new();

        let ack = loop {
            let msg = match timeout_at(deadline, rx.recv()).await {
                Err(_) => return Err(ClientError::ConnectTimeout),
                Ok(None) => return Err(ClientError::ConnectionLost),
                Ok(Some(msg)) => msg,
            };

            match msg {
                ServerMessage::IceConfig { ice_servers: servers } => ice_servers = servers,
                ServerMessage::Joined {
                    session_id,
                    participant_id,
                    members,
                    peers,
                } => {
                    break JoinAck {
                        session_id,
                        participant_id,
                        members,
                        peers,
                    };
                }
                ServerMessage::Error { code, message } => {
                    return Err(ClientError::Rejected { code, message });
                }
                other => backlog.push(other),
            }
        };

        Ok((
            ack,
            JoinedLink {
                outbound: tx,
                inbound: rx,
                guard,
                backlog,
                ice_servers,
            },
        ))
    }
}
