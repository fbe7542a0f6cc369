use consult_core::{ParticipantId, ServerMessage, SignalEnvelope};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

use crate::error::ClientError;

pub type PresenceHandler = Arc<dyn Fn(ParticipantId) + Send + Sync>;
pub type SignalHandler = Arc<dyn Fn(SignalEnvelope) + Send + Sync>;
pub type ErrorHandler = Arc<dyn Fn(ClientError) + Send + Sync>;

/// At most one callback per event. Setting one replaces the previous.
#[derive(Default)]
pub(crate) struct EventHandlers {
    pub user_joined: Option<PresenceHandler>,
    pub user_left: Option<PresenceHandler>,
    pub signal: Option<SignalHandler>,
    pub error: Option<ErrorHandler>,
}

pub(crate) type SharedHandlers = Arc<RwLock<EventHandlers>>;

/// Clones one handler out of the table. Callbacks run after the lock is
/// released, so they may replace handlers themselves.
fn pick<H: Clone>(
    handlers: &SharedHandlers,
    slot: impl FnOnce(&EventHandlers) -> &Option<H>,
) -> Option<H> {
    match handlers.read() {
        Ok(table) => slot(&table).clone(),
        Err(poisoned) => slot(&poisoned.into_inner()).clone(),
    }
}

pub(crate) fn dispatch(handlers: &SharedHandlers, msg: ServerMessage) {
    match msg {
        ServerMessage::UserConnected { participant_id } => {
            if let Some(cb) = pick(handlers, |h| &h.user_joined) {
                cb(participant_id);
            }
        }
        ServerMessage::UserDisconnected { participant_id } => {
            if let Some(cb) = pick(handlers, |h| &h.user_left) {
                cb(participant_id);
            }
        }
        ServerMessage::Signal(envelope) => {
            if let Some(cb) = pick(handlers, |h| &h.signal) {
                cb(envelope);
            }
        }
        ServerMessage::Error { code, message } => {
            warn!("Relay error {:?}: {}", code, message);
            if let Some(cb) = pick(handlers, |h| &h.error) {
                cb(ClientError::Rejected { code, message });
            }
        }
        other => debug!("Ignoring relay message {:?}", other),
    }
}

pub(crate) fn report(handlers: &SharedHandlers, err: ClientError) {
    if let Some(cb) = pick(handlers, |h| &h.error) {
        cb(err);
    }
}
