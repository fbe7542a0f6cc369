mod connection;
mod identifier;
mod participant;
mod protocol;
mod session;
mod signaling;

pub use connection::ConnectionId;
pub use identifier::{IdentifierKind, MAX_IDENTIFIER_LEN, MIN_IDENTIFIER_LEN};
pub use participant::ParticipantId;
pub use protocol::{ClientMessage, ErrorCode, ServerMessage};
pub use session::SessionId;
pub use signaling::{
    CandidatePayload, DescriptionPayload, IceServerConfig, SignalEnvelope, SignalKind, now_millis,
};
