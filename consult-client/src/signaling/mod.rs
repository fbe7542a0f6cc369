mod client;
mod connector;
mod handlers;
mod identity;

pub use client::{JoinAck, SignalingClient};
pub use connector::{Connector, TaskGuard, TransportLink, WsConnector};
pub use handlers::{ErrorHandler, PresenceHandler, SignalHandler};
pub use identity::{Anonymous, IdentityProvider, StaticIdentity};
