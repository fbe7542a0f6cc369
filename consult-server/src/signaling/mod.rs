mod connection;
mod signaling_service;
mod ws_handler;

pub use connection::Connection;
pub use signaling_service::{LocalConnection, SignalingService};
pub use ws_handler::ws_handler;
