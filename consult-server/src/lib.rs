mod config;
mod registry;
mod server;
mod signaling;

pub use config::{RegistryConfig, RelayConfig};
pub use registry::*;
pub use server::{router, serve};
pub use signaling::*;
