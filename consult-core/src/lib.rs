pub mod error;
pub mod lifecycle;
pub mod model;

pub use error::SignalingError;
pub use lifecycle::{NoopLifecycle, SessionLifecycle};
pub use model::*;
