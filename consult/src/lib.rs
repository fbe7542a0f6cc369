pub use consult_core::{ParticipantId, SessionId, SignalingError};

pub mod model {
    pub use consult_core::model::*;
}

pub mod lifecycle {
    pub use consult_core::lifecycle::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use consult_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use consult_client::*;
}
