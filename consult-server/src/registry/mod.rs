mod binding;
mod session;
mod session_command;
mod session_registry;

pub use binding::ConnectionHandle;
pub use session_command::{JoinOutcome, LeaveOutcome, LeaveReason, RelayOutcome};
pub use session_registry::SessionRegistry;
