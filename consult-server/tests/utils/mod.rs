pub mod mock_lifecycle;

pub use mock_lifecycle::*;
pub use signal_helpers::*;
pub use test_connection::*;
