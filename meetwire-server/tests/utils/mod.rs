
pub use mock_directory::*;
pub use signal_helpers::*;
pub use test_peer::*;
pub use ws_client::*;
