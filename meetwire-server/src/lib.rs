mod config;
mod room;
mod signaling;
mod transport;

pub use config::*;
pub use room::*;
pub use signaling::*;
pub use transport::*;
