mod meeting_directory;
mod router;
mod session;
mod signaling_service;
mod ws_handler;

pub use meeting_directory::*;
pub use router::*;
pub use session::*;
pub use signaling_service::*;
pub use ws_handler::*;
