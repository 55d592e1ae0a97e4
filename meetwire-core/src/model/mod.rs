mod connection;
mod meeting;
mod participant;
mod signaling;

pub use connection::ConnectionId;
pub use meeting::MeetingCode;
pub use participant::ParticipantId;
pub use signaling::{SignalKind, SignalMessage};
