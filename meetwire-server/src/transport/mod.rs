mod close_reason;
mod participant_channel;

pub use close_reason::*;
pub use participant_channel::*;
