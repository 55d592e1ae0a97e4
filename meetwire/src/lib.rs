pub use meetwire_core::model::{MeetingCode, ParticipantId, SignalKind, SignalMessage};

pub mod model {
    pub use meetwire_core::model::*;
}

pub mod codec {
    pub use meetwire_core::codec::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use meetwire_server::*;
}
