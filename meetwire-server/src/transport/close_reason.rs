use std::fmt;

/// Why a participant channel stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The browser closed the socket or the stream ended.
    ClientClosed,
    /// Reading from or writing to the socket failed.
    TransportError,
    /// Nothing arrived from the browser within the idle timeout.
    IdleTimeout,
    /// A relay send to this channel failed or timed out.
    SendFailed,
    /// The participant reconnected and a newer channel took its place.
    Superseded,
    /// The relay is shutting down.
    Shutdown,
}

impl CloseReason {
    /// Whether the rest of the room should receive a `leave` for this close.
    pub fn notifies_peers(self) -> bool {
        !matches!(self, CloseReason::Superseded | CloseReason::Shutdown)
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CloseReason::ClientClosed => "client closed",
            CloseReason::TransportError => "transport error",
            CloseReason::IdleTimeout => "idle timeout",
            CloseReason::SendFailed => "send failed",
            CloseReason::Superseded => "superseded",
            CloseReason::Shutdown => "shutdown",
        };
        f.write_str(s)
    }
}
