use meetwire_core::{ConnectionId, MeetingCode, ParticipantId, SignalMessage};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::transport::CloseReason;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    #[error("channel is closed")]
    Closed,

    #[error("outbound queue stayed full for {0:?}")]
    TimedOut(Duration),
}

struct ChannelInner {
    connection_id: ConnectionId,
    participant_id: ParticipantId,
    meeting_code: MeetingCode,
    display_name: Option<String>,
    tx: mpsc::Sender<SignalMessage>,
    cancel: CancellationToken,
    close_reason: OnceLock<CloseReason>,
}

/// Relay-side handle to one connected browser.
///
/// Cloning is cheap; all clones share the same queue and close state. The
/// receiving half of the queue belongs to whoever writes to the socket.
#[derive(Clone)]
pub struct ParticipantChannel {
    inner: Arc<ChannelInner>,
}

impl ParticipantChannel {
    pub fn new(
        meeting_code: MeetingCode,
        participant_id: ParticipantId,
        display_name: Option<String>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<SignalMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));

        let channel = Self {
            inner: Arc::new(ChannelInner {
                connection_id: ConnectionId::new(),
                participant_id,
                meeting_code,
                display_name,
                tx,
                cancel: CancellationToken::new(),
                close_reason: OnceLock::new(),
            }),
        };

        (channel, rx)
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.inner.connection_id
    }

    pub fn participant_id(&self) -> &ParticipantId {
        &self.inner.participant_id
    }

    pub fn meeting_code(&self) -> &MeetingCode {
        &self.inner.meeting_code
    }

    pub fn display_name(&self) -> Option<&str> {
        self.inner.display_name.as_deref()
    }

    pub fn is_same_connection(&self, other: &ParticipantChannel) -> bool {
        self.inner.connection_id == other.inner.connection_id
    }

    /// Queue one message, waiting at most `timeout` for room in the queue.
    ///
    /// Fails immediately once the channel is closed, including while waiting.
    pub async fn send(&self, msg: SignalMessage, timeout: Duration) -> Result<(), SendError> {
        if self.is_closed() {
            return Err(SendError::Closed);
        }

        tokio::select! {
            biased;

            _ = self.inner.cancel.cancelled() => Err(SendError::Closed),

            res = tokio::time::timeout(timeout, self.inner.tx.send(msg)) => match res {
                Ok(Ok(())) => Ok(()),
                Ok(Err(_)) => Err(SendError::Closed),
                Err(_) => Err(SendError::TimedOut(timeout)),
            },
        }
    }

    /// Close the channel. Only the first reason is kept; returns `true` for
    /// the call that actually closed it.
    pub fn close(&self, reason: CloseReason) -> bool {
        let first = self.inner.close_reason.set(reason).is_ok();
        self.inner.cancel.cancel();
        first
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        self.inner.close_reason.get().copied()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.cancel.is_cancelled() || self.inner.tx.is_closed()
    }

    /// Resolves once the channel is closed or its socket writer is gone.
    pub async fn closed(&self) {
        tokio::select! {
            _ = self.inner.cancel.cancelled() => {}
            _ = self.inner.tx.closed() => {}
        }
    }
}

impl std::fmt::Debug for ParticipantChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticipantChannel")
            .field("connection_id", &self.inner.connection_id)
            .field("participant_id", &self.inner.participant_id)
            .field("meeting_code", &self.inner.meeting_code)
            .field("closed", &self.is_closed())
            .finish()
    }
}
