use crate::signaling::SignalingService;
use crate::transport::{CloseReason, ParticipantChannel};
use meetwire_core::{MeetingCode, ParticipantId};
use tracing::warn;

/// An established participant channel together with the service that routes
/// its messages.
///
/// Call [`Session::close`] when the transport ends. Dropping a session without
/// closing it still deregisters the channel, but peers get no `leave`.
pub struct Session {
    service: SignalingService,
    channel: ParticipantChannel,
    torn_down: bool,
}

impl Session {
    pub(crate) fn new(service: SignalingService, channel: ParticipantChannel) -> Self {
        Self {
            service,
            channel,
            torn_down: false,
        }
    }

    pub fn channel(&self) -> &ParticipantChannel {
        &self.channel
    }

    pub fn participant_id(&self) -> &ParticipantId {
        self.channel.participant_id()
    }

    pub fn meeting_code(&self) -> &MeetingCode {
        self.channel.meeting_code()
    }

    /// Decode one text frame and route it. Malformed frames are logged and
    /// dropped; the session stays open.
    pub async fn handle_text(&self, text: &str) {
        match meetwire_core::decode(text) {
            Ok(msg) => self.service.dispatch(&self.channel, msg).await,
            Err(e) => warn!(
                "Invalid signaling message from user {} in meeting {}: {}",
                self.participant_id(),
                self.meeting_code(),
                e
            ),
        }
    }

    pub async fn close(mut self, reason: CloseReason) {
        self.torn_down = true;
        self.service.teardown(&self.channel, reason).await;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.torn_down {
            return;
        }
        self.channel.close(CloseReason::ClientClosed);
        self.service.registry().depart(&self.channel);
    }
}
