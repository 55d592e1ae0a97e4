use crate::config::{ConfigError, RelayConfig};
use crate::room::{Room, RoomRegistry};
use crate::signaling::{MeetingDirectory, OpenDirectory, Session};
use crate::transport::{CloseReason, ParticipantChannel};
use futures::future::join_all;
use meetwire_core::{MeetingCode, ParticipantId, SignalKind, SignalMessage};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JoinError {
    #[error("meeting code must not be empty")]
    BlankMeetingCode,

    #[error("user id must not be empty")]
    BlankParticipantId,

    #[error("meeting {0} is not active")]
    MeetingUnavailable(MeetingCode),

    #[error("relay is shutting down")]
    ShuttingDown,
}

struct SignalingInner {
    registry: RoomRegistry,
    config: RelayConfig,
    directory: Arc<dyn MeetingDirectory>,
    shutdown: CancellationToken,
}

/// Routes signaling messages between the participants of each meeting.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(config: RelayConfig) -> Result<Self, ConfigError> {
        Self::with_directory(config, Arc::new(OpenDirectory))
    }

    /// Fails if `config` does not pass [`RelayConfig::validate`].
    pub fn with_directory(
        config: RelayConfig,
        directory: Arc<dyn MeetingDirectory>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            inner: Arc::new(SignalingInner {
                registry: RoomRegistry::new(),
                config,
                directory,
                shutdown: CancellationToken::new(),
            }),
        })
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.inner.registry
    }

    pub fn config(&self) -> &RelayConfig {
        &self.inner.config
    }

    /// Checks run before a connection is accepted.
    pub async fn authorize(
        &self,
        meeting_code: &MeetingCode,
        participant_id: &ParticipantId,
    ) -> Result<(), JoinError> {
        if self.is_shutting_down() {
            return Err(JoinError::ShuttingDown);
        }
        if meeting_code.is_blank() {
            return Err(JoinError::BlankMeetingCode);
        }
        if participant_id.is_blank() {
            return Err(JoinError::BlankParticipantId);
        }
        if !self.inner.directory.is_active(meeting_code).await {
            return Err(JoinError::MeetingUnavailable(meeting_code.clone()));
        }
        Ok(())
    }

    /// Register a new participant channel and announce it to the room.
    ///
    /// A channel already registered under the same participant id is closed
    /// as superseded. The returned receiver yields every message addressed
    /// to the new participant.
    pub async fn open_session(
        &self,
        meeting_code: MeetingCode,
        participant_id: ParticipantId,
        display_name: Option<String>,
    ) -> Result<(Session, mpsc::Receiver<SignalMessage>), JoinError> {
        self.authorize(&meeting_code, &participant_id).await?;
        self.register(meeting_code, participant_id, display_name).await
    }

    /// [`Self::open_session`] for callers that already ran [`Self::authorize`].
    pub(crate) async fn register(
        &self,
        meeting_code: MeetingCode,
        participant_id: ParticipantId,
        display_name: Option<String>,
    ) -> Result<(Session, mpsc::Receiver<SignalMessage>), JoinError> {
        let (channel, rx) = ParticipantChannel::new(
            meeting_code.clone(),
            participant_id.clone(),
            display_name.clone(),
            self.inner.config.channel_capacity,
        );

        info!(
            "New signaling channel for user {} in meeting {} ({})",
            participant_id,
            meeting_code,
            channel.connection_id()
        );

        if let Some(previous) = self.inner.registry.join(channel.clone()) {
            if previous.close(CloseReason::Superseded) {
                info!(
                    "User {} reconnected to meeting {}, closing stale channel {}",
                    participant_id,
                    meeting_code,
                    previous.connection_id()
                );
            }
        }

        // A shutdown that ran before the join above could not see this channel.
        if self.is_shutting_down() {
            channel.close(CloseReason::Shutdown);
            self.inner.registry.depart(&channel);
            return Err(JoinError::ShuttingDown);
        }

        if let Some(room) = self.inner.registry.room(&meeting_code) {
            let join = SignalMessage::join(participant_id.clone(), meeting_code.clone(), display_name);
            let notified = self.broadcast(&room, Some(&participant_id), join).await;
            debug!(
                "Announced {} to {} peer(s) in meeting {}",
                participant_id, notified, meeting_code
            );
        }

        Ok((Session::new(self.clone(), channel), rx))
    }

    /// Route one inbound message from `channel`.
    pub async fn dispatch(&self, channel: &ParticipantChannel, mut msg: SignalMessage) {
        let sender = channel.participant_id();
        let meeting = channel.meeting_code();

        if !msg.meeting_code.is_blank() && &msg.meeting_code != meeting {
            debug!(
                "User {} claimed meeting {} on a channel bound to {}",
                sender, msg.meeting_code, meeting
            );
        }
        msg.sender_user_id = sender.clone();
        msg.meeting_code = meeting.clone();

        debug!(
            "Received {} from user {} in meeting {}",
            msg.kind, sender, meeting
        );

        let Some(room) = self.inner.registry.room(meeting) else {
            debug!("Meeting {} no longer exists, dropping {}", meeting, msg.kind);
            return;
        };

        if msg.kind.is_targeted() {
            let Some(target) = msg.target().cloned() else {
                warn!(
                    "Received {} without targetUserId from user {} in meeting {}",
                    msg.kind, sender, meeting
                );
                return;
            };
            self.unicast(&room, &target, msg).await;
        } else if msg.kind == SignalKind::Ready {
            self.announce_peers(&room, channel).await;
        } else if msg.kind.is_server_generated() {
            warn!(
                "Ignoring server-only message {} from user {} in meeting {}",
                msg.kind, sender, meeting
            );
        } else {
            warn!(
                "Unknown signaling message type {:?} from user {} in meeting {}",
                msg.kind.as_str(),
                sender,
                meeting
            );
        }
    }

    /// Deliver `msg` to `target` if it is in `room`. Returns whether it was queued.
    pub async fn unicast(&self, room: &Room, target: &ParticipantId, msg: SignalMessage) -> bool {
        let Some(channel) = room.get(target).filter(|c| !c.is_closed()) else {
            warn!(
                "Target user {} not found or channel closed in meeting {}",
                target,
                room.code()
            );
            return false;
        };

        self.deliver(&channel, msg).await
    }

    /// Deliver `msg` to every open channel in `room` except `except`.
    /// Returns the number of channels that accepted it.
    pub async fn broadcast(
        &self,
        room: &Room,
        except: Option<&ParticipantId>,
        msg: SignalMessage,
    ) -> usize {
        let peers = room.snapshot(except);
        let sends = peers.iter().map(|peer| self.deliver(peer, msg.clone()));

        join_all(sends)
            .await
            .into_iter()
            .filter(|delivered| *delivered)
            .count()
    }

    /// Tell `channel` about every other participant already in `room`.
    async fn announce_peers(&self, room: &Room, channel: &ParticipantChannel) -> usize {
        let mut announced = 0;

        for peer in room.snapshot(Some(channel.participant_id())) {
            let msg = SignalMessage::new_participant(
                peer.participant_id().clone(),
                room.code().clone(),
                peer.display_name().map(str::to_owned),
            );

            if !self.deliver(channel, msg).await {
                break;
            }
            announced += 1;
        }

        debug!(
            "Sent {} existing participant(s) to user {} in meeting {}",
            announced,
            channel.participant_id(),
            room.code()
        );
        announced
    }

    async fn deliver(&self, channel: &ParticipantChannel, msg: SignalMessage) -> bool {
        let kind = msg.kind.clone();

        match channel.send(msg, self.inner.config.send_timeout).await {
            Ok(()) => {
                debug!(
                    "Sent {} to user {} in meeting {}",
                    kind,
                    channel.participant_id(),
                    channel.meeting_code()
                );
                true
            }
            Err(e) => {
                warn!(
                    "Failed to send {} to user {} in meeting {}: {}",
                    kind,
                    channel.participant_id(),
                    channel.meeting_code(),
                    e
                );
                self.evict(channel);
                false
            }
        }
    }

    /// Take a channel that failed a send out of its room right away. Its own
    /// connection task notices the close and tells the remaining peers.
    fn evict(&self, channel: &ParticipantChannel) {
        if channel.close(CloseReason::SendFailed) {
            info!(
                "Evicting user {} from meeting {} after a failed send",
                channel.participant_id(),
                channel.meeting_code()
            );
        }
        self.inner.registry.depart(channel);
    }

    /// Close `channel`, deregister it and tell the remaining peers.
    pub(crate) async fn teardown(&self, channel: &ParticipantChannel, reason: CloseReason) {
        channel.close(reason);
        let reason = channel.close_reason().unwrap_or(reason);
        let participant = channel.participant_id();
        let meeting = channel.meeting_code();

        let departure = self.inner.registry.depart(channel);

        info!(
            "Signaling channel closed for user {} in meeting {}: {}",
            participant, meeting, reason
        );

        if !reason.notifies_peers() {
            return;
        }
        let Some(room) = departure.remaining else {
            return;
        };
        if room.contains(participant) {
            debug!(
                "User {} already reconnected to meeting {}, skipping leave",
                participant, meeting
            );
            return;
        }

        let leave = SignalMessage::leave(participant.clone(), meeting.clone());
        self.broadcast(&room, Some(participant), leave).await;
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// Refuse new sessions from now on and close every channel. Returns how
    /// many were open.
    pub fn shutdown(&self) -> usize {
        self.inner.shutdown.cancel();
        let closed = self.inner.registry.close_all(CloseReason::Shutdown);
        info!("Closing {} signaling channel(s) for shutdown", closed);
        closed
    }
}
