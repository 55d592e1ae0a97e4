use crate::room::Room;
use crate::transport::{CloseReason, ParticipantChannel};
use dashmap::DashMap;
use meetwire_core::MeetingCode;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of removing a channel from its room.
#[derive(Debug)]
pub struct Departure {
    /// The channel was still registered and this call removed it.
    pub removed: bool,
    /// The room if it still has participants, `None` once it was dropped.
    pub remaining: Option<Arc<Room>>,
}

/// All live rooms, keyed by meeting code.
///
/// Built once at startup and handed to every connection; clones share state.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<MeetingCode, Arc<Room>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create_room(&self, code: &MeetingCode) -> Arc<Room> {
        if let Some(room) = self.rooms.get(code) {
            return room.clone();
        }

        self.rooms
            .entry(code.clone())
            .or_insert_with(|| {
                info!("Creating new room: {}", code);
                Arc::new(Room::new(code.clone()))
            })
            .clone()
    }

    pub fn room(&self, code: &MeetingCode) -> Option<Arc<Room>> {
        self.rooms.get(code).map(|room| room.clone())
    }

    /// Drop the room for `code` if it has no participants. The emptiness check
    /// and the removal happen under the same shard lock as [`Self::join`].
    pub fn remove_room_if_empty(&self, code: &MeetingCode) -> bool {
        let removed = self.rooms.remove_if(code, |_, room| room.is_empty()).is_some();
        if removed {
            info!("Room {} is empty and was removed", code);
        }
        removed
    }

    /// Register `channel` in its meeting's room, creating the room if needed.
    ///
    /// Creation and insertion happen while holding the registry entry, so a
    /// concurrent last departure cannot drop the room in between. Returns the
    /// channel previously registered under the same participant id.
    pub fn join(&self, channel: ParticipantChannel) -> Option<ParticipantChannel> {
        let code = channel.meeting_code().clone();
        let entry = self.rooms.entry(code.clone()).or_insert_with(|| {
            info!("Creating new room: {}", code);
            Arc::new(Room::new(code.clone()))
        });
        entry.insert(channel)
    }

    /// Remove `channel` from its room and drop the room once empty.
    pub fn depart(&self, channel: &ParticipantChannel) -> Departure {
        let code = channel.meeting_code();

        let Some(room) = self.room(code) else {
            return Departure {
                removed: false,
                remaining: None,
            };
        };

        let removed = room.remove_channel(channel);
        if removed {
            debug!(
                "Removed {} ({}) from room {}",
                channel.participant_id(),
                channel.connection_id(),
                code
            );
        }

        if self.remove_room_if_empty(code) {
            return Departure {
                removed,
                remaining: None,
            };
        }

        Departure {
            removed,
            remaining: self.room(code),
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn participant_count(&self) -> usize {
        self.rooms.iter().map(|room| room.len()).sum()
    }

    /// Close every registered channel. Rooms are dropped by the channels'
    /// own teardown.
    pub fn close_all(&self, reason: CloseReason) -> usize {
        let rooms: Vec<Arc<Room>> = self.rooms.iter().map(|r| r.value().clone()).collect();

        rooms
            .iter()
            .flat_map(|room| room.snapshot(None))
            .filter(|channel| channel.close(reason))
            .count()
    }
}
