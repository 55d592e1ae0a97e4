use crate::transport::ParticipantChannel;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use meetwire_core::{MeetingCode, ParticipantId};

/// Participants of one meeting, keyed by participant id.
pub struct Room {
    code: MeetingCode,
    participants: DashMap<ParticipantId, ParticipantChannel>,
}

impl Room {
    pub fn new(code: MeetingCode) -> Self {
        Self {
            code,
            participants: DashMap::new(),
        }
    }

    pub fn code(&self) -> &MeetingCode {
        &self.code
    }

    /// Register `channel`, returning the channel it replaced, if any.
    pub fn insert(&self, channel: ParticipantChannel) -> Option<ParticipantChannel> {
        self.participants
            .insert(channel.participant_id().clone(), channel)
    }

    /// Remove `channel` only if it is still the registered connection for its
    /// participant id.
    pub fn remove_channel(&self, channel: &ParticipantChannel) -> bool {
        match self.participants.entry(channel.participant_id().clone()) {
            Entry::Occupied(entry) if entry.get().is_same_connection(channel) => {
                entry.remove();
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, participant_id: &ParticipantId) -> Option<ParticipantChannel> {
        self.participants
            .get(participant_id)
            .map(|entry| entry.value().clone())
    }

    /// Open channels other than `except`, cloned out so no map guard outlives
    /// the call.
    pub fn snapshot(&self, except: Option<&ParticipantId>) -> Vec<ParticipantChannel> {
        self.participants
            .iter()
            .filter(|entry| Some(entry.key()) != except)
            .filter(|entry| !entry.value().is_closed())
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn participant_ids(&self) -> Vec<ParticipantId> {
        self.participants
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn contains(&self, participant_id: &ParticipantId) -> bool {
        self.participants.contains_key(participant_id)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room")
            .field("code", &self.code)
            .field("participants", &self.participant_ids())
            .finish()
    }
}
