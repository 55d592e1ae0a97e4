use crate::model::meeting::MeetingCode;
use crate::model::participant::ParticipantId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag of a signaling frame.
///
/// Unknown tags are kept verbatim in [`SignalKind::Unrecognized`] so that the
/// relay can log what it dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SignalKind {
    Join,
    Leave,
    Ready,
    Offer,
    Answer,
    Candidate,
    NewParticipant,
    Unrecognized(String),
}

impl SignalKind {
    pub fn as_str(&self) -> &str {
        match self {
            SignalKind::Join => "join",
            SignalKind::Leave => "leave",
            SignalKind::Ready => "ready",
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::Candidate => "candidate",
            SignalKind::NewParticipant => "new-participant",
            SignalKind::Unrecognized(raw) => raw,
        }
    }

    /// Kinds that are forwarded to exactly one `targetUserId`.
    pub fn is_targeted(&self) -> bool {
        matches!(
            self,
            SignalKind::Offer | SignalKind::Answer | SignalKind::Candidate
        )
    }

    /// Kinds only the relay itself may emit.
    pub fn is_server_generated(&self) -> bool {
        matches!(
            self,
            SignalKind::Join | SignalKind::Leave | SignalKind::NewParticipant
        )
    }
}

impl From<String> for SignalKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "join" => SignalKind::Join,
            "leave" => SignalKind::Leave,
            "ready" => SignalKind::Ready,
            "offer" => SignalKind::Offer,
            "answer" => SignalKind::Answer,
            "candidate" => SignalKind::Candidate,
            "new-participant" => SignalKind::NewParticipant,
            _ => SignalKind::Unrecognized(s),
        }
    }
}

impl From<&str> for SignalKind {
    fn from(s: &str) -> Self {
        SignalKind::from(s.to_owned())
    }
}

impl From<SignalKind> for String {
    fn from(kind: SignalKind) -> Self {
        match kind {
            SignalKind::Unrecognized(raw) => raw,
            other => other.as_str().to_owned(),
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One signaling frame as it travels between browser and relay.
///
/// `sender_user_id` and `meeting_code` are always rewritten by the relay from
/// the channel the frame arrived on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalMessage {
    #[serde(rename = "type")]
    pub kind: SignalKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,

    #[serde(
        rename = "sdpMLineIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sdp_m_line_index: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_user_id: Option<ParticipantId>,

    #[serde(default)]
    pub sender_user_id: ParticipantId,

    #[serde(default)]
    pub meeting_code: MeetingCode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl SignalMessage {
    pub fn new(kind: SignalKind) -> Self {
        Self {
            kind,
            sdp: None,
            candidate: None,
            sdp_mid: None,
            sdp_m_line_index: None,
            target_user_id: None,
            sender_user_id: ParticipantId::default(),
            meeting_code: MeetingCode::default(),
            display_name: None,
        }
    }

    /// Announces `sender` to the rest of `meeting`.
    pub fn join(sender: ParticipantId, meeting: MeetingCode, display_name: Option<String>) -> Self {
        Self {
            sender_user_id: sender,
            meeting_code: meeting,
            display_name,
            ..Self::new(SignalKind::Join)
        }
    }

    pub fn leave(sender: ParticipantId, meeting: MeetingCode) -> Self {
        Self {
            sender_user_id: sender,
            meeting_code: meeting,
            ..Self::new(SignalKind::Leave)
        }
    }

    /// Tells a freshly ready participant about `peer`, who is already in the room.
    pub fn new_participant(
        peer: ParticipantId,
        meeting: MeetingCode,
        display_name: Option<String>,
    ) -> Self {
        Self {
            sender_user_id: peer,
            meeting_code: meeting,
            display_name,
            ..Self::new(SignalKind::NewParticipant)
        }
    }

    pub fn ready() -> Self {
        Self::new(SignalKind::Ready)
    }

    pub fn offer(target: ParticipantId, sdp: impl Into<String>) -> Self {
        Self {
            target_user_id: Some(target),
            sdp: Some(sdp.into()),
            ..Self::new(SignalKind::Offer)
        }
    }

    pub fn answer(target: ParticipantId, sdp: impl Into<String>) -> Self {
        Self {
            target_user_id: Some(target),
            sdp: Some(sdp.into()),
            ..Self::new(SignalKind::Answer)
        }
    }

    pub fn candidate(
        target: ParticipantId,
        candidate: impl Into<String>,
        sdp_mid: Option<String>,
        sdp_m_line_index: Option<u16>,
    ) -> Self {
        Self {
            target_user_id: Some(target),
            candidate: Some(candidate.into()),
            sdp_mid,
            sdp_m_line_index,
            ..Self::new(SignalKind::Candidate)
        }
    }

    /// Target id, if present and not blank.
    pub fn target(&self) -> Option<&ParticipantId> {
        self.target_user_id.as_ref().filter(|id| !id.is_blank())
    }
}
