use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque code naming a meeting room.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct MeetingCode(String);

impl MeetingCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for MeetingCode {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for MeetingCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for MeetingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
