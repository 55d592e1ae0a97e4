use async_trait::async_trait;
use meetwire_core::MeetingCode;

/// Lookup into whatever system owns meeting metadata, consulted before a
/// channel is accepted.
#[async_trait]
pub trait MeetingDirectory: Send + Sync {
    /// Whether participants may currently connect to `meeting_code`.
    async fn is_active(&self, meeting_code: &MeetingCode) -> bool;
}

/// Accepts every meeting code.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenDirectory;

#[async_trait]
impl MeetingDirectory for OpenDirectory {
    async fn is_active(&self, _meeting_code: &MeetingCode) -> bool {
        true
    }
}
