//! JSON text-frame codec for [`SignalMessage`].
//!
//! One message per frame, every field named, absent optionals omitted.

use crate::model::SignalMessage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed signaling frame: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode signaling frame: {0}")]
    Encode(#[source] serde_json::Error),
}

pub fn decode(text: &str) -> Result<SignalMessage, CodecError> {
    serde_json::from_str(text).map_err(CodecError::Decode)
}

pub fn encode(msg: &SignalMessage) -> Result<String, CodecError> {
    serde_json::to_string(msg).map_err(CodecError::Encode)
}
