//! JSON wire encoding.

use crate::message::{Detached, HostMessage, WorkerMessage};

/// Errors from encoding or decoding wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode one host message. Unknown tags yield `HostMessage::Unknown`.
pub fn decode_host(text: &str) -> Result<HostMessage<Detached>, ProtocolError> {
    Ok(serde_json::from_str(text)?)
}

pub fn encode_host<S>(msg: &HostMessage<S>) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(msg)?)
}

pub fn decode_worker(text: &str) -> Result<WorkerMessage, ProtocolError> {
    Ok(serde_json::from_str(text)?)
}

pub fn encode_worker(msg: &WorkerMessage) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(msg)?)
}
