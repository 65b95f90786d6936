//! WebSocket frame payloads: one JSON object per frame.
//!
//! Inbound frames only carry the message body. Sender and timestamp are
//! never read from the client; the pump stamps them on receipt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Message;

/// Errors raised while encoding or decoding a frame payload.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload was not a valid inbound frame.
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Client → relay payload.
///
/// ```json
/// { "body": "hello" }
/// ```
///
/// `message` is accepted as an alias of `body`. Any other field, including a
/// client-supplied sender or timestamp, is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InboundFrame {
    /// Message text.
    #[serde(alias = "message")]
    pub body: String,
}

impl InboundFrame {
    /// Decodes a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Malformed`] if the text is not a JSON object
    /// with a string `body`.
    pub fn from_text(text: &str) -> Result<Self, FrameError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Decodes a binary frame holding UTF-8 JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Malformed`] if the bytes are not a JSON object
    /// with a string `body`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FrameError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Relay → client payload.
///
/// ```json
/// { "sender": "alice", "body": "hello", "timestamp": "2026-01-01T00:00:00Z" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundFrame {
    /// Display name of the sender. Empty for anonymous connections.
    pub sender: String,
    /// Message text.
    pub body: String,
    /// Time the relay received the message.
    pub timestamp: DateTime<Utc>,
}

impl OutboundFrame {
    /// Encodes a message as frame text.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Malformed`] if serialization fails.
    pub fn encode(message: &Message) -> Result<String, FrameError> {
        Ok(serde_json::to_string(&Self::from(message))?)
    }
}

impl From<&Message> for OutboundFrame {
    fn from(message: &Message) -> Self {
        Self {
            sender: message.sender().to_string(),
            body: message.body().to_string(),
            timestamp: message.timestamp(),
        }
    }
}
