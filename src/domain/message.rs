//! Chat message value.
//!
//! A [`Message`] is built once by the connection pump that received it and
//! never mutated afterwards. The hub wraps it in an [`std::sync::Arc`] and
//! places the same allocation on every member's delivery queue.

use chrono::{DateTime, Utc};

/// One chat utterance as observed by the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    sender: String,
    body: String,
    timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a message stamped with the given receipt time.
    ///
    /// The timestamp is always assigned by the relay, never taken from the
    /// sender's frame.
    #[must_use]
    pub fn new(sender: impl Into<String>, body: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            sender: sender.into(),
            body: body.into(),
            timestamp,
        }
    }

    /// Display name of the sender. Empty for anonymous connections.
    #[must_use]
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Message payload.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Time the relay received the message.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
