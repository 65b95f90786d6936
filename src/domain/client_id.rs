//! Hub membership key.

use std::fmt;

/// Identifies one member of the hub for the lifetime of its connection.
///
/// Minted by [`crate::hub::ClientHandle::new`]; the pump uses it to address
/// its `leave` and the hub uses it to skip the origin under
/// [`crate::hub::EchoPolicy::ExcludeSender`]. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(uuid::Uuid);

impl ClientId {
    /// Mints a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
