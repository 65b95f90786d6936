//! Domain layer: identifiers, identities, and the chat message value.
//!
//! These types carry no concurrency concerns of their own. They are built
//! at the edges (session layer, connection pump) and then moved or shared
//! read-only through the hub.

pub mod client_id;
pub mod identity;
pub mod message;

pub use client_id::ClientId;
pub use identity::{Identity, IdentityError};
pub use message::Message;
