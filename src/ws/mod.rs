//! WebSocket layer: upgrade handling, frame codec and connection pumps.
//!
//! The endpoint at `/room` joins the caller to the broadcast hub for the
//! lifetime of the socket.

pub mod connection;
pub mod handler;
pub mod messages;
