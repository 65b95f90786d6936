//! # chat-relay
//!
//! Real-time WebSocket message relay built around a single broadcast hub.
//!
//! Clients connect to `GET /room`, send `{"body": "..."}` frames and
//! receive every message submitted by any connected client, stamped with
//! the sender's name and the time the relay received it.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket, HTTP)
//!     │
//!     ├── Session layer (session)      auth cookie → Identity
//!     ├── WS Handler (ws/)             upgrade, ConnectionPump per socket
//!     ├── REST Handlers (api/)         /health, OpenAPI
//!     │
//!     └── Hub (hub/)                   single task owning membership,
//!                                      non-blocking fan-out
//! ```
//!
//! The hub is the only owner of the member set. Pumps talk to it through a
//! cloneable [`hub::HubHandle`]; a member whose delivery queue is full is
//! evicted instead of stalling everyone else.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod hub;
pub mod session;
pub mod ws;
