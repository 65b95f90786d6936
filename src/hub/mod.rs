//! Broadcast hub: membership ownership and message fan-out.
//!
//! ```text
//!  pump ──join/leave/submit──▶ HubHandle ──mpsc──▶ Hub (single task)
//!                                                    │ try_send
//!  pump ◀────────── DeliveryQueue ◀──────────────────┘
//! ```
//!
//! The hub is created explicitly with [`Hub::new`] or [`Hub::spawn`] and
//! its [`HubHandle`] is passed to every connection pump.

pub mod client_handle;
pub mod event_loop;
pub mod handle;
pub mod stats;

pub use client_handle::{ClientEndpoint, ClientHandle, DeliveryQueue, Removal, RemovalNotice};
pub use event_loop::{EchoPolicy, Hub, HubSettings};
pub use handle::{HubError, HubHandle};
pub use stats::HubStats;
