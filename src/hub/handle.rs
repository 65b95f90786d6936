//! Cloneable intake side of the hub.
//!
//! Every connection pump receives its own [`HubHandle`] clone at
//! construction time. The handle only ever sends events; it never touches
//! the membership set.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use super::client_handle::ClientHandle;
use super::stats::HubStats;
use crate::domain::{ClientId, Message};

/// Errors returned by hub intake operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HubError {
    /// The hub event loop has stopped.
    #[error("hub is not running")]
    Unavailable,
}

/// Join request with an acknowledgement sent once the member is added.
#[derive(Debug)]
pub(crate) struct JoinRequest {
    pub(crate) handle: ClientHandle,
    pub(crate) ack: oneshot::Sender<()>,
}

/// Leave request; the hub answers whether the id was a member.
#[derive(Debug)]
pub(crate) struct LeaveRequest {
    pub(crate) id: ClientId,
    pub(crate) ack: oneshot::Sender<bool>,
}

/// A submitted message together with the member that sent it.
#[derive(Debug)]
pub(crate) struct Envelope {
    pub(crate) origin: ClientId,
    pub(crate) message: Arc<Message>,
}

/// Sending half of the hub's intake channels.
#[derive(Debug, Clone)]
pub struct HubHandle {
    pub(crate) joins: mpsc::Sender<JoinRequest>,
    pub(crate) leaves: mpsc::Sender<LeaveRequest>,
    pub(crate) forward: mpsc::Sender<Envelope>,
    pub(crate) queries: mpsc::Sender<oneshot::Sender<HubStats>>,
}

impl HubHandle {
    /// Registers a client. Returns once the hub has added it, so any
    /// message submitted afterwards is fanned out to it.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Unavailable`] if the hub has stopped.
    pub async fn join(&self, handle: ClientHandle) -> Result<(), HubError> {
        let (ack, done) = oneshot::channel();
        self.joins
            .send(JoinRequest { handle, ack })
            .await
            .map_err(|_| HubError::Unavailable)?;
        done.await.map_err(|_| HubError::Unavailable)
    }

    /// Deregisters a client. Leaving twice, or leaving after a forced
    /// removal, is a no-op that returns `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Unavailable`] if the hub has stopped.
    pub async fn leave(&self, id: ClientId) -> Result<bool, HubError> {
        let (ack, done) = oneshot::channel();
        self.leaves
            .send(LeaveRequest { id, ack })
            .await
            .map_err(|_| HubError::Unavailable)?;
        done.await.map_err(|_| HubError::Unavailable)
    }

    /// Queues a message for fan-out. Waits only for intake capacity, not
    /// for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Unavailable`] if the hub has stopped.
    pub async fn submit(&self, origin: ClientId, message: Message) -> Result<(), HubError> {
        self.forward
            .send(Envelope {
                origin,
                message: Arc::new(message),
            })
            .await
            .map_err(|_| HubError::Unavailable)
    }

    /// Asks the hub loop for a counter snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Unavailable`] if the hub has stopped.
    pub async fn stats(&self) -> Result<HubStats, HubError> {
        let (tx, rx) = oneshot::channel();
        self.queries
            .send(tx)
            .await
            .map_err(|_| HubError::Unavailable)?;
        rx.await.map_err(|_| HubError::Unavailable)
    }
}
