//! Hub-side record of one connected client and its delivery queue.
//!
//! [`ClientHandle::new`] creates both halves of a membership: the
//! [`ClientHandle`] the hub owns while the client is joined, and the
//! [`ClientEndpoint`] the connection pump keeps to drain its queue and to
//! learn why the hub dropped it.

use std::sync::Arc;

use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::sync::{mpsc, oneshot};

use crate::domain::{ClientId, Identity, Message};

/// Why the hub removed a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The pump asked to leave.
    Left,
    /// The delivery queue was full during fan-out.
    Evicted,
    /// The delivery queue receiver was already gone during fan-out.
    Disconnected,
    /// The hub is shutting down.
    Shutdown,
}

/// Receiving side of the hub's removal notification.
pub type RemovalNotice = oneshot::Receiver<Removal>;

/// The hub's record of one joined client.
///
/// Owned exclusively by the hub event loop once joined. Dropping or
/// [closing](ClientHandle::close) it drops the only sender of the delivery
/// queue, so the queue is closed exactly once.
#[derive(Debug)]
pub struct ClientHandle {
    id: ClientId,
    identity: Identity,
    queue: mpsc::Sender<Arc<Message>>,
    removal: oneshot::Sender<Removal>,
}

/// Pump-side half of a membership.
#[derive(Debug)]
pub struct ClientEndpoint {
    /// Key of the matching [`ClientHandle`] in the hub.
    pub id: ClientId,
    /// Messages fanned out to this client.
    pub queue: DeliveryQueue,
    /// Resolves once the hub drops the member.
    pub removed: RemovalNotice,
}

impl ClientHandle {
    /// Creates a handle with a bounded delivery queue.
    ///
    /// A `capacity` of zero is treated as one.
    #[must_use]
    pub fn new(identity: Identity, capacity: usize) -> (Self, ClientEndpoint) {
        let id = ClientId::new();
        let (queue_tx, queue_rx) = mpsc::channel(capacity.max(1));
        let (removal_tx, removal_rx) = oneshot::channel();
        let handle = Self {
            id,
            identity,
            queue: queue_tx,
            removal: removal_tx,
        };
        let endpoint = ClientEndpoint {
            id,
            queue: DeliveryQueue { rx: queue_rx },
            removed: removal_rx,
        };
        (handle, endpoint)
    }

    /// Membership key.
    #[must_use]
    pub const fn id(&self) -> ClientId {
        self.id
    }

    /// Identity supplied by the session layer.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Offers a message without waiting for queue space.
    pub(crate) fn offer(&self, message: Arc<Message>) -> Result<(), TrySendError<Arc<Message>>> {
        self.queue.try_send(message)
    }

    /// Closes the delivery queue and tells the pump why.
    pub(crate) fn close(self, reason: Removal) {
        // The pump may already be gone.
        let _ = self.removal.send(reason);
    }
}

/// Bounded per-member outbound buffer, read by one outbound loop.
#[derive(Debug)]
pub struct DeliveryQueue {
    rx: mpsc::Receiver<Arc<Message>>,
}

impl DeliveryQueue {
    /// Waits for the next message. Returns `None` once the hub closed the
    /// queue and every buffered message has been taken.
    pub async fn recv(&mut self) -> Option<Arc<Message>> {
        self.rx.recv().await
    }

    /// Takes a buffered message without waiting.
    ///
    /// # Errors
    ///
    /// [`TryRecvError::Empty`] when nothing is buffered,
    /// [`TryRecvError::Disconnected`] when the queue is closed and drained.
    pub fn try_recv(&mut self) -> Result<Arc<Message>, TryRecvError> {
        self.rx.try_recv()
    }
}
