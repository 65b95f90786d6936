//! The broadcast hub event loop.
//!
//! [`Hub`] is the only owner of the membership map. Pumps reach it solely
//! through the intake channels behind [`HubHandle`]; each loop iteration
//! handles exactly one event, so membership needs no lock.
//!
//! Fan-out never waits on a member. Each member is offered the message with
//! `try_send`; a full queue gets the member evicted on the spot and the
//! message is dropped for that member alone.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::client_handle::{ClientHandle, Removal};
use super::handle::{Envelope, HubHandle, JoinRequest, LeaveRequest};
use super::stats::HubStats;
use crate::domain::ClientId;

/// Whether a member receives the messages it submitted itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EchoPolicy {
    /// Every member, including the sender, receives the message.
    #[default]
    IncludeSender,
    /// The sender is skipped during fan-out.
    ExcludeSender,
}

/// Construction parameters for a [`Hub`].
#[derive(Debug, Clone, Copy)]
pub struct HubSettings {
    /// Capacity of each intake channel. Zero is treated as one.
    pub intake_capacity: usize,
    /// Self-echo policy applied to every fan-out.
    pub echo: EchoPolicy,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            intake_capacity: 64,
            echo: EchoPolicy::default(),
        }
    }
}

/// Serialized owner of client membership and message fan-out.
#[derive(Debug)]
pub struct Hub {
    joins: mpsc::Receiver<JoinRequest>,
    leaves: mpsc::Receiver<LeaveRequest>,
    forward: mpsc::Receiver<Envelope>,
    queries: mpsc::Receiver<oneshot::Sender<HubStats>>,
    members: HashMap<ClientId, ClientHandle>,
    echo: EchoPolicy,
    stats: HubStats,
}

impl Hub {
    /// Creates a hub and the handle used to reach it.
    ///
    /// The hub does nothing until [`Hub::run`] or [`Hub::run_until`] is
    /// polled.
    #[must_use]
    pub fn new(settings: HubSettings) -> (Self, HubHandle) {
        let capacity = settings.intake_capacity.max(1);
        let (joins_tx, joins) = mpsc::channel(capacity);
        let (leaves_tx, leaves) = mpsc::channel(capacity);
        let (forward_tx, forward) = mpsc::channel(capacity);
        let (queries_tx, queries) = mpsc::channel(capacity);

        let hub = Self {
            joins,
            leaves,
            forward,
            queries,
            members: HashMap::new(),
            echo: settings.echo,
            stats: HubStats::default(),
        };
        let handle = HubHandle {
            joins: joins_tx,
            leaves: leaves_tx,
            forward: forward_tx,
            queries: queries_tx,
        };
        (hub, handle)
    }

    /// Creates a hub and runs it on a Tokio task until `shutdown` resolves.
    pub fn spawn<F>(settings: HubSettings, shutdown: F) -> (HubHandle, JoinHandle<()>)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (hub, handle) = Self::new(settings);
        let task = tokio::spawn(hub.run_until(shutdown));
        (handle, task)
    }

    /// Runs until every [`HubHandle`] clone has been dropped.
    pub async fn run(self) {
        self.run_until(std::future::pending()).await;
    }

    /// Runs until `shutdown` resolves or every [`HubHandle`] clone has been
    /// dropped. Remaining members are closed with [`Removal::Shutdown`].
    pub async fn run_until<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);
        tracing::info!(echo = ?self.echo, "hub started");

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("hub shutdown requested");
                    break;
                }
                request = self.joins.recv() => match request {
                    Some(request) => self.join(request),
                    None => break,
                },
                request = self.leaves.recv() => match request {
                    Some(request) => self.leave(request),
                    None => break,
                },
                envelope = self.forward.recv() => match envelope {
                    Some(envelope) => self.broadcast(envelope),
                    None => break,
                },
                responder = self.queries.recv() => match responder {
                    Some(responder) => {
                        let _ = responder.send(self.snapshot());
                    }
                    None => break,
                },
            }
        }

        let remaining = self.members.len();
        for (_, member) in self.members.drain() {
            member.close(Removal::Shutdown);
        }
        tracing::info!(closed = remaining, "hub stopped");
    }

    fn join(&mut self, request: JoinRequest) {
        let JoinRequest { handle, ack } = request;
        let id = handle.id();
        let name = handle.identity().name().to_string();
        if let Some(previous) = self.members.insert(id, handle) {
            previous.close(Removal::Left);
        }
        self.stats.joined = self.stats.joined.saturating_add(1);
        tracing::info!(client_id = %id, name = %name, members = self.members.len(), "client joined");
        let _ = ack.send(());
    }

    fn leave(&mut self, request: LeaveRequest) {
        let LeaveRequest { id, ack } = request;
        let was_member = self.remove(id, Removal::Left);
        if was_member {
            self.stats.left = self.stats.left.saturating_add(1);
            tracing::info!(client_id = %id, members = self.members.len(), "client left");
        } else {
            tracing::debug!(client_id = %id, "leave for non-member ignored");
        }
        let _ = ack.send(was_member);
    }

    fn broadcast(&mut self, envelope: Envelope) {
        let Envelope { origin, message } = envelope;
        let skip_origin = self.echo == EchoPolicy::ExcludeSender;
        let mut delivered = 0usize;
        let mut stalled = Vec::new();
        let mut gone = Vec::new();

        for (id, member) in &self.members {
            if skip_origin && *id == origin {
                continue;
            }
            match member.offer(Arc::clone(&message)) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => stalled.push(*id),
                Err(TrySendError::Closed(_)) => gone.push(*id),
            }
        }

        self.stats.broadcasts = self.stats.broadcasts.saturating_add(1);
        for id in stalled {
            if self.remove(id, Removal::Evicted) {
                self.stats.evicted = self.stats.evicted.saturating_add(1);
                self.stats.dropped_deliveries = self.stats.dropped_deliveries.saturating_add(1);
                tracing::warn!(client_id = %id, "delivery queue full, evicting slow client");
            }
        }
        for id in gone {
            if self.remove(id, Removal::Disconnected) {
                self.stats.dropped_deliveries = self.stats.dropped_deliveries.saturating_add(1);
                tracing::debug!(client_id = %id, "delivery queue closed, removing client");
            }
        }

        tracing::debug!(
            sender = message.sender(),
            delivered,
            members = self.members.len(),
            "message broadcast"
        );
    }

    fn remove(&mut self, id: ClientId, reason: Removal) -> bool {
        match self.members.remove(&id) {
            Some(member) => {
                member.close(reason);
                true
            }
            None => false,
        }
    }

    fn snapshot(&self) -> HubStats {
        HubStats {
            members: self.members.len(),
            ..self.stats
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use tokio::sync::mpsc::error::TryRecvError;
    use tokio::time::timeout;

    use super::*;
    use crate::domain::{Identity, Message};
    use crate::hub::{ClientEndpoint, HubError};

    const WAIT: Duration = Duration::from_secs(2);

    fn start(echo: EchoPolicy) -> HubHandle {
        let settings = HubSettings {
            intake_capacity: 16,
            echo,
        };
        let (handle, _task) = Hub::spawn(settings, std::future::pending());
        handle
    }

    async fn join(hub: &HubHandle, name: &str, capacity: usize) -> ClientEndpoint {
        let Ok(identity) = Identity::named(name) else {
            panic!("valid identity");
        };
        let (handle, endpoint) = ClientHandle::new(identity, capacity);
        let Ok(()) = hub.join(handle).await else {
            panic!("hub should accept join");
        };
        endpoint
    }

    async fn say(hub: &HubHandle, from: &ClientEndpoint, sender: &str, body: &str) {
        let msg = Message::new(sender, body, Utc::now());
        let Ok(()) = hub.submit(from.id, msg).await else {
            panic!("hub should accept submit");
        };
    }

    async fn next(endpoint: &mut ClientEndpoint) -> Arc<Message> {
        match timeout(WAIT, endpoint.queue.recv()).await {
            Ok(Some(msg)) => msg,
            Ok(None) => panic!("queue closed unexpectedly"),
            Err(_) => panic!("timed out waiting for message"),
        }
    }

    async fn stats(hub: &HubHandle) -> HubStats {
        let Ok(stats) = hub.stats().await else {
            panic!("hub should answer stats");
        };
        stats
    }

    #[tokio::test]
    async fn message_reaches_every_member_including_sender() {
        let hub = start(EchoPolicy::IncludeSender);
        let mut a = join(&hub, "A", 8).await;
        let mut b = join(&hub, "B", 8).await;
        let mut c = join(&hub, "C", 8).await;

        say(&hub, &a, "A", "hi").await;

        for endpoint in [&mut a, &mut b, &mut c] {
            let msg = next(endpoint).await;
            assert_eq!(msg.sender(), "A");
            assert_eq!(msg.body(), "hi");
        }
    }

    #[tokio::test]
    async fn exclude_sender_skips_origin() {
        let hub = start(EchoPolicy::ExcludeSender);
        let mut a = join(&hub, "A", 8).await;
        let mut b = join(&hub, "B", 8).await;
        let mut c = join(&hub, "C", 8).await;

        say(&hub, &a, "A", "hi").await;

        assert_eq!(next(&mut b).await.body(), "hi");
        assert_eq!(next(&mut c).await.body(), "hi");
        // B and C have it, so the single fan-out pass is over.
        assert_eq!(a.queue.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn each_member_gets_exactly_one_copy() {
        let hub = start(EchoPolicy::IncludeSender);
        let mut a = join(&hub, "A", 8).await;
        let mut b = join(&hub, "B", 8).await;

        say(&hub, &a, "A", "once").await;
        say(&hub, &a, "A", "marker").await;

        for endpoint in [&mut a, &mut b] {
            assert_eq!(next(endpoint).await.body(), "once");
            assert_eq!(next(endpoint).await.body(), "marker");
        }
    }

    #[tokio::test]
    async fn late_joiner_misses_earlier_broadcast() {
        let hub = start(EchoPolicy::IncludeSender);
        let mut a = join(&hub, "A", 8).await;
        say(&hub, &a, "A", "before").await;
        assert_eq!(next(&mut a).await.body(), "before");

        let mut late = join(&hub, "late", 8).await;
        say(&hub, &a, "A", "after").await;

        assert_eq!(next(&mut late).await.body(), "after");
        assert_eq!(next(&mut a).await.body(), "after");
    }

    #[tokio::test]
    async fn per_sender_order_is_preserved() {
        let hub = start(EchoPolicy::IncludeSender);
        let a = join(&hub, "A", 64).await;
        let mut b = join(&hub, "B", 64).await;

        for i in 0..50 {
            say(&hub, &a, "A", &i.to_string()).await;
        }
        for i in 0..50 {
            assert_eq!(next(&mut b).await.body(), i.to_string());
        }
    }

    #[tokio::test]
    async fn leave_is_idempotent() {
        let hub = start(EchoPolicy::IncludeSender);
        let mut a = join(&hub, "A", 8).await;

        assert_eq!(hub.leave(a.id).await, Ok(true));
        assert_eq!(hub.leave(a.id).await, Ok(false));

        assert!(a.queue.recv().await.is_none());
        assert_eq!((&mut a.removed).await, Ok(Removal::Left));

        let snapshot = stats(&hub).await;
        assert_eq!(snapshot.left, 1);
        assert_eq!(snapshot.members, 0);
    }

    #[tokio::test]
    async fn leave_of_unknown_id_is_noop() {
        let hub = start(EchoPolicy::IncludeSender);
        assert_eq!(hub.leave(ClientId::new()).await, Ok(false));
    }

    #[tokio::test]
    async fn departed_member_is_skipped() {
        let hub = start(EchoPolicy::IncludeSender);
        let mut a = join(&hub, "A", 8).await;
        let mut b = join(&hub, "B", 8).await;
        let mut c = join(&hub, "C", 8).await;

        assert_eq!(hub.leave(c.id).await, Ok(true));
        say(&hub, &a, "A", "without C").await;

        assert_eq!(next(&mut a).await.body(), "without C");
        assert_eq!(next(&mut b).await.body(), "without C");
        assert!(c.queue.recv().await.is_none());
        assert_eq!(stats(&hub).await.members, 2);
    }

    #[tokio::test]
    async fn saturated_member_is_evicted_and_others_keep_receiving() {
        const CAPACITY: usize = 256;
        let hub = start(EchoPolicy::ExcludeSender);
        let a = join(&hub, "A", CAPACITY).await;
        let mut b = join(&hub, "B", CAPACITY).await;
        let mut c = join(&hub, "C", CAPACITY).await;

        let total = CAPACITY + 1;
        let drain = tokio::spawn(async move {
            let mut bodies = Vec::with_capacity(total);
            while bodies.len() < total {
                match c.queue.recv().await {
                    Some(msg) => bodies.push(msg.body().to_string()),
                    None => break,
                }
            }
            bodies
        });

        for i in 0..total {
            say(&hub, &a, "A", &i.to_string()).await;
        }

        let Ok(Ok(bodies)) = timeout(WAIT, drain).await else {
            panic!("C should receive every message");
        };
        let expected: Vec<String> = (0..total).map(|i| i.to_string()).collect();
        assert_eq!(bodies, expected);

        assert_eq!((&mut b.removed).await, Ok(Removal::Evicted));
        let mut buffered = 0;
        while b.queue.recv().await.is_some() {
            buffered += 1;
        }
        assert_eq!(buffered, CAPACITY);

        let snapshot = stats(&hub).await;
        assert_eq!(snapshot.evicted, 1);
        assert_eq!(snapshot.dropped_deliveries, 1);
        assert_eq!(snapshot.members, 2);
        assert_eq!(hub.leave(b.id).await, Ok(false));
    }

    #[tokio::test]
    async fn dropped_endpoint_is_removed_on_next_broadcast() {
        let hub = start(EchoPolicy::IncludeSender);
        let mut a = join(&hub, "A", 8).await;
        let b = join(&hub, "B", 8).await;
        drop(b);

        say(&hub, &a, "A", "ping").await;
        assert_eq!(next(&mut a).await.body(), "ping");

        let snapshot = stats(&hub).await;
        assert_eq!(snapshot.members, 1);
        assert_eq!(snapshot.evicted, 0);
        assert_eq!(snapshot.dropped_deliveries, 1);
    }

    #[tokio::test]
    async fn shutdown_closes_every_member() {
        let (tx, rx) = oneshot::channel::<()>();
        let (hub, task) = Hub::spawn(HubSettings::default(), async move {
            let _ = rx.await;
        });
        let mut a = join(&hub, "A", 8).await;
        let mut b = join(&hub, "B", 8).await;

        let _ = tx.send(());
        let Ok(Ok(())) = timeout(WAIT, task).await else {
            panic!("hub task should finish");
        };

        assert_eq!((&mut a.removed).await, Ok(Removal::Shutdown));
        assert_eq!((&mut b.removed).await, Ok(Removal::Shutdown));
        assert!(a.queue.recv().await.is_none());
        assert_eq!(hub.stats().await, Err(HubError::Unavailable));
        assert_eq!(hub.leave(a.id).await, Err(HubError::Unavailable));
    }

    #[tokio::test]
    async fn run_returns_when_all_handles_dropped() {
        let (hub, handle) = Hub::new(HubSettings::default());
        let task = tokio::spawn(hub.run());
        drop(handle);
        assert!(timeout(WAIT, task).await.is_ok());
    }
}
