//! Connection pump: bridges one WebSocket to the hub.
//!
//! A pump joins the hub, then runs two tasks:
//!
//! - the **inbound loop** reads frames, stamps each one with the pump's
//!   identity and a receipt time, and submits it to the hub;
//! - the **outbound loop** drains the member's delivery queue onto the
//!   socket.
//!
//! The pump supervisor waits for the first of three things: either loop
//! exits, or the hub drops the member. It then tears down once: it submits a
//! single `leave` (unless the hub already removed the member) and stops the
//! remaining loop.

use std::fmt::Display;
use std::time::Duration;

use axum::extract::ws::Message as WsMessage;
use chrono::{DateTime, Utc};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::task::JoinHandle;

use super::messages::{InboundFrame, OutboundFrame};
use crate::domain::{ClientId, Identity, Message};
use crate::hub::{ClientEndpoint, ClientHandle, DeliveryQueue, HubHandle, Removal};

/// Per-connection tuning.
#[derive(Debug, Clone, Copy)]
pub struct PumpSettings {
    /// Delivery queue capacity for each member.
    pub queue_capacity: usize,
    /// How long the outbound loop may keep draining during teardown.
    pub close_grace: Duration,
}

impl Default for PumpSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            close_grace: Duration::from_secs(1),
        }
    }
}

/// Why the inbound loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundExit {
    /// Close frame or end of stream.
    Closed,
    /// The transport returned an error.
    ReadFailed,
    /// A frame could not be decoded.
    Malformed,
    /// The hub stopped accepting messages.
    HubUnavailable,
}

/// Why the outbound loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundExit {
    /// The hub closed the delivery queue. Normal shutdown.
    QueueClosed,
    /// Writing to the transport failed.
    WriteFailed,
}

/// What ended a pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpOutcome {
    /// The hub was gone before the pump could join.
    JoinFailed,
    /// The inbound loop exited first.
    Inbound(InboundExit),
    /// The outbound loop exited first.
    Outbound(OutboundExit),
    /// The hub removed the member.
    Removed(Removal),
}

/// Bridges one transport to the hub on behalf of one identity.
#[derive(Debug)]
pub struct ConnectionPump {
    hub: HubHandle,
    identity: Identity,
    settings: PumpSettings,
}

impl ConnectionPump {
    /// Creates a pump. The identity has already been validated by the
    /// session layer.
    #[must_use]
    pub fn new(hub: HubHandle, identity: Identity, settings: PumpSettings) -> Self {
        Self {
            hub,
            identity,
            settings,
        }
    }

    /// Joins the hub and pumps frames until the connection ends.
    ///
    /// `sink` and `stream` are the two halves of the transport, usually a
    /// split [`axum::extract::ws::WebSocket`].
    pub async fn run<S, R, E>(self, sink: S, stream: R) -> PumpOutcome
    where
        S: Sink<WsMessage> + Unpin + Send + 'static,
        S::Error: Display + Send,
        R: Stream<Item = Result<WsMessage, E>> + Unpin + Send + 'static,
        E: Display + Send + 'static,
    {
        let Self {
            hub,
            identity,
            settings,
        } = self;

        let (handle, endpoint) = ClientHandle::new(identity.clone(), settings.queue_capacity);
        let ClientEndpoint {
            id,
            queue,
            mut removed,
        } = endpoint;

        if let Err(err) = hub.join(handle).await {
            tracing::warn!(client_id = %id, error = %err, "could not join hub");
            let mut sink = sink;
            let _ = sink.close().await;
            return PumpOutcome::JoinFailed;
        }
        tracing::info!(client_id = %id, name = identity.name(), "connection opened");

        let mut outbound = tokio::spawn(write_loop(sink, queue, id));
        let mut inbound = tokio::spawn(read_loop(stream, hub.clone(), id, identity));

        // Removal is sent before the queue closes, so check it first.
        let outcome = tokio::select! {
            biased;
            reason = &mut removed => PumpOutcome::Removed(reason.unwrap_or(Removal::Shutdown)),
            exit = &mut inbound => PumpOutcome::Inbound(exit.unwrap_or(InboundExit::ReadFailed)),
            exit = &mut outbound => PumpOutcome::Outbound(exit.unwrap_or(OutboundExit::WriteFailed)),
        };

        match outcome {
            PumpOutcome::Inbound(_) => {
                leave(&hub, id).await;
                finish(outbound, settings.close_grace).await;
            }
            PumpOutcome::Outbound(_) => {
                inbound.abort();
                leave(&hub, id).await;
            }
            PumpOutcome::Removed(_) => {
                inbound.abort();
                finish(outbound, settings.close_grace).await;
            }
            PumpOutcome::JoinFailed => {}
        }

        tracing::info!(client_id = %id, outcome = ?outcome, "connection closed");
        outcome
    }
}

/// Submits the one `leave` of this pump's teardown.
async fn leave(hub: &HubHandle, id: ClientId) {
    if let Err(err) = hub.leave(id).await {
        tracing::debug!(client_id = %id, error = %err, "leave not delivered");
    }
}

/// Gives the outbound loop `grace` to drain, then aborts it.
async fn finish(mut task: JoinHandle<OutboundExit>, grace: Duration) {
    if tokio::time::timeout(grace, &mut task).await.is_err() {
        task.abort();
    }
}

async fn read_loop<R, E>(
    mut stream: R,
    hub: HubHandle,
    id: ClientId,
    identity: Identity,
) -> InboundExit
where
    R: Stream<Item = Result<WsMessage, E>> + Unpin,
    E: Display,
{
    let mut clock = ReceiptClock::default();

    while let Some(frame) = stream.next().await {
        let decoded = match frame {
            Ok(WsMessage::Text(text)) => InboundFrame::from_text(text.as_str()),
            Ok(WsMessage::Binary(bytes)) => InboundFrame::from_bytes(&bytes),
            Ok(WsMessage::Ping(_) | WsMessage::Pong(_)) => continue,
            Ok(WsMessage::Close(_)) => return InboundExit::Closed,
            Err(err) => {
                tracing::debug!(client_id = %id, error = %err, "websocket read failed");
                return InboundExit::ReadFailed;
            }
        };

        let frame = match decoded {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!(client_id = %id, error = %err, "dropping connection on bad frame");
                return InboundExit::Malformed;
            }
        };

        let message = Message::new(identity.name(), frame.body, clock.stamp());
        if hub.submit(id, message).await.is_err() {
            return InboundExit::HubUnavailable;
        }
    }

    InboundExit::Closed
}

async fn write_loop<S>(mut sink: S, mut queue: DeliveryQueue, id: ClientId) -> OutboundExit
where
    S: Sink<WsMessage> + Unpin,
    S::Error: Display,
{
    while let Some(message) = queue.recv().await {
        let text = match OutboundFrame::encode(&message) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(client_id = %id, error = %err, "skipping unencodable message");
                continue;
            }
        };
        if let Err(err) = sink.send(WsMessage::text(text)).await {
            tracing::debug!(client_id = %id, error = %err, "websocket write failed");
            return OutboundExit::WriteFailed;
        }
    }

    // Best effort: the peer may already be gone.
    let _ = sink.send(WsMessage::Close(None)).await;
    let _ = sink.close().await;
    OutboundExit::QueueClosed
}

/// Receipt timestamps that never go backwards within one connection.
#[derive(Debug, Default)]
struct ReceiptClock {
    last: Option<DateTime<Utc>>,
}

impl ReceiptClock {
    fn stamp(&mut self) -> DateTime<Utc> {
        self.stamp_at(Utc::now())
    }

    fn stamp_at(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let stamped = match self.last {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last = Some(stamped);
        stamped
    }
}
