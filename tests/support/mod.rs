//! Shared fixtures for the integration tests: an in-memory duplex
//! transport, a small echoing/counting `RSocket` handler, and a
//! `Subscriber` that forwards everything it receives onto a channel so
//! a test can assert on it from the outside.

#![allow(dead_code)]

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use rsocket_core::{
    Connection, ConnectionConfig, ConnectionHandle, Frame, LeasePublisher, Payload, ProtocolError,
    Publisher, RSocket, Subscriber, Subscription, Transport,
};

#[derive(Debug, Error)]
#[error("the other end of the duplex transport was dropped")]
pub struct PeerGone;

/// Two ends of an in-process pipe of already-decoded frames, standing in
/// for a real socket. Each end's `send_frame` feeds the other's
/// `recv_frame`.
pub struct DuplexTransport {
    tx: mpsc::UnboundedSender<Frame>,
    rx: mpsc::UnboundedReceiver<Frame>,
}

impl DuplexTransport {
    pub fn pair() -> (DuplexTransport, DuplexTransport) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (
            DuplexTransport { tx: a_tx, rx: b_rx },
            DuplexTransport { tx: b_tx, rx: a_rx },
        )
    }
}

#[async_trait]
impl Transport for DuplexTransport {
    type Error = PeerGone;

    async fn send_frame(&mut self, frame: Frame) -> Result<(), Self::Error> {
        self.tx.send(frame).map_err(|_| PeerGone)
    }

    async fn recv_frame(&mut self) -> Result<Option<Frame>, Self::Error> {
        Ok(self.rx.recv().await)
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Wires up two connected engines over a [`DuplexTransport`] pair and
/// spawns both on the current runtime, returning the requester-facing
/// handle for each side.
pub fn spawn_pair(
    handler_a: Arc<dyn RSocket>,
    config_a: ConnectionConfig,
    handler_b: Arc<dyn RSocket>,
    config_b: ConnectionConfig,
) -> (ConnectionHandle, ConnectionHandle) {
    let (transport_a, transport_b) = DuplexTransport::pair();
    let (handle_a, conn_a) = Connection::new(transport_a, config_a, handler_a, true);
    let (handle_b, conn_b) = Connection::new(transport_b, config_b, handler_b, false);
    tokio::spawn(conn_a.run());
    tokio::spawn(conn_b.run());
    (handle_a, handle_b)
}

/// Upper-cases whatever data it is given, and for `request_stream` treats
/// the payload as an ASCII count of items to emit (defaulting to 3),
/// handed out through a [`CountingPublisher`].
pub struct EchoRSocket;

#[async_trait]
impl RSocket for EchoRSocket {
    async fn request_response(&self, payload: Payload) -> Result<Payload, ProtocolError> {
        let upper = payload
            .data()
            .map(|d| d.to_ascii_uppercase())
            .unwrap_or_default();
        Ok(Payload::from_data(upper))
    }

    async fn request_stream(&self, payload: Payload) -> Box<dyn Publisher> {
        let total = payload
            .data()
            .and_then(|d| std::str::from_utf8(d).ok())
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(3);
        Box::new(CountingPublisher { total })
    }
}

struct CountingSubscription {
    remaining: Arc<AtomicU32>,
    cancelled: Arc<AtomicBool>,
}

impl Subscription for CountingSubscription {
    fn request(&self, n: u32) {
        self.remaining.fetch_add(n, Ordering::SeqCst);
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Emits `total` items, one per unit of outstanding demand, polling for
/// new demand every few milliseconds. A test fixture's stand-in for a
/// real producer wired through backpressure-aware I/O.
pub struct CountingPublisher {
    pub total: u32,
}

#[async_trait]
impl Publisher for CountingPublisher {
    async fn subscribe(self: Box<Self>, mut subscriber: Box<dyn Subscriber>) {
        let remaining = Arc::new(AtomicU32::new(0));
        let cancelled = Arc::new(AtomicBool::new(false));
        subscriber
            .on_subscribe(Box::new(CountingSubscription {
                remaining: remaining.clone(),
                cancelled: cancelled.clone(),
            }))
            .await;

        let mut emitted = 0u32;
        while emitted < self.total {
            if cancelled.load(Ordering::SeqCst) {
                return;
            }
            if remaining.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
                continue;
            }
            remaining.fetch_sub(1, Ordering::SeqCst);
            emitted += 1;
            let is_last = emitted == self.total;
            subscriber
                .on_next(Payload::from_data(emitted.to_string()), is_last)
                .await;
            if is_last {
                return;
            }
        }
    }
}

pub enum StreamEvent {
    Next(Payload, bool),
    Complete,
    Error(ProtocolError),
}

impl fmt::Debug for StreamEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamEvent::Next(_, last) => write!(f, "Next(.., {last})"),
            StreamEvent::Complete => write!(f, "Complete"),
            StreamEvent::Error(e) => write!(f, "Error({e})"),
        }
    }
}

/// Forwards every callback onto a channel and hands the subscription it
/// receives out through a one-shot, so the test can drive demand and
/// cancellation directly instead of baking a policy into the subscriber.
pub struct ChannelSubscriber {
    events: mpsc::UnboundedSender<StreamEvent>,
    subscription_tx: Option<oneshot::Sender<Box<dyn Subscription>>>,
}

impl ChannelSubscriber {
    pub fn new() -> (
        Self,
        mpsc::UnboundedReceiver<StreamEvent>,
        oneshot::Receiver<Box<dyn Subscription>>,
    ) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (sub_tx, sub_rx) = oneshot::channel();
        (
            ChannelSubscriber {
                events: events_tx,
                subscription_tx: Some(sub_tx),
            },
            events_rx,
            sub_rx,
        )
    }
}

#[async_trait]
impl Subscriber for ChannelSubscriber {
    async fn on_subscribe(&mut self, subscription: Box<dyn Subscription>) {
        if let Some(tx) = self.subscription_tx.take() {
            let _ = tx.send(subscription);
        }
    }

    async fn on_next(&mut self, payload: Payload, is_complete: bool) {
        let _ = self.events.send(StreamEvent::Next(payload, is_complete));
    }

    async fn on_complete(&mut self) {
        let _ = self.events.send(StreamEvent::Complete);
    }

    async fn on_error(&mut self, error: ProtocolError) {
        let _ = self.events.send(StreamEvent::Error(error));
    }
}

/// A [`LeasePublisher`] the test drives by hand: `subscribe` hands out the
/// receiving half exactly once, and the test holds the matching sender.
pub struct TestLeasePublisher {
    rx: Mutex<Option<mpsc::Receiver<(u32, Duration)>>>,
}

pub fn test_lease_publisher() -> (Arc<TestLeasePublisher>, mpsc::Sender<(u32, Duration)>) {
    let (tx, rx) = mpsc::channel(8);
    (
        Arc::new(TestLeasePublisher {
            rx: Mutex::new(Some(rx)),
        }),
        tx,
    )
}

impl LeasePublisher for TestLeasePublisher {
    fn subscribe(&self) -> mpsc::Receiver<(u32, Duration)> {
        self.rx.lock().unwrap().take().expect("subscribed more than once")
    }
}
