//! The minimal reactive-streams shape the core needs to talk to handler
//! implementations: `Publisher::subscribe`, `Subscription::request`/
//! `cancel`, and the `Subscriber` callbacks. This is deliberately not a
//! reactive-streams crate dependency (see the design notes in the
//! specification this core follows) — just the handful of methods the
//! requester/responder state machines actually call.

use async_trait::async_trait;

use crate::error::ProtocolError;
use crate::payload::Payload;

/// Demand control handed to a [`Subscriber`] by whatever it subscribed to.
/// `request` and `cancel` are synchronous and may be called from any
/// context (including a `Drop` impl), since the standard demand semantics
/// require the producer to honor them without the caller waiting on a
/// future.
pub trait Subscription: Send + Sync {
    /// Signal interest in up to `n` additional items. Calls accumulate:
    /// the producer must never treat a later call as replacing an earlier
    /// one.
    fn request(&self, n: u32);

    /// Signal that no further items are wanted. Idempotent.
    fn cancel(&self);
}

/// Receives items from a [`Publisher`] after a successful `subscribe`.
#[async_trait]
pub trait Subscriber: Send {
    /// Called exactly once, before any other method, with the
    /// subscription used to signal demand.
    async fn on_subscribe(&mut self, subscription: Box<dyn Subscription>);

    /// Called once per item. `is_complete` is true when this item is also
    /// the last one (the RSocket wire allows `next` and `complete` to be
    /// set on the same frame).
    async fn on_next(&mut self, payload: Payload, is_complete: bool);

    /// Called at most once, after the last `on_next`, if the stream ended
    /// successfully without a trailing `on_next(.., is_complete = true)`.
    async fn on_complete(&mut self);

    /// Called at most once; terminal. No further callbacks follow.
    async fn on_error(&mut self, error: ProtocolError);
}

/// A (possibly cold) source of items. `subscribe` is called at most once
/// per `Publisher` instance in this core's usage.
#[async_trait]
pub trait Publisher: Send {
    async fn subscribe(self: Box<Self>, subscriber: Box<dyn Subscriber>);
}
