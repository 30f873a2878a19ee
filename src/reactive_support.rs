//! Small stock [`Publisher`]/[`Subscriber`] implementations used as
//! defaults by [`crate::handler::RSocket`] and by the stream handlers when
//! a half of a channel has nothing to produce or nothing to do with what
//! it receives.

use async_trait::async_trait;

use crate::error::ProtocolError;
use crate::payload::Payload;
use crate::reactive::{Publisher, Subscriber, Subscription};

/// A publisher that immediately errors any subscriber, used as the default
/// `request_stream`/`request_channel` behavior for handlers that do not
/// implement those interactions.
pub struct RejectingPublisher {
    message: &'static str,
}

impl RejectingPublisher {
    pub fn new(message: &'static str) -> Self {
        RejectingPublisher { message }
    }
}

#[async_trait]
impl Publisher for RejectingPublisher {
    async fn subscribe(self: Box<Self>, mut subscriber: Box<dyn Subscriber>) {
        subscriber
            .on_error(ProtocolError::ApplicationError(self.message.to_string()))
            .await;
    }
}

/// A subscriber that drops everything it receives, used as the default
/// remote-to-local half of `request_channel` for handlers that do not
/// implement it.
pub struct DiscardingSubscriber;

#[async_trait]
impl Subscriber for DiscardingSubscriber {
    async fn on_subscribe(&mut self, subscription: Box<dyn Subscription>) {
        subscription.cancel();
    }
    async fn on_next(&mut self, _payload: Payload, _is_complete: bool) {}
    async fn on_complete(&mut self) {}
    async fn on_error(&mut self, _error: ProtocolError) {}
}
