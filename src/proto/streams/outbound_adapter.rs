//! Adapts a handler- or caller-supplied [`Publisher`]'s production into
//! outbound wire frames on a single stream: `on_next` becomes a `Payload`
//! frame, `on_complete`/`on_error` close the half. Shared between the
//! `RequestStream` responder and both sides of `RequestChannel`, since the
//! "local production flows out as frames" shape is identical for each.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ProtocolError;
use crate::frame::{ErrorFrame, Frame, PayloadFrame, StreamId};
use crate::payload::Payload;
use crate::reactive::{Subscriber, Subscription};

use crate::proto::shared::Shared;

pub(super) struct OutboundAdapter {
    pub shared: Arc<Shared>,
    pub stream_id: StreamId,
    pub subscription_slot: Arc<Mutex<Option<Box<dyn Subscription>>>>,
    pub initial_request_n: u32,
}

#[async_trait]
impl Subscriber for OutboundAdapter {
    async fn on_subscribe(&mut self, subscription: Box<dyn Subscription>) {
        if self.initial_request_n > 0 {
            subscription.request(self.initial_request_n);
        }
        *self.subscription_slot.lock().unwrap() = Some(subscription);
    }

    async fn on_next(&mut self, payload: Payload, is_complete: bool) {
        let _ = self.shared.send(Frame::Payload(PayloadFrame {
            stream_id: self.stream_id,
            follows: false,
            complete: is_complete,
            next: true,
            payload,
        }));
    }

    async fn on_complete(&mut self) {
        let _ = self.shared.send(Frame::Payload(PayloadFrame {
            stream_id: self.stream_id,
            follows: false,
            complete: true,
            next: false,
            payload: Payload::empty(),
        }));
    }

    async fn on_error(&mut self, error: ProtocolError) {
        let _ = self.shared.send(Frame::Error(ErrorFrame {
            stream_id: self.stream_id,
            code: error.wire_code(),
            data: Bytes::from(error.to_string()),
        }));
    }
}
