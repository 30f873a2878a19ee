//! Requester and responder state machines for the `RequestStream`
//! interaction model.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::ProtocolError;
use crate::frame::{CancelFrame, Frame, RequestFrame, RequestNFrame, StreamId};
use crate::handler::RSocket;
use crate::payload::Payload;
use crate::reactive::{Publisher, Subscriber, Subscription};

use crate::proto::shared::Shared;
use crate::proto::store::{InteractionModel, Role};

use super::outbound_adapter::OutboundAdapter;

/// Handed to the caller's [`Subscriber`] on `on_subscribe`. The first
/// `request(n)` call sends the initiating `RequestStream` frame (with
/// `initial_request_n = n`); every later call sends a plain `RequestN`.
/// This is the idiomatic mapping of "subscribe sends the initial frame"
/// onto a reactive-streams `Subscription`, whose standard contract is
/// that demand is signalled by `request`, not by `subscribe` itself.
struct RequesterSubscription {
    shared: Arc<Shared>,
    stream_id: StreamId,
    payload: Mutex<Option<Payload>>,
}

impl Subscription for RequesterSubscription {
    fn request(&self, n: u32) {
        let mut slot = self.payload.lock().unwrap();
        if let Some(payload) = slot.take() {
            let frame = Frame::RequestStream(RequestFrame {
                stream_id: self.stream_id,
                initial_request_n: Some(n),
                follows: false,
                complete: false,
                payload,
            });
            let _ = self.shared.admit_initiate_request(self.stream_id, frame);
        } else {
            let _ = self.shared.send(Frame::RequestN(RequestNFrame {
                stream_id: self.stream_id,
                request_n: n,
            }));
        }
    }

    fn cancel(&self) {
        let _ = self.shared.send(Frame::Cancel(CancelFrame {
            stream_id: self.stream_id,
        }));
        self.shared.finish(self.stream_id);
    }
}

pub struct RequestStreamPublisher {
    shared: Arc<Shared>,
    payload: Payload,
}

impl RequestStreamPublisher {
    pub fn new(shared: Arc<Shared>, payload: Payload) -> Self {
        RequestStreamPublisher { shared, payload }
    }
}

#[async_trait]
impl Publisher for RequestStreamPublisher {
    async fn subscribe(self: Box<Self>, mut subscriber: Box<dyn Subscriber>) {
        let stream_id = match self.shared.allocate_stream_id() {
            Ok(id) => id,
            Err(e) => {
                subscriber
                    .on_error(ProtocolError::ApplicationError(e.to_string()))
                    .await;
                return;
            }
        };

        let (tx, mut rx) = mpsc::channel(16);
        self.shared
            .register(stream_id, Role::Requester, InteractionModel::RequestStream, tx);

        let subscription = Box::new(RequesterSubscription {
            shared: self.shared.clone(),
            stream_id,
            payload: Mutex::new(Some(self.payload)),
        });
        subscriber.on_subscribe(subscription).await;

        loop {
            match rx.recv().await {
                Some(Frame::Payload(pf)) => {
                    if pf.next {
                        subscriber.on_next(pf.payload, pf.complete).await;
                    }
                    if pf.complete {
                        subscriber.on_complete().await;
                        break;
                    }
                }
                Some(Frame::Error(ef)) => {
                    subscriber
                        .on_error(ProtocolError::Peer {
                            code: ef.code,
                            message: String::from_utf8_lossy(&ef.data).into_owned(),
                        })
                        .await;
                    break;
                }
                Some(_) => {}
                None => {
                    subscriber.on_complete().await;
                    break;
                }
            }
        }

        self.shared.finish(stream_id);
    }
}

/// Responder side: subscribe to the handler's publisher with the
/// requester's `initial_request_n`, translating `on_next`/`on_complete`/
/// `on_error` into outbound frames, and applying inbound `RequestN`/
/// `Cancel` to the downstream subscription.
pub fn spawn_responder(
    shared: Arc<Shared>,
    handler: Arc<dyn RSocket>,
    stream_id: StreamId,
    payload: Payload,
    initial_request_n: u32,
) {
    let (tx, mut rx) = mpsc::channel(16);
    shared.register(stream_id, Role::Responder, InteractionModel::RequestStream, tx);

    tokio::spawn(async move {
        let publisher = handler.request_stream(payload).await;
        let subscription_slot = Arc::new(Mutex::new(None));
        let adapter = Box::new(OutboundAdapter {
            shared: shared.clone(),
            stream_id,
            subscription_slot: subscription_slot.clone(),
            initial_request_n,
        });

        let pump = async {
            while let Some(frame) = rx.recv().await {
                match frame {
                    Frame::RequestN(rn) => {
                        if let Some(sub) = subscription_slot.lock().unwrap().as_ref() {
                            sub.request(rn.request_n);
                        }
                    }
                    Frame::Cancel(_) => {
                        if let Some(sub) = subscription_slot.lock().unwrap().as_ref() {
                            sub.cancel();
                        }
                        break;
                    }
                    _ => {}
                }
            }
        };

        tokio::select! {
            _ = publisher.subscribe(adapter) => {}
            _ = pump => {}
        }
        shared.finish(stream_id);
    });
}
