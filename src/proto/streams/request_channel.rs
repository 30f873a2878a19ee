//! Requester and responder state machines for the `RequestChannel`
//! interaction model: two independent half-streams composed on one
//! stream id. `drive_channel` runs both halves concurrently and only
//! returns (finishing the stream) once both are terminal.

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

/// Given to the consumer of the inbound half. `request(n)` grants the
/// peer's outbound production more credit (a `RequestN` frame); `cancel`
/// tells the peer to stop and cancels our own outbound production too.
struct RemoteSubscription {
    shared: Arc<Shared>,
    stream_id: StreamId,
    local_subscription: Arc<Mutex<Option<Box<dyn Subscription>>>>,
}

impl Subscription for RemoteSubscription {
    fn request(&self, n: u32) {
        let _ = self.shared.send(Frame::RequestN(RequestNFrame {
            stream_id: self.stream_id,
            request_n: n,
        }));
    }

    fn cancel(&self) {
        let _ = self.shared.send(Frame::Cancel(CancelFrame {
            stream_id: self.stream_id,
        }));
        if let Some(sub) = self.local_subscription.lock().unwrap().as_ref() {
            sub.cancel();
        }
    }
}

/// Runs both halves of an open channel stream to completion:
/// `local_publisher` (our outgoing production, primed with
/// `initial_local_request_n` units of credit) and `remote_subscriber`
/// (the consumer of what the peer sends us, subscribed with a
/// [`RemoteSubscription`] so it can ask for more or cancel). Frees the
/// stream table entry once both halves are done.
pub(super) async fn drive_channel(
    shared: Arc<Shared>,
    stream_id: StreamId,
    mut rx: mpsc::Receiver<Frame>,
    local_publisher: Option<Box<dyn Publisher>>,
    mut remote_subscriber: Box<dyn Subscriber>,
    initial_local_request_n: u32,
) {
    let local_subscription_slot = Arc::new(Mutex::new(None));

    remote_subscriber
        .on_subscribe(Box::new(RemoteSubscription {
            shared: shared.clone(),
            stream_id,
            local_subscription: local_subscription_slot.clone(),
        }))
        .await;

    let outbound = async {
        if let Some(publisher) = local_publisher {
            let adapter = Box::new(OutboundAdapter {
                shared: shared.clone(),
                stream_id,
                subscription_slot: local_subscription_slot.clone(),
                initial_request_n: initial_local_request_n,
            });
            publisher.subscribe(adapter).await;
        }
    };

    let inbound = async {
        loop {
            match rx.recv().await {
                Some(Frame::Payload(pf)) => {
                    let is_complete = pf.complete;
                    if pf.next {
                        remote_subscriber.on_next(pf.payload, is_complete).await;
                    }
                    if is_complete {
                        remote_subscriber.on_complete().await;
                        break;
                    }
                }
                Some(Frame::RequestN(rn)) => {
                    if let Some(sub) = local_subscription_slot.lock().unwrap().as_ref() {
                        sub.request(rn.request_n);
                    }
                }
                Some(Frame::Cancel(_)) => {
                    if let Some(sub) = local_subscription_slot.lock().unwrap().as_ref() {
                        sub.cancel();
                    }
                    break;
                }
                Some(Frame::Error(ef)) => {
                    remote_subscriber
                        .on_error(ProtocolError::Peer {
                            code: ef.code,
                            message: String::from_utf8_lossy(&ef.data).into_owned(),
                        })
                        .await;
                    break;
                }
                Some(_) => {}
                None => break,
            }
        }
    };

    tokio::join!(outbound, inbound);
    shared.finish(stream_id);
}

pub struct RequestChannelPublisher {
    shared: Arc<Shared>,
    payload: Payload,
    initial_request_n: u32,
    local_publisher: Option<Box<dyn Publisher>>,
}

impl RequestChannelPublisher {
    pub fn new(
        shared: Arc<Shared>,
        payload: Payload,
        initial_request_n: u32,
        local_publisher: Option<Box<dyn Publisher>>,
    ) -> Self {
        RequestChannelPublisher {
            shared,
            payload,
            initial_request_n,
            local_publisher,
        }
    }
}

#[async_trait]
impl Publisher for RequestChannelPublisher {
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

        let (tx, rx) = mpsc::channel(16);
        self.shared
            .register(stream_id, Role::Requester, InteractionModel::RequestChannel, tx);

        let frame = Frame::RequestChannel(RequestFrame {
            stream_id,
            initial_request_n: Some(self.initial_request_n),
            follows: false,
            complete: self.local_publisher.is_none(),
            payload: self.payload,
        });
        if let Err(e) = self.shared.admit_initiate_request(stream_id, frame) {
            self.shared.finish(stream_id);
            subscriber
                .on_error(ProtocolError::ApplicationError(e.to_string()))
                .await;
            return;
        }

        drive_channel(self.shared, stream_id, rx, self.local_publisher, subscriber, 0).await;
    }
}

/// Responder side: the requester already opened the stream, so we only
/// need the handler's halves and the frame's `initial_request_n`.
pub fn spawn_responder(
    shared: Arc<Shared>,
    handler: Arc<dyn RSocket>,
    stream_id: StreamId,
    payload: Payload,
    initial_request_n: u32,
) {
    let (tx, rx) = mpsc::channel(16);
    shared.register(stream_id, Role::Responder, InteractionModel::RequestChannel, tx);

    tokio::spawn(async move {
        let (local_publisher, remote_subscriber) =
            handler.request_channel(payload, initial_request_n).await;
        drive_channel(
            shared,
            stream_id,
            rx,
            Some(local_publisher),
            remote_subscriber,
            initial_request_n,
        )
        .await;
    });
}
