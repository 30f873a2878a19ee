//! Requester and responder state machines for the `RequestResponse`
//! interaction model.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::ProtocolError;
use crate::frame::{CancelFrame, ErrorFrame, Frame, PayloadFrame, RequestFrame, StreamId};
use crate::handler::RSocket;
use crate::payload::Payload;

use crate::proto::shared::Shared;
use crate::proto::store::{InteractionModel, Role};

/// Sends `Cancel` and frees the stream table entry if dropped before
/// [`Guard::disarm`] is called — the idiomatic stand-in for "downstream
/// cancel" when the owning future is simply dropped (a timeout, a
/// `select!` losing a race, ...).
struct Guard {
    shared: Arc<Shared>,
    stream_id: StreamId,
    armed: bool,
}

impl Guard {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for Guard {
    fn drop(&mut self) {
        if self.armed {
            let _ = self.shared.send(Frame::Cancel(CancelFrame {
                stream_id: self.stream_id,
            }));
            self.shared.finish(self.stream_id);
        }
    }
}

/// Requester side: allocate a stream, send the initiating frame, and wait
/// for exactly one terminal reply.
pub async fn requester(shared: Arc<Shared>, payload: Payload) -> Result<Payload, ProtocolError> {
    let stream_id = shared
        .allocate_stream_id()
        .map_err(|e| ProtocolError::ApplicationError(e.to_string()))?;

    let (tx, mut rx) = mpsc::channel(4);
    shared.register(stream_id, Role::Requester, InteractionModel::RequestResponse, tx);
    let guard = Guard {
        shared: shared.clone(),
        stream_id,
        armed: true,
    };

    let frame = Frame::RequestResponse(RequestFrame {
        stream_id,
        initial_request_n: None,
        follows: false,
        complete: false,
        payload,
    });
    if let Err(e) = shared.admit_initiate_request(stream_id, frame) {
        shared.finish(stream_id);
        guard.disarm();
        return Err(ProtocolError::ApplicationError(e.to_string()));
    }

    let result = match rx.recv().await {
        Some(Frame::Payload(pf)) => Ok(if pf.next { pf.payload } else { Payload::empty() }),
        Some(Frame::Error(ef)) => Err(ProtocolError::Peer {
            code: ef.code,
            message: String::from_utf8_lossy(&ef.data).into_owned(),
        }),
        Some(_) | None => Err(ProtocolError::ApplicationError(
            "stream closed without a terminal reply".into(),
        )),
    };

    shared.finish(stream_id);
    guard.disarm();
    result
}

/// Responder side: drive the handler's future to completion, replying
/// with `Payload(next, complete)` or `Error`, unless the peer cancels
/// first.
pub fn spawn_responder(
    shared: Arc<Shared>,
    handler: Arc<dyn RSocket>,
    stream_id: StreamId,
    payload: Payload,
) {
    let (tx, mut rx) = mpsc::channel(4);
    shared.register(stream_id, Role::Responder, InteractionModel::RequestResponse, tx);

    tokio::spawn(async move {
        tokio::select! {
            result = handler.request_response(payload) => {
                match result {
                    Ok(payload) => {
                        let _ = shared.send(Frame::Payload(PayloadFrame {
                            stream_id,
                            follows: false,
                            complete: true,
                            next: true,
                            payload,
                        }));
                    }
                    Err(e) => {
                        let _ = shared.send(Frame::Error(ErrorFrame {
                            stream_id,
                            code: e.wire_code(),
                            data: Bytes::from(e.to_string()),
                        }));
                    }
                }
            }
            frame = rx.recv() => {
                if matches!(frame, Some(Frame::Cancel(_))) {
                    debug!(%stream_id, "request-response cancelled before completion");
                }
            }
        }
        shared.finish(stream_id);
    });
}
