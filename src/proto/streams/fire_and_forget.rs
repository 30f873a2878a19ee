//! `RequestFireAndForget`: no reply is ever expected, so neither side
//! keeps a stream table entry alive past the initiating frame.

use std::sync::Arc;

use crate::error::LocalError;
use crate::frame::{Frame, RequestFrame};
use crate::handler::RSocket;
use crate::payload::Payload;

use crate::proto::shared::Shared;

/// Allocate an id, emit the frame (subject to lease admission), and free
/// the id immediately — there is nothing further to track.
pub fn requester(shared: &Shared, payload: Payload) -> Result<(), LocalError> {
    let stream_id = shared.allocate_stream_id()?;
    let frame = Frame::RequestFireAndForget(RequestFrame {
        stream_id,
        initial_request_n: None,
        follows: false,
        complete: false,
        payload,
    });
    let result = shared.admit_initiate_request(stream_id, frame);
    shared.finish(stream_id);
    result
}

/// Hand the payload to the handler in a detached task; the caller never
/// learns whether it succeeded.
pub fn spawn_responder(handler: Arc<dyn RSocket>, payload: Payload) {
    tokio::spawn(async move {
        handler.request_fire_and_forget(payload).await;
    });
}
