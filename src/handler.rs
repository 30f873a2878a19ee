//! The application-facing handler surface. Routing, metadata parsing, and
//! composite metadata are the embedder's concern — the core only ever
//! hands the handler parsed [`Payload`]s and expects futures or
//! [`Publisher`]s back.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ProtocolError;
use crate::frame::ErrorCode;
use crate::payload::Payload;
use crate::reactive::{Publisher, Subscriber};

/// Implemented by applications and driven by the connection engine. Every
/// method has a default that behaves as a well-mannered peer that simply
/// does not support the interaction (fire-and-forget and metadata-push
/// default to doing nothing; the request methods default to rejecting).
#[async_trait]
pub trait RSocket: Send + Sync {
    /// Called once, on the responder side, when a `Setup` frame arrives.
    /// Returning `Err` causes the engine to reject the connection with
    /// `REJECTED_SETUP` and close it.
    async fn on_setup(
        &self,
        data_mime_type: &str,
        metadata_mime_type: &str,
        payload: Payload,
    ) -> Result<(), String> {
        let _ = (data_mime_type, metadata_mime_type, payload);
        Ok(())
    }

    /// Called when a `MetadataPush` frame arrives.
    async fn on_metadata_push(&self, metadata: Bytes) {
        let _ = metadata;
    }

    /// Called when a connection-level `Error` frame arrives.
    async fn on_error(&self, code: ErrorCode, payload: Payload) {
        let _ = (code, payload);
    }

    async fn request_response(&self, payload: Payload) -> Result<Payload, ProtocolError> {
        let _ = payload;
        Err(ProtocolError::ApplicationError(
            "request_response not supported by this peer".into(),
        ))
    }

    async fn request_fire_and_forget(&self, payload: Payload) {
        let _ = payload;
    }

    async fn request_stream(&self, payload: Payload) -> Box<dyn Publisher> {
        let _ = payload;
        Box::new(crate::reactive_support::RejectingPublisher::new(
            "request_stream not supported by this peer",
        ))
    }

    /// `initial_request_n` is the requester's initial demand for this
    /// handler's own outgoing half. Returns the publisher producing that
    /// outgoing half and the subscriber that receives the requester's
    /// incoming half.
    async fn request_channel(
        &self,
        payload: Payload,
        initial_request_n: u32,
    ) -> (Box<dyn Publisher>, Box<dyn Subscriber>) {
        let _ = (payload, initial_request_n);
        (
            Box::new(crate::reactive_support::RejectingPublisher::new(
                "request_channel not supported by this peer",
            )),
            Box::new(crate::reactive_support::DiscardingSubscriber),
        )
    }
}
