//! Selects among several connected peers by a pluggable strategy. Pure
//! delegation: every `RSocket` method forwards to whichever peer
//! `Strategy::select` returns for that call.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ProtocolError;
use crate::frame::ErrorCode;
use crate::handler::RSocket;
use crate::payload::Payload;
use crate::reactive::{Publisher, Subscriber};

/// Chooses a peer and manages the lifecycle of the underlying peer pool.
/// Connection-establishment policy (round robin, least-loaded, ...) lives
/// entirely in the implementor; this core only calls `select` once per
/// request.
#[async_trait]
pub trait Strategy: Send + Sync {
    async fn select(&self) -> Arc<dyn RSocket>;
    async fn connect(&self) -> Result<(), ProtocolError>;
    async fn close(&self);
}

pub struct LoadBalancedRSocket {
    strategy: Arc<dyn Strategy>,
}

impl LoadBalancedRSocket {
    pub fn new(strategy: Arc<dyn Strategy>) -> Self {
        LoadBalancedRSocket { strategy }
    }

    pub async fn connect(&self) -> Result<(), ProtocolError> {
        self.strategy.connect().await
    }

    pub async fn close(&self) {
        self.strategy.close().await
    }
}

#[async_trait]
impl RSocket for LoadBalancedRSocket {
    async fn on_setup(
        &self,
        data_mime_type: &str,
        metadata_mime_type: &str,
        payload: Payload,
    ) -> Result<(), String> {
        self.strategy
            .select()
            .await
            .on_setup(data_mime_type, metadata_mime_type, payload)
            .await
    }

    async fn on_metadata_push(&self, metadata: Bytes) {
        self.strategy.select().await.on_metadata_push(metadata).await
    }

    async fn on_error(&self, code: ErrorCode, payload: Payload) {
        self.strategy.select().await.on_error(code, payload).await
    }

    async fn request_response(&self, payload: Payload) -> Result<Payload, ProtocolError> {
        self.strategy.select().await.request_response(payload).await
    }

    async fn request_fire_and_forget(&self, payload: Payload) {
        self.strategy
            .select()
            .await
            .request_fire_and_forget(payload)
            .await
    }

    async fn request_stream(&self, payload: Payload) -> Box<dyn Publisher> {
        self.strategy.select().await.request_stream(payload).await
    }

    async fn request_channel(
        &self,
        payload: Payload,
        initial_request_n: u32,
    ) -> (Box<dyn Publisher>, Box<dyn Subscriber>) {
        self.strategy
            .select()
            .await
            .request_channel(payload, initial_request_n)
            .await
    }
}
