//! The abstract transport the core consumes. Concrete bindings (TCP,
//! WebSocket, QUIC) live outside this crate; all the engine needs is
//! something that can hand back already-decoded [`Frame`]s and accept
//! already-validated ones to send.

use async_trait::async_trait;

use crate::frame::Frame;

/// A connected, ordered, reliable duplex channel for RSocket frames.
#[async_trait]
pub trait Transport: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send one frame. May be called back-to-back without an intervening
    /// `recv_frame`; implementations that batch writes should flush when
    /// the engine calls [`Transport::on_send_queue_empty`].
    async fn send_frame(&mut self, frame: Frame) -> Result<(), Self::Error>;

    /// Receive the next frame. `Ok(None)` signals an orderly end of
    /// stream; the receive pump treats it as connection close, not an
    /// error.
    async fn recv_frame(&mut self) -> Result<Option<Frame>, Self::Error>;

    /// Close the transport. Must be safe to call more than once.
    async fn close(&mut self) -> Result<(), Self::Error>;

    /// Invoked by the send pump immediately after it has drained the
    /// outbound queue, giving batching transports a chance to flush.
    /// Default is a no-op.
    async fn on_send_queue_empty(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
