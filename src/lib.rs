//! Core RSocket protocol engine.
//!
//! This crate implements the connection-level machinery of RSocket: frame
//! codec and fragmentation, stream id allocation and routing, the
//! requester/responder state machines for each interaction model, lease
//! admission control, keepalive, and the send/receive pumps that drive a
//! connection to completion. It does not implement a concrete transport
//! (TCP, WebSocket, QUIC) or a routing/metadata layer — those are supplied
//! by the embedder through the [`Transport`] and [`RSocket`] traits.

mod codec;
mod config;
mod error;
mod fragment;
mod frame;
mod handler;
mod load_balancer;
mod payload;
mod proto;
mod reactive;
mod reactive_support;
mod transport;

pub use config::{ConfigError, ConnectionConfig, ConnectionConfigBuilder, LeasePublisher};
pub use error::{ConnectionError, FrameError, LocalError, ProtocolError, TransportError};
pub use frame::{
    CancelFrame, ErrorCode, ErrorFrame, Frame, FrameType, KeepaliveFrame, LeaseFrame,
    MetadataPushFrame, PayloadFrame, RequestFrame, RequestNFrame, ResumeFrame, ResumeOkFrame,
    SetupFrame, StreamId,
};
pub use handler::RSocket;
pub use load_balancer::{LoadBalancedRSocket, Strategy};
pub use payload::Payload;
pub use proto::{Connection, ConnectionHandle};
pub use reactive::{Publisher, Subscriber, Subscription};
pub use transport::Transport;
