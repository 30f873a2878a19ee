use thiserror::Error;

use crate::frame::{ErrorCode, StreamId};

/// Malformed or unparseable frame data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame header too short")]
    Short,

    #[error("stream id {0} has the reserved high bit set")]
    ReservedBitSet(u32),

    #[error("unknown frame type {0}")]
    UnknownFrameType(u8),

    #[error("frame length {0} exceeds the maximum frame size")]
    TooLarge(usize),

    #[error("`follows` set on a frame type that cannot be fragmented")]
    UnexpectedFollows,

    #[error("metadata length prefix exceeds the remaining frame payload")]
    InvalidMetadataLength,

    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for FrameError {
    fn from(err: std::io::Error) -> Self {
        FrameError::Io(err.to_string())
    }
}

/// Violations of RSocket stream or connection protocol, surfaced as an
/// `Error` frame on the offending stream (or connection) rather than
/// terminating the transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("stream id {0} is already registered")]
    StreamIdInUse(StreamId),

    #[error("no stream registered for id {0}")]
    UnknownStream(StreamId),

    #[error("fragment cache entry for stream {0} has a different frame type than the incoming fragment")]
    FragmentTypeMismatch(StreamId),

    #[error("`follows` flag present with no cached fragment for stream {0}")]
    NoSuchFragment(StreamId),

    #[error("lease is required but the peer did not advertise a lease publisher")]
    UnsupportedSetup,

    #[error("responder lease exhausted; stream {0} rejected")]
    LeaseExhausted(StreamId),

    #[error("setup was rejected by the handler: {0}")]
    RejectedSetup(String),

    #[error("resume is not supported by this peer")]
    RejectedResume,

    #[error("stream id exhausted: no ids of the required parity remain")]
    StreamIdExhausted,

    #[error("peer error {code:?}: {message}")]
    Peer { code: ErrorCode, message: String },

    #[error("application error: {0}")]
    ApplicationError(String),
}

impl ProtocolError {
    pub fn wire_code(&self) -> ErrorCode {
        match self {
            ProtocolError::UnsupportedSetup => ErrorCode::UnsupportedSetup,
            ProtocolError::RejectedSetup(_) => ErrorCode::RejectedSetup,
            ProtocolError::RejectedResume => ErrorCode::RejectedResume,
            ProtocolError::LeaseExhausted(_) => ErrorCode::Rejected,
            ProtocolError::ApplicationError(_) => ErrorCode::ApplicationError,
            ProtocolError::Peer { code, .. } => *code,
            _ => ErrorCode::ConnectionError,
        }
    }
}

/// Errors raised synchronously from the requester-facing API, never sent on
/// the wire.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocalError {
    #[error("pending-request queue is full")]
    QueueFull,

    #[error("stream id space is exhausted")]
    StreamIdExhausted,

    #[error("connection is closed")]
    ConnectionClosed,
}

/// Wraps the transport's own error type so the engine can carry it without
/// being generic over it everywhere.
#[derive(Debug, Error)]
#[error("transport error: {0}")]
pub struct TransportError(#[from] pub Box<dyn std::error::Error + Send + Sync>);

impl Clone for TransportError {
    fn clone(&self) -> Self {
        TransportError(Box::<dyn std::error::Error + Send + Sync>::from(
            self.0.to_string(),
        ))
    }
}

/// Top-level error returned by [`crate::Connection::run`].
#[derive(Debug, Error, Clone)]
pub enum ConnectionError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Local(#[from] LocalError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
