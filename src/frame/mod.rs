//! Frame types and their binary encoding. Frame bodies are defined one per
//! module; this module ties them together into the closed [`Frame`]
//! enumeration and provides the top-level `encode`/`decode` entry points
//! used by [`crate::codec`].

mod cancel;
mod error_code;
mod error_frame;
mod header;
mod keepalive;
mod lease;
mod metadata_push;
mod payload_frame;
mod request;
mod request_n;
mod resume;
mod setup;

pub use cancel::CancelFrame;
pub use error_code::ErrorCode;
pub use error_frame::ErrorFrame;
pub use header::{FrameType, Head, StreamId};
pub use keepalive::KeepaliveFrame;
pub use lease::LeaseFrame;
pub use metadata_push::MetadataPushFrame;
pub use payload_frame::PayloadFrame;
pub use request::RequestFrame;
pub use request_n::RequestNFrame;
pub use resume::{ResumeFrame, ResumeOkFrame};
pub use setup::{SetupFrame, MAJOR_VERSION, MINOR_VERSION};

use crate::error::FrameError;

/// The closed set of RSocket frame variants. Unknown frame type tags are
/// rejected at decode time ([`FrameError::UnknownFrameType`]); this
/// enumeration is never extended at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Setup(SetupFrame),
    Lease(LeaseFrame),
    Keepalive(KeepaliveFrame),
    RequestResponse(RequestFrame),
    RequestFireAndForget(RequestFrame),
    RequestStream(RequestFrame),
    RequestChannel(RequestFrame),
    Payload(PayloadFrame),
    RequestN(RequestNFrame),
    Cancel(CancelFrame),
    Error(ErrorFrame),
    MetadataPush(MetadataPushFrame),
    Resume(ResumeFrame),
    ResumeOk(ResumeOkFrame),
}

impl Frame {
    pub fn stream_id(&self) -> StreamId {
        match self {
            Frame::Setup(_) => StreamId::CONNECTION,
            Frame::Lease(_) => StreamId::CONNECTION,
            Frame::Keepalive(_) => StreamId::CONNECTION,
            Frame::RequestResponse(f) => f.stream_id,
            Frame::RequestFireAndForget(f) => f.stream_id,
            Frame::RequestStream(f) => f.stream_id,
            Frame::RequestChannel(f) => f.stream_id,
            Frame::Payload(f) => f.stream_id,
            Frame::RequestN(f) => f.stream_id,
            Frame::Cancel(f) => f.stream_id,
            Frame::Error(f) => f.stream_id,
            Frame::MetadataPush(_) => StreamId::CONNECTION,
            Frame::Resume(_) => StreamId::CONNECTION,
            Frame::ResumeOk(_) => StreamId::CONNECTION,
        }
    }

    pub fn frame_type(&self) -> FrameType {
        match self {
            Frame::Setup(_) => FrameType::Setup,
            Frame::Lease(_) => FrameType::Lease,
            Frame::Keepalive(_) => FrameType::Keepalive,
            Frame::RequestResponse(_) => FrameType::RequestResponse,
            Frame::RequestFireAndForget(_) => FrameType::RequestFireAndForget,
            Frame::RequestStream(_) => FrameType::RequestStream,
            Frame::RequestChannel(_) => FrameType::RequestChannel,
            Frame::Payload(_) => FrameType::Payload,
            Frame::RequestN(_) => FrameType::RequestN,
            Frame::Cancel(_) => FrameType::Cancel,
            Frame::Error(_) => FrameType::Error,
            Frame::MetadataPush(_) => FrameType::MetadataPush,
            Frame::Resume(_) => FrameType::Resume,
            Frame::ResumeOk(_) => FrameType::ResumeOk,
        }
    }

    /// True if this frame's `follows` flag is set, meaning it is a
    /// fragment of a logically larger frame.
    pub fn has_follows(&self) -> bool {
        match self {
            Frame::RequestResponse(f)
            | Frame::RequestFireAndForget(f)
            | Frame::RequestStream(f)
            | Frame::RequestChannel(f) => f.follows,
            Frame::Payload(f) => f.follows,
            _ => false,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut dst = Vec::new();
        match self {
            Frame::Setup(f) => f.encode(&mut dst),
            Frame::Lease(f) => f.encode(&mut dst),
            Frame::Keepalive(f) => f.encode(&mut dst),
            Frame::RequestResponse(f) => f.encode(FrameType::RequestResponse, &mut dst),
            Frame::RequestFireAndForget(f) => f.encode(FrameType::RequestFireAndForget, &mut dst),
            Frame::RequestStream(f) => f.encode(FrameType::RequestStream, &mut dst),
            Frame::RequestChannel(f) => f.encode(FrameType::RequestChannel, &mut dst),
            Frame::Payload(f) => f.encode(&mut dst),
            Frame::RequestN(f) => f.encode(&mut dst),
            Frame::Cancel(f) => f.encode(&mut dst),
            Frame::Error(f) => f.encode(&mut dst),
            Frame::MetadataPush(f) => f.encode(&mut dst),
            Frame::Resume(_) => unreachable!("this core never sends Resume"),
            Frame::ResumeOk(f) => f.encode(&mut dst),
        }
        dst
    }

    /// Decode a single frame (without the outer 3-byte transport length
    /// prefix, which [`crate::codec`] strips before calling this).
    pub fn decode(buf: &[u8]) -> Result<Self, FrameError> {
        let head = Head::decode(buf)?;
        let body = &buf[Head::ENCODED_LEN..];

        Ok(match head.frame_type {
            FrameType::Setup => Frame::Setup(SetupFrame::decode(&head, body)?),
            FrameType::Lease => Frame::Lease(LeaseFrame::decode(&head, body)?),
            FrameType::Keepalive => Frame::Keepalive(KeepaliveFrame::decode(&head, body)?),
            FrameType::RequestResponse => {
                Frame::RequestResponse(RequestFrame::decode(&head, body)?)
            }
            FrameType::RequestFireAndForget => {
                Frame::RequestFireAndForget(RequestFrame::decode(&head, body)?)
            }
            FrameType::RequestStream => Frame::RequestStream(RequestFrame::decode(&head, body)?),
            FrameType::RequestChannel => {
                Frame::RequestChannel(RequestFrame::decode(&head, body)?)
            }
            FrameType::Payload => Frame::Payload(PayloadFrame::decode(&head, body)?),
            FrameType::RequestN => Frame::RequestN(RequestNFrame::decode(&head, body)?),
            FrameType::Cancel => Frame::Cancel(CancelFrame::decode(&head, body)?),
            FrameType::Error => Frame::Error(ErrorFrame::decode(&head, body)?),
            FrameType::MetadataPush => {
                Frame::MetadataPush(MetadataPushFrame::decode(&head, body)?)
            }
            FrameType::Resume => Frame::Resume(ResumeFrame::decode(&head, body)?),
            FrameType::ResumeOk => Frame::ResumeOk(ResumeOkFrame::decode(&head, body)?),
        })
    }
}
