use bytes::Bytes;

use crate::error::FrameError;
use crate::payload::Payload;

use super::header::{
    decode_metadata_len, encode_metadata_len, FrameType, Head, StreamId, FLAG_COMPLETE,
    FLAG_FOLLOWS, FLAG_METADATA,
};

/// The frame that opens a stream: `RequestResponse`, `RequestFireAndForget`,
/// `RequestStream`, or `RequestChannel`. `initial_request_n` is present only
/// for the two streaming variants; `complete` is only meaningful for
/// `RequestChannel`, where it signals the requester has no more payloads to
/// send after this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame {
    pub stream_id: StreamId,
    pub initial_request_n: Option<u32>,
    pub follows: bool,
    pub complete: bool,
    pub payload: Payload,
}

impl RequestFrame {
    pub fn encode(&self, frame_type: FrameType, dst: &mut Vec<u8>) {
        let mut flags = 0u16;
        if self.follows {
            flags |= FLAG_FOLLOWS;
        }
        if self.complete && frame_type == FrameType::RequestChannel {
            flags |= FLAG_COMPLETE;
        }
        if self.payload.metadata().is_some() {
            flags |= FLAG_METADATA;
        }

        Head::new(self.stream_id, frame_type, flags).encode(dst);

        if let Some(n) = self.initial_request_n {
            dst.extend_from_slice(&n.to_be_bytes());
        }

        if let Some(metadata) = self.payload.metadata() {
            encode_metadata_len(dst, metadata.len());
            dst.extend_from_slice(metadata);
        }
        if let Some(data) = self.payload.data() {
            dst.extend_from_slice(data);
        }
    }

    pub fn decode(head: &Head, buf: &[u8]) -> Result<Self, FrameError> {
        let mut pos = 0usize;
        let needs_request_n = matches!(
            head.frame_type,
            FrameType::RequestStream | FrameType::RequestChannel
        );

        let initial_request_n = if needs_request_n {
            if buf.len() < 4 {
                return Err(FrameError::Short);
            }
            let n = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
            pos += 4;
            Some(n)
        } else {
            None
        };

        if head.has(FLAG_FOLLOWS) && !head.frame_type.is_fragmentable() {
            return Err(FrameError::UnexpectedFollows);
        }

        let metadata = if head.has(FLAG_METADATA) {
            let len = decode_metadata_len(&buf[pos..])?;
            pos += 3;
            if buf.len() < pos + len {
                return Err(FrameError::InvalidMetadataLength);
            }
            let m = Bytes::copy_from_slice(&buf[pos..pos + len]);
            pos += len;
            Some(m)
        } else {
            None
        };

        let data = if pos < buf.len() {
            Some(Bytes::copy_from_slice(&buf[pos..]))
        } else {
            None
        };

        Ok(RequestFrame {
            stream_id: head.stream_id,
            initial_request_n,
            follows: head.has(FLAG_FOLLOWS),
            complete: head.frame_type == FrameType::RequestChannel && head.has(FLAG_COMPLETE),
            payload: Payload::new(data.unwrap_or_default(), metadata),
        })
    }
}
