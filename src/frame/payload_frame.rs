use bytes::Bytes;

use crate::error::FrameError;
use crate::payload::Payload;

use super::header::{
    decode_metadata_len, encode_metadata_len, FrameType, Head, StreamId, FLAG_COMPLETE,
    FLAG_FOLLOWS, FLAG_METADATA, FLAG_NEXT,
};

/// Carries a value (`next`), a completion signal (`complete`), or both, for
/// an already-open stream. Both flags may be unset, which is a legal but
/// empty payload frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadFrame {
    pub stream_id: StreamId,
    pub follows: bool,
    pub complete: bool,
    pub next: bool,
    pub payload: Payload,
}

impl PayloadFrame {
    pub fn encode(&self, dst: &mut Vec<u8>) {
        let mut flags = 0u16;
        if self.follows {
            flags |= FLAG_FOLLOWS;
        }
        if self.complete {
            flags |= FLAG_COMPLETE;
        }
        if self.next {
            flags |= FLAG_NEXT;
        }
        if self.payload.metadata().is_some() {
            flags |= FLAG_METADATA;
        }

        Head::new(self.stream_id, FrameType::Payload, flags).encode(dst);

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

        let metadata = if head.has(FLAG_METADATA) {
            let len = decode_metadata_len(buf)?;
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

        Ok(PayloadFrame {
            stream_id: head.stream_id,
            follows: head.has(FLAG_FOLLOWS),
            complete: head.has(FLAG_COMPLETE),
            next: head.has(FLAG_NEXT),
            payload: Payload::new(data.unwrap_or_default(), metadata),
        })
    }
}
