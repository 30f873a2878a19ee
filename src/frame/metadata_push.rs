use bytes::Bytes;

use crate::error::FrameError;

use super::header::{FrameType, Head, StreamId, FLAG_METADATA};

/// Out-of-band metadata sent on the connection (`stream_id = 0`), outside
/// the lifecycle of any stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataPushFrame {
    pub metadata: Bytes,
}

impl MetadataPushFrame {
    pub fn encode(&self, dst: &mut Vec<u8>) {
        Head::new(StreamId::CONNECTION, FrameType::MetadataPush, FLAG_METADATA).encode(dst);
        dst.extend_from_slice(&self.metadata);
    }

    pub fn decode(_head: &Head, buf: &[u8]) -> Result<Self, FrameError> {
        Ok(MetadataPushFrame {
            metadata: Bytes::copy_from_slice(buf),
        })
    }
}
