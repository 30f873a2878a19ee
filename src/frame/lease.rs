use bytes::Bytes;

use crate::error::FrameError;

use super::header::{encode_metadata_len, FrameType, Head, StreamId, FLAG_METADATA};

/// Grants the peer permission to send up to `number_of_requests` initiate-
/// request frames within `ttl_ms`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseFrame {
    pub ttl_ms: u32,
    pub number_of_requests: u32,
    pub metadata: Option<Bytes>,
}

impl LeaseFrame {
    pub fn encode(&self, dst: &mut Vec<u8>) {
        let flags = if self.metadata.is_some() {
            FLAG_METADATA
        } else {
            0
        };
        Head::new(StreamId::CONNECTION, FrameType::Lease, flags).encode(dst);
        dst.extend_from_slice(&self.ttl_ms.to_be_bytes());
        dst.extend_from_slice(&self.number_of_requests.to_be_bytes());
        if let Some(metadata) = &self.metadata {
            encode_metadata_len(dst, metadata.len());
            dst.extend_from_slice(metadata);
        }
    }

    pub fn decode(head: &Head, buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() < 8 {
            return Err(FrameError::Short);
        }
        let ttl_ms = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let number_of_requests = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
        let metadata = if head.has(FLAG_METADATA) {
            Some(Bytes::copy_from_slice(&buf[8..]))
        } else {
            None
        };
        Ok(LeaseFrame {
            ttl_ms,
            number_of_requests,
            metadata,
        })
    }
}
