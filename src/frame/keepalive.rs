use bytes::Bytes;

use crate::error::FrameError;

use super::header::{FrameType, Head, StreamId, FLAG_RESPOND};

/// Connection-level liveness probe. `respond = true` asks the peer to echo
/// the frame back with `respond = false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepaliveFrame {
    pub respond: bool,
    pub last_received_position: u64,
    pub data: Bytes,
}

impl KeepaliveFrame {
    pub fn encode(&self, dst: &mut Vec<u8>) {
        let flags = if self.respond { FLAG_RESPOND } else { 0 };
        Head::new(StreamId::CONNECTION, FrameType::Keepalive, flags).encode(dst);
        dst.extend_from_slice(&self.last_received_position.to_be_bytes());
        dst.extend_from_slice(&self.data);
    }

    pub fn decode(head: &Head, buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() < 8 {
            return Err(FrameError::Short);
        }
        let last_received_position = u64::from_be_bytes(buf[0..8].try_into().unwrap());
        Ok(KeepaliveFrame {
            respond: head.has(FLAG_RESPOND),
            last_received_position,
            data: Bytes::copy_from_slice(&buf[8..]),
        })
    }
}
