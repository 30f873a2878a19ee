use crate::error::FrameError;

use super::header::{FrameType, Head, StreamId};

/// Signals additional demand on an already-open stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestNFrame {
    pub stream_id: StreamId,
    pub request_n: u32,
}

impl RequestNFrame {
    pub fn encode(&self, dst: &mut Vec<u8>) {
        Head::new(self.stream_id, FrameType::RequestN, 0).encode(dst);
        dst.extend_from_slice(&self.request_n.to_be_bytes());
    }

    pub fn decode(head: &Head, buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() < 4 {
            return Err(FrameError::Short);
        }
        Ok(RequestNFrame {
            stream_id: head.stream_id,
            request_n: u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]),
        })
    }
}
