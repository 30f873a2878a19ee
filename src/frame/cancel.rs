use crate::error::FrameError;

use super::header::{FrameType, Head, StreamId};

/// Requests that the responder stop producing further frames on a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelFrame {
    pub stream_id: StreamId,
}

impl CancelFrame {
    pub fn encode(&self, dst: &mut Vec<u8>) {
        Head::new(self.stream_id, FrameType::Cancel, 0).encode(dst);
    }

    pub fn decode(head: &Head, _buf: &[u8]) -> Result<Self, FrameError> {
        Ok(CancelFrame {
            stream_id: head.stream_id,
        })
    }
}
