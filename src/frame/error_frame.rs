use bytes::Bytes;

use crate::error::FrameError;

use super::error_code::ErrorCode;
use super::header::{FrameType, Head, StreamId};

/// Reports a protocol or application-level failure on a stream, or on the
/// connection (`stream_id = 0`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorFrame {
    pub stream_id: StreamId,
    pub code: ErrorCode,
    pub data: Bytes,
}

impl ErrorFrame {
    pub fn encode(&self, dst: &mut Vec<u8>) {
        Head::new(self.stream_id, FrameType::Error, 0).encode(dst);
        dst.extend_from_slice(&self.code.code().to_be_bytes());
        dst.extend_from_slice(&self.data);
    }

    pub fn decode(head: &Head, buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() < 4 {
            return Err(FrameError::Short);
        }
        let code = ErrorCode::from_code(u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]))?;
        Ok(ErrorFrame {
            stream_id: head.stream_id,
            code,
            data: Bytes::copy_from_slice(&buf[4..]),
        })
    }
}
