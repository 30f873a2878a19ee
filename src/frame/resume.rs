use bytes::Bytes;

use crate::error::FrameError;

use super::header::{FrameType, Head, StreamId};

/// Requests resumption of a previous connection. This core always rejects
/// `Resume` with `REJECTED_RESUME` (see [`crate::proto::connection`]); the
/// frame is still decoded so the rejection can be logged accurately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeFrame {
    pub major_version: u16,
    pub minor_version: u16,
    pub resume_token: Bytes,
    pub last_received_server_position: u64,
    pub first_available_client_position: u64,
}

impl ResumeFrame {
    pub fn decode(_head: &Head, buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() < 4 + 2 {
            return Err(FrameError::Short);
        }
        let major_version = u16::from_be_bytes([buf[0], buf[1]]);
        let minor_version = u16::from_be_bytes([buf[2], buf[3]]);
        let token_len = u16::from_be_bytes([buf[4], buf[5]]) as usize;
        let mut pos = 6;
        if buf.len() < pos + token_len + 16 {
            return Err(FrameError::Short);
        }
        let resume_token = Bytes::copy_from_slice(&buf[pos..pos + token_len]);
        pos += token_len;
        let last_received_server_position = u64::from_be_bytes(buf[pos..pos + 8].try_into().unwrap());
        pos += 8;
        let first_available_client_position =
            u64::from_be_bytes(buf[pos..pos + 8].try_into().unwrap());

        Ok(ResumeFrame {
            major_version,
            minor_version,
            resume_token,
            last_received_server_position,
            first_available_client_position,
        })
    }
}

/// Acknowledges a `Resume`. Never produced by this core, since `Resume` is
/// always rejected, but decoded defensively if received from a peer that
/// assumes resumption succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumeOkFrame {
    pub client_position: u64,
}

impl ResumeOkFrame {
    pub fn encode(&self, dst: &mut Vec<u8>) {
        Head::new(StreamId::CONNECTION, FrameType::ResumeOk, 0).encode(dst);
        dst.extend_from_slice(&self.client_position.to_be_bytes());
    }

    pub fn decode(_head: &Head, buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() < 8 {
            return Err(FrameError::Short);
        }
        Ok(ResumeOkFrame {
            client_position: u64::from_be_bytes(buf[0..8].try_into().unwrap()),
        })
    }
}
