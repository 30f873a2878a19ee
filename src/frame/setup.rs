use bytes::Bytes;

use crate::error::FrameError;
use crate::payload::Payload;

use super::header::{
    decode_metadata_len, encode_metadata_len, FrameType, Head, StreamId, FLAG_LEASE,
    FLAG_METADATA, FLAG_RESUME_ENABLE,
};

pub const MAJOR_VERSION: u16 = 1;
pub const MINOR_VERSION: u16 = 0;

/// The first frame a client sends on a connection, establishing encodings,
/// keepalive timing, and optional lease/resume negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupFrame {
    pub major_version: u16,
    pub minor_version: u16,
    pub keep_alive_interval_ms: u32,
    pub max_lifetime_ms: u32,
    pub resume_token: Option<Bytes>,
    pub metadata_mime_type: String,
    pub data_mime_type: String,
    pub lease: bool,
    pub payload: Payload,
}

impl SetupFrame {
    pub fn encode(&self, dst: &mut Vec<u8>) {
        let mut flags = 0u16;
        if self.lease {
            flags |= FLAG_LEASE;
        }
        if self.resume_token.is_some() {
            flags |= FLAG_RESUME_ENABLE;
        }
        if self.payload.metadata().is_some() {
            flags |= FLAG_METADATA;
        }

        Head::new(StreamId::CONNECTION, FrameType::Setup, flags).encode(dst);
        dst.extend_from_slice(&self.major_version.to_be_bytes());
        dst.extend_from_slice(&self.minor_version.to_be_bytes());
        dst.extend_from_slice(&self.keep_alive_interval_ms.to_be_bytes());
        dst.extend_from_slice(&self.max_lifetime_ms.to_be_bytes());

        if let Some(token) = &self.resume_token {
            dst.extend_from_slice(&(token.len() as u16).to_be_bytes());
            dst.extend_from_slice(token);
        }

        dst.push(self.metadata_mime_type.len() as u8);
        dst.extend_from_slice(self.metadata_mime_type.as_bytes());
        dst.push(self.data_mime_type.len() as u8);
        dst.extend_from_slice(self.data_mime_type.as_bytes());

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
        let need = |pos: usize, n: usize| -> Result<(), FrameError> {
            if buf.len() < pos + n {
                Err(FrameError::Short)
            } else {
                Ok(())
            }
        };

        need(pos, 12)?;
        let major_version = u16::from_be_bytes([buf[pos], buf[pos + 1]]);
        pos += 2;
        let minor_version = u16::from_be_bytes([buf[pos], buf[pos + 1]]);
        pos += 2;
        let keep_alive_interval_ms =
            u32::from_be_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]]);
        pos += 4;
        let max_lifetime_ms =
            u32::from_be_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]]);
        pos += 4;

        let resume_token = if head.has(FLAG_RESUME_ENABLE) {
            need(pos, 2)?;
            let len = u16::from_be_bytes([buf[pos], buf[pos + 1]]) as usize;
            pos += 2;
            need(pos, len)?;
            let token = Bytes::copy_from_slice(&buf[pos..pos + len]);
            pos += len;
            Some(token)
        } else {
            None
        };

        need(pos, 1)?;
        let mlen = buf[pos] as usize;
        pos += 1;
        need(pos, mlen)?;
        let metadata_mime_type = String::from_utf8_lossy(&buf[pos..pos + mlen]).into_owned();
        pos += mlen;

        need(pos, 1)?;
        let dlen = buf[pos] as usize;
        pos += 1;
        need(pos, dlen)?;
        let data_mime_type = String::from_utf8_lossy(&buf[pos..pos + dlen]).into_owned();
        pos += dlen;

        let metadata = if head.has(FLAG_METADATA) {
            let mlen = decode_metadata_len(&buf[pos..])?;
            pos += 3;
            need(pos, mlen)?;
            let m = Bytes::copy_from_slice(&buf[pos..pos + mlen]);
            pos += mlen;
            Some(m)
        } else {
            None
        };

        let data = if pos < buf.len() {
            Some(Bytes::copy_from_slice(&buf[pos..]))
        } else {
            None
        };

        Ok(SetupFrame {
            major_version,
            minor_version,
            keep_alive_interval_ms,
            max_lifetime_ms,
            resume_token,
            metadata_mime_type,
            data_mime_type,
            lease: head.has(FLAG_LEASE),
            payload: Payload::new(data.unwrap_or_default(), metadata),
        })
    }
}
