//! Reassembly of multi-frame payloads. Only `RequestResponse`,
//! `RequestFireAndForget`, `RequestStream`, `RequestChannel`, and `Payload`
//! frames may carry the `follows` flag; every other frame type is rejected
//! upstream (in [`crate::frame::request::RequestFrame::decode`]) before it
//! ever reaches this cache.

use std::collections::HashMap;

use bytes::{Bytes, BytesMut};

use crate::error::ProtocolError;
use crate::frame::{Frame, FrameType, PayloadFrame, RequestFrame, StreamId};
use crate::payload::Payload;

struct Entry {
    frame_type: FrameType,
    initial_request_n: Option<u32>,
    metadata: Option<BytesMut>,
    data: BytesMut,
}

impl Entry {
    fn new(frame_type: FrameType, initial_request_n: Option<u32>) -> Self {
        Entry {
            frame_type,
            initial_request_n,
            metadata: None,
            data: BytesMut::new(),
        }
    }

    fn merge(&mut self, metadata: Option<Bytes>, data: Option<Bytes>) {
        if let Some(m) = metadata {
            self.metadata.get_or_insert_with(BytesMut::new).extend_from_slice(&m);
        }
        if let Some(d) = data {
            self.data.extend_from_slice(&d);
        }
    }
}

#[derive(Default)]
pub struct FragmentCache {
    entries: HashMap<StreamId, Entry>,
}

impl FragmentCache {
    pub fn new() -> Self {
        FragmentCache::default()
    }

    /// Feed one frame through the cache. Returns `Ok(None)` while a
    /// fragment is still accumulating, `Ok(Some(frame))` when reassembly
    /// completes (including the trivial case of a frame with no `follows`
    /// flag and no pending fragment), and an error on a type mismatch or a
    /// dangling `follows`-less continuation.
    pub fn append(&mut self, frame: Frame) -> Result<Option<Frame>, ProtocolError> {
        let id = frame.stream_id();

        macro_rules! request_arm {
            ($variant:ident, $frame_type:expr) => {{
                let follows = frame.has_follows();
                if let Frame::$variant(rf) = frame {
                    return self.merge_request(id, $frame_type, rf, follows);
                }
                unreachable!()
            }};
        }

        match &frame {
            Frame::RequestResponse(_) => request_arm!(RequestResponse, FrameType::RequestResponse),
            Frame::RequestFireAndForget(_) => {
                request_arm!(RequestFireAndForget, FrameType::RequestFireAndForget)
            }
            Frame::RequestStream(_) => request_arm!(RequestStream, FrameType::RequestStream),
            Frame::RequestChannel(_) => request_arm!(RequestChannel, FrameType::RequestChannel),
            Frame::Payload(_) => {
                let follows = frame.has_follows();
                if let Frame::Payload(pf) = frame {
                    return self.merge_payload(id, pf, follows);
                }
                unreachable!()
            }
            _ => Ok(Some(frame)),
        }
    }

    fn merge_request(
        &mut self,
        id: StreamId,
        frame_type: FrameType,
        rf: RequestFrame,
        follows: bool,
    ) -> Result<Option<Frame>, ProtocolError> {
        if follows {
            let entry = self
                .entries
                .entry(id)
                .or_insert_with(|| Entry::new(frame_type, rf.initial_request_n));
            if entry.frame_type != frame_type {
                return Err(ProtocolError::FragmentTypeMismatch(id));
            }
            entry.merge(rf.payload.metadata().cloned(), rf.payload.data().cloned());
            return Ok(None);
        }

        let (metadata, data) = match self.entries.remove(&id) {
            Some(mut entry) => {
                if entry.frame_type != frame_type {
                    return Err(ProtocolError::FragmentTypeMismatch(id));
                }
                entry.merge(rf.payload.metadata().cloned(), rf.payload.data().cloned());
                (entry.metadata.map(|b| b.freeze()), Some(entry.data.freeze()))
            }
            None => (
                rf.payload.metadata().cloned(),
                rf.payload.data().cloned(),
            ),
        };

        let completed = RequestFrame {
            stream_id: id,
            initial_request_n: rf.initial_request_n,
            follows: false,
            complete: rf.complete,
            payload: Payload::new(data.unwrap_or_default(), metadata),
        };

        Ok(Some(match frame_type {
            FrameType::RequestResponse => Frame::RequestResponse(completed),
            FrameType::RequestFireAndForget => Frame::RequestFireAndForget(completed),
            FrameType::RequestStream => Frame::RequestStream(completed),
            FrameType::RequestChannel => Frame::RequestChannel(completed),
            _ => unreachable!(),
        }))
    }

    fn merge_payload(
        &mut self,
        id: StreamId,
        pf: PayloadFrame,
        follows: bool,
    ) -> Result<Option<Frame>, ProtocolError> {
        if follows {
            let entry = self
                .entries
                .entry(id)
                .or_insert_with(|| Entry::new(FrameType::Payload, None));
            if entry.frame_type != FrameType::Payload {
                return Err(ProtocolError::FragmentTypeMismatch(id));
            }
            entry.merge(pf.payload.metadata().cloned(), pf.payload.data().cloned());
            return Ok(None);
        }

        let (metadata, data) = match self.entries.remove(&id) {
            Some(mut entry) => {
                if entry.frame_type != FrameType::Payload {
                    return Err(ProtocolError::FragmentTypeMismatch(id));
                }
                entry.merge(pf.payload.metadata().cloned(), pf.payload.data().cloned());
                (entry.metadata.map(|b| b.freeze()), Some(entry.data.freeze()))
            }
            None => (pf.payload.metadata().cloned(), pf.payload.data().cloned()),
        };

        // The terminating frame's own complete/next flags win over whatever
        // was carried (or absent) on the intermediate fragments.
        Ok(Some(Frame::Payload(PayloadFrame {
            stream_id: id,
            follows: false,
            complete: pf.complete,
            next: pf.next,
            payload: Payload::new(data.unwrap_or_default(), metadata),
        })))
    }
}

/// Split one outbound frame into wire-sized fragments if its payload
/// exceeds `max_size`, using the same continuation convention
/// [`FragmentCache::append`] reassembles: every fragment keeps the
/// initiating frame's own variant, metadata rides only on the first
/// fragment, and `complete`/`next` only take their real value on the
/// last (`follows = false`) fragment. Frame types that carry no payload
/// pass through unchanged.
pub fn split(frame: Frame, max_size: usize) -> Vec<Frame> {
    match frame {
        Frame::RequestResponse(rf) => split_request(rf, max_size, Frame::RequestResponse),
        Frame::RequestFireAndForget(rf) => split_request(rf, max_size, Frame::RequestFireAndForget),
        Frame::RequestStream(rf) => split_request(rf, max_size, Frame::RequestStream),
        Frame::RequestChannel(rf) => split_request(rf, max_size, Frame::RequestChannel),
        Frame::Payload(pf) => split_payload(pf, max_size),
        other => vec![other],
    }
}

fn chunk_bytes(data: &Bytes, size: usize) -> Vec<Bytes> {
    let mut out = Vec::new();
    let mut offset = 0;
    while offset < data.len() {
        let end = (offset + size).min(data.len());
        out.push(data.slice(offset..end));
        offset = end;
    }
    out
}

fn split_request(
    rf: RequestFrame,
    max_size: usize,
    ctor: impl Fn(RequestFrame) -> Frame,
) -> Vec<Frame> {
    let metadata = rf.payload.metadata().cloned();
    let data = rf.payload.data().cloned().unwrap_or_default();
    let total = data.len() + metadata.as_ref().map_or(0, Bytes::len);
    if data.is_empty() || total <= max_size {
        return vec![ctor(rf)];
    }

    let chunks = chunk_bytes(&data, max_size.max(1));
    let last = chunks.len() - 1;
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            ctor(RequestFrame {
                stream_id: rf.stream_id,
                initial_request_n: rf.initial_request_n,
                follows: i != last,
                complete: if i == last { rf.complete } else { false },
                payload: Payload::new(chunk, if i == 0 { metadata.clone() } else { None }),
            })
        })
        .collect()
}

fn split_payload(pf: PayloadFrame, max_size: usize) -> Vec<Frame> {
    let metadata = pf.payload.metadata().cloned();
    let data = pf.payload.data().cloned().unwrap_or_default();
    let total = data.len() + metadata.as_ref().map_or(0, Bytes::len);
    if data.is_empty() || total <= max_size {
        return vec![Frame::Payload(pf)];
    }

    let chunks = chunk_bytes(&data, max_size.max(1));
    let last = chunks.len() - 1;
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            Frame::Payload(PayloadFrame {
                stream_id: pf.stream_id,
                follows: i != last,
                complete: if i == last { pf.complete } else { false },
                next: if i == last { pf.next } else { true },
                payload: Payload::new(chunk, if i == 0 { metadata.clone() } else { None }),
            })
        })
        .collect()
}
