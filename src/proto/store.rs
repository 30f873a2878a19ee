//! Stream table: allocation, registration, routing, and lifecycle of
//! active stream ids. Storage is a [`slab::Slab`] keyed through a
//! `HashMap<StreamId, usize>`, the same shape the teacher's
//! `proto::streams::store::Store` uses for its own stream table.

use std::collections::HashMap;

use tokio::sync::mpsc;

use crate::error::ProtocolError;
use crate::frame::{Frame, StreamId};

use super::stream_id::StreamIdAllocator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Requester,
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionModel {
    RequestResponse,
    FireAndForget,
    RequestStream,
    RequestChannel,
}

/// A live stream: who owns it, what model it is running, and the inbound
/// channel its handler task reads from. The handler task itself is owned
/// by whoever spawned it; this entry only holds the (non-owning) means to
/// reach it, matching the ownership note in the specification this core
/// follows ("each stream handler is exclusively owned by the stream
/// table... holds a non-owning back reference to the engine").
pub struct StreamEntry {
    pub id: StreamId,
    pub role: Role,
    pub model: InteractionModel,
    inbound: mpsc::Sender<Frame>,
}

pub struct StreamTable {
    slab: slab::Slab<StreamEntry>,
    ids: HashMap<StreamId, usize>,
    allocator: StreamIdAllocator,
}

impl StreamTable {
    pub fn new(is_client: bool) -> Self {
        StreamTable {
            slab: slab::Slab::new(),
            ids: HashMap::new(),
            allocator: StreamIdAllocator::new(is_client),
        }
    }

    pub fn is_registered(&self, id: StreamId) -> bool {
        self.ids.contains_key(&id)
    }

    pub fn allocate(&mut self) -> Result<StreamId, ProtocolError> {
        let ids = &self.ids;
        self.allocator.allocate(|id| ids.contains_key(&id))
    }

    /// A received initiate-request frame must carry an id not currently
    /// registered.
    pub fn assert_available(&self, id: StreamId) -> Result<(), ProtocolError> {
        if self.is_registered(id) {
            Err(ProtocolError::StreamIdInUse(id))
        } else {
            Ok(())
        }
    }

    pub fn register(
        &mut self,
        id: StreamId,
        role: Role,
        model: InteractionModel,
        inbound: mpsc::Sender<Frame>,
    ) -> Result<(), ProtocolError> {
        self.assert_available(id)?;
        let key = self.slab.insert(StreamEntry {
            id,
            role,
            model,
            inbound,
        });
        self.ids.insert(id, key);
        Ok(())
    }

    pub fn finish(&mut self, id: StreamId) {
        if let Some(key) = self.ids.remove(&id) {
            self.slab.remove(key);
        }
    }

    pub fn entry(&self, id: StreamId) -> Option<&StreamEntry> {
        self.ids.get(&id).map(|&key| &self.slab[key])
    }

    /// Look up the inbound channel for a stream id, cloned out so the
    /// caller can `.await` the send after releasing whatever lock guards
    /// this table — never hold that lock across an `.await`.
    pub fn sender_for(&self, id: StreamId) -> Option<mpsc::Sender<Frame>> {
        self.entry(id).map(|entry| entry.inbound.clone())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = StreamId> + '_ {
        self.ids.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(v: u32) -> StreamId {
        StreamId::new(v).unwrap()
    }

    #[tokio::test]
    async fn sender_for_reaches_the_registered_handler() {
        let mut table = StreamTable::new(true);
        let (tx, mut rx) = mpsc::channel(4);
        let id = sid(1);
        table
            .register(id, Role::Requester, InteractionModel::RequestResponse, tx)
            .unwrap();

        let frame = Frame::Cancel(crate::frame::CancelFrame { stream_id: id });
        let sender = table.sender_for(id).expect("registered");
        sender.send(frame.clone()).await.unwrap();
        assert_eq!(rx.recv().await, Some(frame));
    }

    #[test]
    fn sender_for_unknown_id_is_none() {
        let table = StreamTable::new(true);
        assert!(table.sender_for(sid(7)).is_none());
    }

    #[test]
    fn double_register_is_a_protocol_error() {
        let mut table = StreamTable::new(true);
        let (tx, _rx) = mpsc::channel(4);
        let id = sid(1);
        table
            .register(id, Role::Responder, InteractionModel::RequestResponse, tx.clone())
            .unwrap();
        assert!(matches!(
            table.register(id, Role::Responder, InteractionModel::RequestResponse, tx),
            Err(ProtocolError::StreamIdInUse(_))
        ));
    }

    #[test]
    fn finish_frees_the_id_for_assert_available() {
        let mut table = StreamTable::new(true);
        let (tx, _rx) = mpsc::channel(4);
        let id = sid(1);
        table
            .register(id, Role::Requester, InteractionModel::FireAndForget, tx)
            .unwrap();
        table.finish(id);
        assert!(table.assert_available(id).is_ok());
    }

    #[test]
    fn allocate_skips_registered_ids() {
        let mut table = StreamTable::new(true);
        let (tx, _rx) = mpsc::channel(4);
        let first = table.allocate().unwrap();
        table
            .register(first, Role::Requester, InteractionModel::FireAndForget, tx)
            .unwrap();
        let second = table.allocate().unwrap();
        assert_ne!(first, second);
        assert!(second.is_client_initiated());
    }
}
