//! State shared between the send pump, the receive pump, and every spawned
//! stream handler task. Mirrors the teacher's `proto::streams::Streams`
//! shape: an `Arc<Mutex<Inner>>` so a handle can be cloned out to
//! independently-spawned tasks. The lock is acquired, the mutation made
//! synchronously, and dropped before any `.await` — it is never held
//! across a suspension point.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::debug;

use crate::error::LocalError;
use crate::frame::{Frame, StreamId};

use super::lease_accounting::LeaseAccounting;
use super::store::{InteractionModel, Role, StreamTable};

struct PendingRequest {
    stream_id: StreamId,
    frame: Frame,
}

struct Inner {
    streams: StreamTable,
    lease: LeaseAccounting,
    responder_lease: LeaseAccounting,
    pending: VecDeque<PendingRequest>,
    closed: bool,
}

pub struct Shared {
    inner: Mutex<Inner>,
    outbound: mpsc::UnboundedSender<Frame>,
    pending_capacity: usize,
}

impl Shared {
    pub fn new(
        is_client: bool,
        honor_lease: bool,
        pending_capacity: usize,
        outbound: mpsc::UnboundedSender<Frame>,
    ) -> Self {
        Shared {
            inner: Mutex::new(Inner {
                streams: StreamTable::new(is_client),
                lease: LeaseAccounting::new(honor_lease),
                responder_lease: LeaseAccounting::new(false),
                pending: VecDeque::new(),
                closed: false,
            }),
            outbound,
            pending_capacity,
        }
    }

    /// Enqueue a frame on the send pump's queue. Fails only once the pump
    /// has shut down.
    pub fn send(&self, frame: Frame) -> Result<(), LocalError> {
        self.outbound
            .send(frame)
            .map_err(|_| LocalError::ConnectionClosed)
    }

    pub fn allocate_stream_id(&self) -> Result<StreamId, LocalError> {
        self.inner
            .lock()
            .unwrap()
            .streams
            .allocate()
            .map_err(|_| LocalError::StreamIdExhausted)
    }

    pub fn register(
        &self,
        id: StreamId,
        role: Role,
        model: InteractionModel,
        inbound: mpsc::Sender<Frame>,
    ) {
        let _ = self
            .inner
            .lock()
            .unwrap()
            .streams
            .register(id, role, model, inbound);
    }

    pub fn assert_available(&self, id: StreamId) -> bool {
        self.inner.lock().unwrap().streams.assert_available(id).is_ok()
    }

    pub fn finish(&self, id: StreamId) {
        self.inner.lock().unwrap().streams.finish(id);
    }

    pub fn sender_for(&self, id: StreamId) -> Option<mpsc::Sender<Frame>> {
        self.inner.lock().unwrap().streams.sender_for(id)
    }

    pub fn on_lease_received(&self, number_of_requests: u32, ttl: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.lease.on_lease_received(number_of_requests, ttl, Instant::now());
        let mut drained = Vec::new();
        while let Some(pending) = inner.pending.front() {
            let _ = pending;
            if !inner.lease.is_allowed(Instant::now()) {
                break;
            }
            inner.lease.consume(Instant::now());
            drained.push(inner.pending.pop_front().unwrap().frame);
        }
        drop(inner);
        for frame in drained {
            let _ = self.outbound.send(frame);
        }
    }

    /// Start enforcing a responder-side lease budget on inbound
    /// initiate-request frames. Called once, after a `Setup` requesting
    /// leasing has been accepted.
    pub fn enable_responder_lease(&self) {
        self.inner.lock().unwrap().responder_lease = LeaseAccounting::new(true);
    }

    /// Record a lease this side just granted to the peer, replenishing the
    /// budget `admit_inbound_initiate_request` enforces.
    pub fn on_lease_granted(&self, number_of_requests: u32, ttl: Duration) {
        self.inner
            .lock()
            .unwrap()
            .responder_lease
            .on_lease_received(number_of_requests, ttl, Instant::now());
    }

    /// Whether an inbound initiate-request frame may be accepted right now.
    /// Consumes one unit of the responder lease on success. Always true
    /// when responder leasing was never enabled for this connection.
    pub fn admit_inbound_initiate_request(&self, stream_id: StreamId) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if !inner.responder_lease.is_enabled() {
            return true;
        }
        let now = Instant::now();
        if inner.responder_lease.is_allowed(now) {
            inner.responder_lease.consume(now);
            true
        } else {
            debug!(%stream_id, "responder lease exhausted; rejecting request");
            false
        }
    }

    /// Admit an outbound initiate-request frame: send it immediately if
    /// leasing is disabled or a lease currently permits it, otherwise
    /// queue it (bounded by `pending_capacity`, 0 = unlimited) to be
    /// drained on the next inbound `Lease`.
    pub fn admit_initiate_request(&self, stream_id: StreamId, frame: Frame) -> Result<(), LocalError> {
        let mut inner = self.inner.lock().unwrap();
        let now = Instant::now();
        if inner.lease.is_allowed(now) {
            inner.lease.consume(now);
            drop(inner);
            return self.send(frame);
        }
        if !inner.lease.is_enabled() {
            drop(inner);
            return self.send(frame);
        }
        if self.pending_capacity != 0 && inner.pending.len() >= self.pending_capacity {
            return Err(LocalError::QueueFull);
        }
        debug!(%stream_id, "no lease available; queueing request");
        inner.pending.push_back(PendingRequest { stream_id, frame });
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().unwrap().closed
    }

    pub fn mark_closed(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let was_closed = inner.closed;
        inner.closed = true;
        !was_closed
    }

    pub fn stream_ids(&self) -> Vec<StreamId> {
        self.inner.lock().unwrap().streams.ids().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sid(v: u32) -> StreamId {
        StreamId::new(v).unwrap()
    }

    fn shared(honor_lease: bool, capacity: usize) -> (Shared, mpsc::UnboundedReceiver<Frame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Shared::new(true, honor_lease, capacity, tx), rx)
    }

    fn cancel(id: StreamId) -> Frame {
        Frame::Cancel(crate::frame::CancelFrame { stream_id: id })
    }

    #[test]
    fn no_lease_sends_immediately() {
        let (shared, mut rx) = shared(false, 0);
        shared.admit_initiate_request(sid(1), cancel(sid(1))).unwrap();
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn lease_required_but_absent_queues_the_request() {
        let (shared, mut rx) = shared(true, 0);
        shared.admit_initiate_request(sid(1), cancel(sid(1))).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn lease_arrival_drains_the_queue_in_fifo_order() {
        let (shared, mut rx) = shared(true, 0);
        shared.admit_initiate_request(sid(1), cancel(sid(1))).unwrap();
        shared.admit_initiate_request(sid(3), cancel(sid(3))).unwrap();
        shared.on_lease_received(1, Duration::from_secs(30));

        let first = rx.try_recv().unwrap();
        assert_eq!(first.stream_id(), sid(1));
        assert!(rx.try_recv().is_err());

        shared.on_lease_received(1, Duration::from_secs(30));
        let second = rx.try_recv().unwrap();
        assert_eq!(second.stream_id(), sid(3));
    }

    #[test]
    fn full_pending_queue_rejects_with_local_error() {
        let (shared, _rx) = shared(true, 1);
        shared.admit_initiate_request(sid(1), cancel(sid(1))).unwrap();
        assert!(matches!(
            shared.admit_initiate_request(sid(3), cancel(sid(3))),
            Err(LocalError::QueueFull)
        ));
    }

    #[test]
    fn responder_lease_disabled_by_default_allows_everything() {
        let (shared, _rx) = shared(false, 0);
        assert!(shared.admit_inbound_initiate_request(sid(1)));
        assert!(shared.admit_inbound_initiate_request(sid(3)));
    }

    #[test]
    fn responder_lease_gates_inbound_requests_once_enabled() {
        let (shared, _rx) = shared(false, 0);
        shared.enable_responder_lease();
        assert!(!shared.admit_inbound_initiate_request(sid(1)));

        shared.on_lease_granted(1, Duration::from_secs(30));
        assert!(shared.admit_inbound_initiate_request(sid(1)));
        assert!(!shared.admit_inbound_initiate_request(sid(3)));
    }
}
