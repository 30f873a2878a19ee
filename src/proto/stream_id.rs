use crate::error::ProtocolError;
use crate::frame::StreamId;

/// Allocates stream ids of a fixed parity (odd for a client-initiated
/// requester, even for a server-initiated one), skipping ids currently in
/// use and refusing to allocate once the 31-bit space is exhausted.
pub struct StreamIdAllocator {
    next: u32,
}

impl StreamIdAllocator {
    pub fn new(is_client: bool) -> Self {
        StreamIdAllocator {
            next: if is_client { 1 } else { 2 },
        }
    }

    pub fn allocate(&mut self, in_use: impl Fn(StreamId) -> bool) -> Result<StreamId, ProtocolError> {
        loop {
            if self.next > StreamId::max_value() {
                return Err(ProtocolError::StreamIdExhausted);
            }
            let candidate = StreamId::from_raw_unchecked(self.next);
            self.next = self.next.saturating_add(2);
            if !in_use(candidate) {
                return Ok(candidate);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_allocator_produces_odd_ids() {
        let mut alloc = StreamIdAllocator::new(true);
        assert_eq!(alloc.allocate(|_| false).unwrap().value(), 1);
        assert_eq!(alloc.allocate(|_| false).unwrap().value(), 3);
        assert_eq!(alloc.allocate(|_| false).unwrap().value(), 5);
    }

    #[test]
    fn server_allocator_produces_even_ids() {
        let mut alloc = StreamIdAllocator::new(false);
        assert_eq!(alloc.allocate(|_| false).unwrap().value(), 2);
        assert_eq!(alloc.allocate(|_| false).unwrap().value(), 4);
    }

    #[test]
    fn allocator_skips_ids_currently_in_use() {
        let mut alloc = StreamIdAllocator::new(true);
        let in_use = |id: StreamId| id.value() == 1;
        assert_eq!(alloc.allocate(in_use).unwrap().value(), 3);
    }

    #[test]
    fn allocator_refuses_once_space_is_exhausted() {
        let mut alloc = StreamIdAllocator { next: StreamId::max_value() };
        assert!(alloc.allocate(|_| false).is_ok());
        assert!(matches!(
            alloc.allocate(|_| false),
            Err(ProtocolError::StreamIdExhausted)
        ));
    }
}
