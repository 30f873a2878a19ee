//! Lease-based admission control. A lease grants a number of requests
//! that may be sent before it expires. This accounting type is used for
//! both directions of a connection: the requester side enforces the
//! lease the peer granted it before a new request-initiating frame may
//! go out, and [`super::shared::Shared`] holds a second instance for the
//! responder side, enforcing the lease this connection itself grants via
//! [`crate::config::LeasePublisher`] against inbound initiate-request
//! frames.

use std::time::{Duration, Instant};

use tracing::trace;

/// The requester-side view of the most recently received lease.
#[derive(Debug, Clone, Copy)]
struct Lease {
    remaining: u32,
    expires_at: Instant,
}

impl Lease {
    fn is_valid(&self, now: Instant) -> bool {
        self.remaining > 0 && now < self.expires_at
    }
}

/// Tracks the current lease and whether leasing is in effect at all for
/// this connection (it is only active when both peers advertised
/// `honor_lease`/sent a `Setup` with the lease flag set).
pub struct LeaseAccounting {
    enabled: bool,
    current: Option<Lease>,
}

impl LeaseAccounting {
    pub fn new(enabled: bool) -> Self {
        LeaseAccounting {
            enabled,
            current: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record an inbound `Lease` frame, replacing whatever lease was
    /// outstanding.
    pub fn on_lease_received(&mut self, number_of_requests: u32, ttl: Duration, now: Instant) {
        trace!(number_of_requests, ?ttl, "lease received");
        self.current = Some(Lease {
            remaining: number_of_requests,
            expires_at: now + ttl,
        });
    }

    /// Whether a new request-initiating frame may be sent right now. When
    /// leasing is disabled this is always true.
    pub fn is_allowed(&self, now: Instant) -> bool {
        if !self.enabled {
            return true;
        }
        self.current.map(|l| l.is_valid(now)).unwrap_or(false)
    }

    /// Consume one unit of the current lease. Caller must have checked
    /// [`Self::is_allowed`] first; this never goes negative.
    pub fn consume(&mut self, now: Instant) {
        if !self.enabled {
            return;
        }
        if let Some(lease) = self.current.as_mut() {
            if lease.is_valid(now) && lease.remaining > 0 {
                lease.remaining -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_always_allows() {
        let accounting = LeaseAccounting::new(false);
        assert!(accounting.is_allowed(Instant::now()));
    }

    #[test]
    fn enabled_with_no_lease_yet_disallows() {
        let accounting = LeaseAccounting::new(true);
        assert!(!accounting.is_allowed(Instant::now()));
    }

    #[test]
    fn lease_is_allowed_until_exhausted() {
        let mut accounting = LeaseAccounting::new(true);
        let now = Instant::now();
        accounting.on_lease_received(2, Duration::from_secs(30), now);

        assert!(accounting.is_allowed(now));
        accounting.consume(now);
        assert!(accounting.is_allowed(now));
        accounting.consume(now);
        assert!(!accounting.is_allowed(now));
    }

    #[test]
    fn lease_expires_by_ttl_even_with_remaining_budget() {
        let mut accounting = LeaseAccounting::new(true);
        let now = Instant::now();
        accounting.on_lease_received(100, Duration::from_millis(1), now);
        let later = now + Duration::from_millis(2);
        assert!(!accounting.is_allowed(later));
    }

    #[test]
    fn new_lease_replaces_the_old_one() {
        let mut accounting = LeaseAccounting::new(true);
        let now = Instant::now();
        accounting.on_lease_received(1, Duration::from_secs(30), now);
        accounting.consume(now);
        assert!(!accounting.is_allowed(now));

        accounting.on_lease_received(5, Duration::from_secs(30), now);
        assert!(accounting.is_allowed(now));
    }
}
