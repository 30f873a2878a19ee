use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::payload::Payload;

/// Supplies outbound `Lease` frames on the responder side. The core enforces
/// leases; deciding how many requests to grant and when is entirely up to
/// this trait's implementor (see the Non-goals in the specification this
/// core follows: lease negotiation strategy is out of scope for the core).
pub trait LeasePublisher: Send + Sync {
    /// Subscribe to the stream of leases to grant. Each item is
    /// `(number_of_requests, ttl)`.
    fn subscribe(&self) -> mpsc::Receiver<(u32, Duration)>;
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("keep_alive_interval ({keep_alive:?}) must be less than max_lifetime ({max_lifetime:?})")]
    KeepAliveExceedsLifetime {
        keep_alive: Duration,
        max_lifetime: Duration,
    },
}

/// Engine construction options. See the Configuration table in the
/// specification this core follows for the authoritative semantics of each
/// field.
pub struct ConnectionConfig {
    pub honor_lease: bool,
    pub lease_publisher: Option<Arc<dyn LeasePublisher>>,
    pub request_queue_size: usize,
    pub data_mime_type: String,
    pub metadata_mime_type: String,
    pub keep_alive_interval: Duration,
    pub max_lifetime: Duration,
    pub setup_payload: Option<Payload>,
    /// Outbound fragmentation threshold. `None` disables fragmentation on
    /// send; the core never fragments inbound data (that's the peer's
    /// job). Not part of the distilled specification's Configuration
    /// table but named by its design notes as an engine-level policy.
    pub fragment_size: Option<usize>,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("honor_lease", &self.honor_lease)
            .field("lease_publisher", &self.lease_publisher.is_some())
            .field("request_queue_size", &self.request_queue_size)
            .field("data_mime_type", &self.data_mime_type)
            .field("metadata_mime_type", &self.metadata_mime_type)
            .field("keep_alive_interval", &self.keep_alive_interval)
            .field("max_lifetime", &self.max_lifetime)
            .field("setup_payload", &self.setup_payload)
            .field("fragment_size", &self.fragment_size)
            .finish()
    }
}

impl ConnectionConfig {
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }
}

pub struct ConnectionConfigBuilder {
    honor_lease: bool,
    lease_publisher: Option<Arc<dyn LeasePublisher>>,
    request_queue_size: usize,
    data_mime_type: String,
    metadata_mime_type: String,
    keep_alive_interval: Duration,
    max_lifetime: Duration,
    setup_payload: Option<Payload>,
    fragment_size: Option<usize>,
}

impl Default for ConnectionConfigBuilder {
    fn default() -> Self {
        ConnectionConfigBuilder {
            honor_lease: false,
            lease_publisher: None,
            request_queue_size: 0,
            data_mime_type: "application/octet-stream".into(),
            metadata_mime_type: "application/octet-stream".into(),
            keep_alive_interval: Duration::from_secs(20),
            max_lifetime: Duration::from_secs(90),
            setup_payload: None,
            fragment_size: None,
        }
    }
}

impl ConnectionConfigBuilder {
    pub fn honor_lease(mut self, honor_lease: bool) -> Self {
        self.honor_lease = honor_lease;
        self
    }

    pub fn lease_publisher(mut self, publisher: Arc<dyn LeasePublisher>) -> Self {
        self.lease_publisher = Some(publisher);
        self
    }

    pub fn request_queue_size(mut self, size: usize) -> Self {
        self.request_queue_size = size;
        self
    }

    pub fn data_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.data_mime_type = mime.into();
        self
    }

    pub fn metadata_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.metadata_mime_type = mime.into();
        self
    }

    pub fn keep_alive_interval(mut self, interval: Duration) -> Self {
        self.keep_alive_interval = interval;
        self
    }

    pub fn max_lifetime(mut self, max_lifetime: Duration) -> Self {
        self.max_lifetime = max_lifetime;
        self
    }

    pub fn setup_payload(mut self, payload: Payload) -> Self {
        self.setup_payload = Some(payload);
        self
    }

    pub fn fragment_size(mut self, size: usize) -> Self {
        self.fragment_size = Some(size);
        self
    }

    pub fn build(self) -> Result<ConnectionConfig, ConfigError> {
        if self.keep_alive_interval >= self.max_lifetime {
            return Err(ConfigError::KeepAliveExceedsLifetime {
                keep_alive: self.keep_alive_interval,
                max_lifetime: self.max_lifetime,
            });
        }

        Ok(ConnectionConfig {
            honor_lease: self.honor_lease,
            lease_publisher: self.lease_publisher,
            request_queue_size: self.request_queue_size,
            data_mime_type: self.data_mime_type,
            metadata_mime_type: self.metadata_mime_type,
            keep_alive_interval: self.keep_alive_interval,
            max_lifetime: self.max_lifetime,
            setup_payload: self.setup_payload,
            fragment_size: self.fragment_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_keep_alive_not_shorter_than_lifetime() {
        let err = ConnectionConfig::builder()
            .keep_alive_interval(Duration::from_secs(90))
            .max_lifetime(Duration::from_secs(90))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::KeepAliveExceedsLifetime { .. }));
    }

    #[test]
    fn default_config_builds() {
        assert!(ConnectionConfig::builder().build().is_ok());
    }
}
