//! Store Entry Module
//!
//! A serialized value plus the deadline after which the store stops serving it.

use std::time::Duration;

use tokio::time::Instant;

// == Store Entry ==
/// One stored value with its expiry.
#[derive(Debug, Clone)]
pub struct StoreEntry {
    /// Encoded payload
    pub bytes: Vec<u8>,
    /// When the entry was written
    pub written_at: Instant,
    /// Expiry deadline, None = never expires
    pub expires_at: Option<Instant>,
}

impl StoreEntry {
    /// Creates an entry. A zero TTL means the entry never expires, and so
    /// does a TTL too large to represent as a deadline.
    pub fn new(bytes: Vec<u8>, ttl: Duration) -> Self {
        let now = Instant::now();
        let expires_at = if ttl.is_zero() {
            None
        } else {
            now.checked_add(ttl)
        };

        Self {
            bytes,
            written_at: now,
            expires_at,
        }
    }

    // == Is Expired ==
    /// An entry is expired once the current time reaches its deadline.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(deadline) if now >= deadline)
    }

    /// Remaining lifetime, `Some(ZERO)` once expired, None if the entry never expires.
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// The TTL the entry was written with.
    pub fn ttl(&self) -> Option<Duration> {
        self.expires_at
            .map(|deadline| deadline.duration_since(self.written_at))
    }
}
