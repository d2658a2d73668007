//! In-Memory Store
//!
//! A `KeyValueStore` kept in process memory with TTL expiration and LRU
//! eviction. Used in tests and single-node deployments in place of a remote
//! key-value service.

mod entry;
mod recency;
mod stats;
mod table;


use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::KeyValueStore;
use crate::error::StoreError;

pub use entry::StoreEntry;
pub use recency::RecencyIndex;
pub use stats::StoreStats;
pub use table::EntryTable;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

// == Memory Store ==
/// Shared handle to an in-memory entry table.
///
/// Cloning is cheap; all clones see the same entries.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    table: Arc<RwLock<EntryTable>>,
    closed: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Creates a store holding at most `max_entries` entries.
    pub fn new(max_entries: usize) -> Self {
        Self {
            table: Arc::new(RwLock::new(EntryTable::new(max_entries))),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Remaining lifetime of a live entry. `Some(None)` for entries without expiry.
    pub async fn ttl_remaining(&self, key: &str) -> Option<Option<Duration>> {
        self.table.read().await.ttl_remaining(key)
    }

    /// The TTL a live entry was last written with.
    pub async fn written_ttl(&self, key: &str) -> Option<Option<Duration>> {
        self.table.read().await.written_ttl(key)
    }

    /// Removes an entry. Returns whether it existed.
    pub async fn remove(&self, key: &str) -> bool {
        self.table.write().await.remove(key)
    }

    /// Drops all expired entries and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        self.table.write().await.purge_expired()
    }

    pub async fn stats(&self) -> StoreStats {
        self.table.read().await.stats()
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.table.read().await.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.is_closed() {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.ensure_open()?;
        // write lock: a read updates recency and may drop an expired entry
        Ok(self.table.write().await.lookup(key))
    }

    async fn set(&self, key: &str, bytes: Vec<u8>, ttl: Duration) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.table.write().await.insert(key, bytes, ttl)
    }

    async fn close(&self) -> Result<(), StoreError> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.table.write().await.clear();
            tracing::debug!("in-memory store closed");
        }
        Ok(())
    }
}
