//! Store Module
//!
//! The key-value store collaborator and the typed adapter the coordinator
//! talks to. The coordinator never sees bytes; the store never sees types.

mod adapter;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

pub use adapter::StoreAdapter;
pub use memory::MemoryStore;

// == Key-Value Store ==
/// A remote or local byte store with per-key expiry.
///
/// Implementations must be safe to share between tasks. A missing or expired
/// key is `Ok(None)`; `Err` is reserved for transport and protocol faults.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the bytes stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Writes `bytes` under `key`, overwriting any existing entry.
    ///
    /// A zero `ttl` stores the entry without expiry.
    async fn set(&self, key: &str, bytes: Vec<u8>, ttl: Duration) -> Result<(), StoreError>;

    /// Releases the underlying connection. Calling it twice is not an error.
    async fn close(&self) -> Result<(), StoreError>;
}
