//! Entry Table Module
//!
//! The synchronous core of the in-memory store: a HashMap of entries with
//! recency tracking for capacity eviction and lazy TTL expiration.

use std::collections::HashMap;
use std::time::Duration;

use super::{RecencyIndex, StoreEntry, StoreStats, MAX_KEY_LENGTH, MAX_VALUE_SIZE};
use crate::error::StoreError;

// == Entry Table ==
#[derive(Debug)]
pub struct EntryTable {
    entries: HashMap<String, StoreEntry>,
    recency: RecencyIndex,
    stats: StoreStats,
    max_entries: usize,
}

impl EntryTable {
    /// Creates a table holding at most `max_entries` entries.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            recency: RecencyIndex::new(),
            stats: StoreStats::new(),
            max_entries,
        }
    }

    // == Insert ==
    /// Stores `bytes` under `key`, replacing any previous entry and its TTL.
    ///
    /// Evicts the least recently used entry when inserting a new key at capacity.
    pub fn insert(&mut self, key: &str, bytes: Vec<u8>, ttl: Duration) -> Result<(), StoreError> {
        if key.len() > MAX_KEY_LENGTH {
            return Err(StoreError::Rejected(format!(
                "key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }
        if bytes.len() > MAX_VALUE_SIZE {
            return Err(StoreError::Rejected(format!(
                "value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }

        if !self.entries.contains_key(key) && self.entries.len() >= self.max_entries {
            match self.recency.pop_oldest() {
                Some(evicted) => {
                    self.entries.remove(&evicted);
                    self.stats.record_eviction();
                }
                None => {
                    return Err(StoreError::Rejected("store is full".to_string()));
                }
            }
        }

        self.entries
            .insert(key.to_string(), StoreEntry::new(bytes, ttl));
        self.recency.touch(key);
        Ok(())
    }

    // == Lookup ==
    /// Returns a copy of the live value under `key`.
    ///
    /// An expired entry is dropped on the spot and reported as absent.
    pub fn lookup(&mut self, key: &str) -> Option<Vec<u8>> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.discard(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            return None;
        }

        self.stats.record_hit();
        self.recency.touch(key);
        self.entries.get(key).map(|entry| entry.bytes.clone())
    }

    /// Returns the remaining TTL of a live entry without counting a read.
    ///
    /// `Some(None)` means the entry exists and never expires.
    pub fn ttl_remaining(&self, key: &str) -> Option<Option<Duration>> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(StoreEntry::ttl_remaining)
    }

    /// Returns the TTL a live entry was written with.
    pub fn written_ttl(&self, key: &str) -> Option<Option<Duration>> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(StoreEntry::ttl)
    }

    /// Removes an entry. Returns whether it existed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.discard(key)
    }

    // == Purge Expired ==
    /// Removes every expired entry and returns how many were dropped.
    pub fn purge_expired(&mut self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.discard(key);
        }
        self.stats.record_expirations(expired.len());
        expired.len()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency = RecencyIndex::new();
    }

    pub fn stats(&self) -> StoreStats {
        let mut stats = self.stats.clone();
        stats.total_entries = self.entries.len();
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn discard(&mut self, key: &str) -> bool {
        self.recency.remove(key);
        self.entries.remove(key).is_some()
    }
}
