//! Store Statistics Module
//!
//! Hit, miss and eviction counters for the in-memory store.

use serde::Serialize;

// == Store Stats ==
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    /// Reads that found a live entry
    pub hits: u64,
    /// Reads that found nothing or an expired entry
    pub misses: u64,
    /// Entries dropped to stay under capacity
    pub evictions: u64,
    /// Entries removed because their TTL elapsed
    pub expirations: u64,
    /// Current number of entries
    pub total_entries: usize,
}

impl StoreStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// hits / (hits + misses), or 0.0 before any read.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(StoreStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = StoreStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_expirations_accumulate() {
        let mut stats = StoreStats::new();
        stats.record_expirations(2);
        stats.record_expirations(3);
        stats.record_eviction();
        assert_eq!(stats.expirations, 5);
        assert_eq!(stats.evictions, 1);
    }
}
