//! Recency Index
//!
//! Orders keys by last access so the in-memory store can evict the least
//! recently used entry when it reaches capacity.

use std::collections::{BTreeMap, HashMap};

// == Recency Index ==
/// Tracks access order with a monotonically increasing tick per touch.
///
/// `by_tick` is ordered oldest-first, `ticks` maps a key to its current tick.
#[derive(Debug, Default)]
pub struct RecencyIndex {
    next_tick: u64,
    by_tick: BTreeMap<u64, String>,
    ticks: HashMap<String, u64>,
}

impl RecencyIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used.
    pub fn touch(&mut self, key: &str) {
        let tick = self.next_tick;
        self.next_tick += 1;

        if let Some(previous) = self.ticks.insert(key.to_string(), tick) {
            self.by_tick.remove(&previous);
        }
        self.by_tick.insert(tick, key.to_string());
    }

    /// Forgets a key. Unknown keys are ignored.
    pub fn remove(&mut self, key: &str) {
        if let Some(tick) = self.ticks.remove(key) {
            self.by_tick.remove(&tick);
        }
    }

    // == Pop Oldest ==
    /// Removes and returns the least recently used key.
    pub fn pop_oldest(&mut self) -> Option<String> {
        let (_, key) = self.by_tick.pop_first()?;
        self.ticks.remove(&key);
        Some(key)
    }

    /// Returns the least recently used key without removing it.
    pub fn oldest(&self) -> Option<&str> {
        self.by_tick.values().next().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_order_follows_insertion() {
        let mut index = RecencyIndex::new();
        index.touch("a");
        index.touch("b");
        index.touch("c");

        assert_eq!(index.pop_oldest().as_deref(), Some("a"));
        assert_eq!(index.pop_oldest().as_deref(), Some("b"));
        assert_eq!(index.pop_oldest().as_deref(), Some("c"));
        assert_eq!(index.pop_oldest(), None);
    }

    #[test]
    fn test_touch_moves_key_to_newest() {
        let mut index = RecencyIndex::new();
        index.touch("a");
        index.touch("b");
        index.touch("c");
        index.touch("a");

        assert_eq!(index.len(), 3);
        assert_eq!(index.oldest(), Some("b"));
    }

    #[test]
    fn test_remove_keeps_other_keys() {
        let mut index = RecencyIndex::new();
        index.touch("a");
        index.touch("b");
        index.remove("a");
        index.remove("missing");

        assert_eq!(index.len(), 1);
        assert_eq!(index.oldest(), Some("b"));
    }

    #[test]
    fn test_repeated_touch_single_entry() {
        let mut index = RecencyIndex::new();
        index.touch("k");
        index.touch("k");
        index.touch("k");

        assert_eq!(index.len(), 1);
        assert_eq!(index.pop_oldest().as_deref(), Some("k"));
        assert!(index.is_empty());
    }
}
