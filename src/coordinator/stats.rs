//! Coordinator counters.
//!
//! Lock-free counters updated from request handlers and background tasks.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct CoordinatorStats {
    hits: AtomicU64,
    misses: AtomicU64,
    soft_misses: AtomicU64,
    shared: AtomicU64,
    computations: AtomicU64,
    compute_errors: AtomicU64,
    refreshes_started: AtomicU64,
    refreshes_skipped: AtomicU64,
    refresh_failures: AtomicU64,
    write_back_failures: AtomicU64,
    write_backs_skipped: AtomicU64,
}

/// Point-in-time copy of [`CoordinatorStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoordinatorSnapshot {
    pub hits: u64,
    /// Clean misses: the store answered "not found"
    pub misses: u64,
    /// Store read failures handled as misses
    pub soft_misses: u64,
    /// Callers served by another caller's computation
    pub shared: u64,
    /// Compute function invocations on the miss path
    pub computations: u64,
    pub compute_errors: u64,
    pub refreshes_started: u64,
    pub refreshes_skipped: u64,
    pub refresh_failures: u64,
    pub write_back_failures: u64,
    /// Write-backs dropped because the coordinator was shutting down
    pub write_backs_skipped: u64,
}

impl CoordinatorSnapshot {
    /// hits / (hits + misses + soft_misses), or 0.0 before any request.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.soft_misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

macro_rules! counters {
    ($($record:ident => $field:ident),* $(,)?) => {
        impl CoordinatorStats {
            $(
                pub fn $record(&self) {
                    self.$field.fetch_add(1, Ordering::Relaxed);
                }
            )*

            pub fn snapshot(&self) -> CoordinatorSnapshot {
                CoordinatorSnapshot {
                    $($field: self.$field.load(Ordering::Relaxed),)*
                }
            }
        }
    };
}

counters! {
    record_hit => hits,
    record_miss => misses,
    record_soft_miss => soft_misses,
    record_shared => shared,
    record_computation => computations,
    record_compute_error => compute_errors,
    record_refresh_started => refreshes_started,
    record_refresh_skipped => refreshes_skipped,
    record_refresh_failure => refresh_failures,
    record_write_back_failure => write_back_failures,
    record_write_back_skipped => write_backs_skipped,
}
