//! Observability sink for coordinator events.
//!
//! Events are advisory only; nothing an observer does feeds back into the
//! coordinator's decisions.

use std::time::Duration;

use tracing::{debug, error, warn};

/// Something the coordinator did or noticed, tagged with the cache key.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEvent {
    Hit { key: String },
    Miss { key: String },
    /// The store read failed; the request continues as a miss
    StoreReadFailed { key: String, error: String },
    /// A caller received a result computed for another caller
    Shared { key: String },
    Computed { key: String },
    ComputeFailed { key: String, error: String },
    WriteBackSucceeded { key: String, ttl: Duration },
    WriteBackFailed { key: String, error: String },
    /// The coordinator was shutting down, so the computed value was not stored
    WriteBackSkipped { key: String },
    RefreshScheduled { key: String, delay: Duration },
    /// A refresh found work already in flight for the key and was dropped
    RefreshSkipped { key: String },
    RefreshSucceeded { key: String, ttl: Duration },
    RefreshFailed { key: String, error: String },
    TypeMismatch { key: String, expected: &'static str },
}

impl CacheEvent {
    pub fn key(&self) -> &str {
        match self {
            CacheEvent::Hit { key }
            | CacheEvent::Miss { key }
            | CacheEvent::StoreReadFailed { key, .. }
            | CacheEvent::Shared { key }
            | CacheEvent::Computed { key }
            | CacheEvent::ComputeFailed { key, .. }
            | CacheEvent::WriteBackSucceeded { key, .. }
            | CacheEvent::WriteBackFailed { key, .. }
            | CacheEvent::WriteBackSkipped { key }
            | CacheEvent::RefreshScheduled { key, .. }
            | CacheEvent::RefreshSkipped { key }
            | CacheEvent::RefreshSucceeded { key, .. }
            | CacheEvent::RefreshFailed { key, .. }
            | CacheEvent::TypeMismatch { key, .. } => key,
        }
    }
}

/// Receives coordinator events.
pub trait CacheObserver: Send + Sync {
    fn on_event(&self, event: &CacheEvent);
}

/// Forwards events to `tracing` at a level matching their severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl CacheObserver for TracingObserver {
    fn on_event(&self, event: &CacheEvent) {
        match event {
            CacheEvent::Hit { key } => debug!(key, "cache hit"),
            CacheEvent::Miss { key } => debug!(key, "cache miss"),
            CacheEvent::StoreReadFailed { key, error } => {
                warn!(key, error, "cache get error (treating as miss)")
            }
            CacheEvent::Shared { key } => debug!(key, "coalesced onto in-flight computation"),
            CacheEvent::Computed { key } => debug!(key, "value computed"),
            CacheEvent::ComputeFailed { key, error } => error!(key, error, "compute failed"),
            CacheEvent::WriteBackSucceeded { key, ttl } => {
                debug!(key, ttl = ?ttl, "cache populated on miss")
            }
            CacheEvent::WriteBackFailed { key, error } => {
                warn!(key, error, "failed to set cache on miss")
            }
            CacheEvent::WriteBackSkipped { key } => {
                warn!(key, "shutting down, skipping cache write-back")
            }
            CacheEvent::RefreshScheduled { key, delay } => {
                debug!(key, delay = ?delay, "background refresh scheduled")
            }
            CacheEvent::RefreshSkipped { key } => {
                debug!(key, "background refresh skipped, key busy")
            }
            CacheEvent::RefreshSucceeded { key, ttl } => {
                debug!(key, ttl = ?ttl, "cache refreshed in background")
            }
            CacheEvent::RefreshFailed { key, error } => {
                warn!(key, error, "background refresh failed")
            }
            CacheEvent::TypeMismatch { key, expected } => {
                error!(key, expected, "in-flight result has unexpected type")
            }
        }
    }
}

/// Discards every event. Used when no observer is supplied.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl CacheObserver for NoopObserver {
    fn on_event(&self, _event: &CacheEvent) {}
}
