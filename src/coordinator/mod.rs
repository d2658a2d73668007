//! Coordinator Module
//!
//! Read-through caching in front of expensive computations:
//!
//! - a hit is served straight from the store and schedules a best-effort
//!   refresh in the background;
//! - a miss (or an unreadable store) runs the computation once per key no
//!   matter how many callers ask, and writes the result back without making
//!   anyone wait for the write;
//! - every write carries a jittered TTL so entries written together do not
//!   expire together.

mod context;
mod group;
pub mod jitter;
mod observer;
mod stats;


use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use crate::error::{CacheError, Result, StoreError};
use crate::store::{KeyValueStore, StoreAdapter};

pub use context::RequestContext;
pub use group::{Call, Group};
pub use jitter::{jittered_ttl, refresh_delay};
pub use observer::{CacheEvent, CacheObserver, NoopObserver, TracingObserver};
pub use stats::{CoordinatorSnapshot, CoordinatorStats};

/// Suffix that moves background refreshes into their own coalescing key space.
pub const REFRESH_SUFFIX: &str = ":refresh";

/// The coalescing key a background refresh of `key` runs under.
pub fn refresh_key(key: &str) -> String {
    format!("{key}{REFRESH_SUFFIX}")
}

// == Coordinator Config ==
/// Timing policy for the coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Bound of the random offset added to every TTL written
    pub ttl_jitter: Duration,
    /// Upper bound of the random delay before a background refresh
    pub refresh_delay_max: Duration,
    /// Time budget for one computation, foreground or background
    pub fetch_timeout: Duration,
    /// Time budget for one store write
    pub write_timeout: Duration,
    /// How long `shutdown` waits for background tasks
    pub shutdown_timeout: Duration,
    /// Whether hits schedule background refreshes
    pub refresh_enabled: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            ttl_jitter: Duration::from_secs(15),
            refresh_delay_max: Duration::from_secs(1),
            fetch_timeout: Duration::from_secs(15),
            write_timeout: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(30),
            refresh_enabled: true,
        }
    }
}

impl CoordinatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jitter(mut self, bound: Duration) -> Self {
        self.ttl_jitter = bound;
        self
    }

    pub fn with_refresh_delay(mut self, max: Duration) -> Self {
        self.refresh_delay_max = max;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn with_refresh(mut self, enabled: bool) -> Self {
        self.refresh_enabled = enabled;
        self
    }
}

// == Coordinator ==
/// Read-through cache coordinator.
///
/// Cheap to clone; clones share the store, the in-flight map and the
/// background task set.
///
/// # Example
///
/// ```ignore
/// let coordinator = Coordinator::new(Arc::new(MemoryStore::new(10_000)), CoordinatorConfig::default());
/// let ctx = RequestContext::with_timeout(Duration::from_secs(10));
///
/// let score: f64 = coordinator
///     .get_or_compute(&ctx, "scoring:overall:2024-01-01:2024-01-31", Duration::from_secs(600), |ctx| async move {
///         repository.overall_score(&ctx, range).await
///     })
///     .await?;
/// ```
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

struct Inner {
    store: StoreAdapter,
    group: Group,
    config: CoordinatorConfig,
    observer: Arc<dyn CacheObserver>,
    stats: CoordinatorStats,
    tasks: TaskTracker,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("config", &self.inner.config)
            .field("in_flight", &self.inner.group.in_flight())
            .field("background_tasks", &self.inner.tasks.len())
            .finish()
    }
}

impl Coordinator {
    /// Creates a coordinator that reports events through `tracing`.
    pub fn new(store: Arc<dyn KeyValueStore>, config: CoordinatorConfig) -> Self {
        Self::with_observer(store, config, Some(Arc::new(TracingObserver)))
    }

    /// Creates a coordinator with an explicit observer; `None` silences events.
    pub fn with_observer(
        store: Arc<dyn KeyValueStore>,
        config: CoordinatorConfig,
        observer: Option<Arc<dyn CacheObserver>>,
    ) -> Self {
        let observer = observer.unwrap_or_else(|| Arc::new(NoopObserver));
        Self {
            inner: Arc::new(Inner {
                store: StoreAdapter::new(store),
                group: Group::new(),
                config,
                observer,
                stats: CoordinatorStats::default(),
                tasks: TaskTracker::new(),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    pub fn stats(&self) -> CoordinatorSnapshot {
        self.inner.stats.snapshot()
    }

    /// The coalescing group, for inspecting in-flight work.
    pub fn group(&self) -> &Group {
        &self.inner.group
    }

    /// Number of background tasks (write-backs and refreshes) still running.
    pub fn background_tasks(&self) -> usize {
        self.inner.tasks.len()
    }

    fn emit(&self, event: CacheEvent) {
        self.inner.observer.on_event(&event);
    }

    fn accepting_background_work(&self) -> bool {
        !self.inner.tasks.is_closed()
    }

    // == Get Or Compute ==
    /// Returns the value cached under `key`, computing and caching it on a miss.
    ///
    /// `ctx` bounds how long this caller waits, not how long the computation
    /// runs: when `ctx` is cancelled the caller gets [`CacheError::Cancelled`]
    /// while the computation carries on for other waiters and for the store.
    /// `compute` receives a context detached from the caller, limited by
    /// `fetch_timeout`.
    ///
    /// Store failures never fail the call. A failing `compute` does, for every
    /// caller coalesced onto it, and nothing is written.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        ctx: &RequestContext,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
        F: FnOnce(RequestContext) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        match ctx.run(self.inner.store.get::<T>(key)).await? {
            Ok(Some(value)) => {
                self.inner.stats.record_hit();
                self.emit(CacheEvent::Hit { key: key.to_string() });
                self.schedule_refresh(key, ttl, compute);
                return Ok(value);
            }
            Ok(None) => {
                self.inner.stats.record_miss();
                self.emit(CacheEvent::Miss { key: key.to_string() });
            }
            Err(err) => {
                self.inner.stats.record_soft_miss();
                self.emit(CacheEvent::StoreReadFailed {
                    key: key.to_string(),
                    error: err.to_string(),
                });
            }
        }

        let this = self.clone();
        let owned_key = key.to_string();
        let (result, shared) = self
            .inner
            .group
            .call_with_context(ctx, key, move || this.fill(owned_key, ttl, compute))
            .await;

        if shared {
            self.inner.stats.record_shared();
            self.emit(CacheEvent::Shared { key: key.to_string() });
        }
        if let Err(CacheError::TypeMismatch { key, expected }) = &result {
            self.emit(CacheEvent::TypeMismatch {
                key: key.clone(),
                expected: *expected,
            });
        }
        result
    }

    // == Fill ==
    /// The coalesced miss path: compute once, hand the value to every waiter,
    /// and write it back on the side.
    fn fill<T, F, Fut>(
        self,
        key: String,
        ttl: Duration,
        compute: F,
    ) -> impl Future<Output = Result<T>> + Send + 'static
    where
        T: Serialize + Clone + Send + Sync + 'static,
        F: FnOnce(RequestContext) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        async move {
            self.inner.stats.record_computation();
            let value = match self.run_compute(compute).await {
                Ok(value) => value,
                Err(err) => {
                    self.inner.stats.record_compute_error();
                    self.emit(CacheEvent::ComputeFailed {
                        key: key.clone(),
                        error: err.to_string(),
                    });
                    return Err(CacheError::compute(err));
                }
            };

            self.emit(CacheEvent::Computed { key: key.clone() });
            self.spawn_write_back(key, value.clone(), ttl);
            Ok(value)
        }
    }

    /// Runs `compute` under a fresh context bounded by `fetch_timeout`.
    async fn run_compute<T, F, Fut>(&self, compute: F) -> anyhow::Result<T>
    where
        F: FnOnce(RequestContext) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let timeout = self.inner.config.fetch_timeout;
        let ctx = RequestContext::detached(timeout);
        match ctx.run(compute(ctx.clone())).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!("computation exceeded {:?}", timeout)),
        }
    }

    /// Writes `value` under `key` with a jittered TTL, bounded by `write_timeout`.
    async fn write<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> std::result::Result<Duration, StoreError> {
        let ttl = jittered_ttl(ttl, self.inner.config.ttl_jitter, &mut rand::thread_rng());
        let timeout = self.inner.config.write_timeout;
        match tokio::time::timeout(timeout, self.inner.store.set(key, value, ttl)).await {
            Ok(Ok(())) => Ok(ttl),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(StoreError::Timeout(timeout)),
        }
    }

    // == Write Back ==
    fn spawn_write_back<T>(&self, key: String, value: T, ttl: Duration)
    where
        T: Serialize + Send + Sync + 'static,
    {
        if !self.accepting_background_work() {
            self.inner.stats.record_write_back_skipped();
            self.emit(CacheEvent::WriteBackSkipped { key });
            return;
        }

        let this = self.clone();
        self.inner.tasks.spawn(async move {
            match this.write(&key, &value, ttl).await {
                Ok(ttl) => this.emit(CacheEvent::WriteBackSucceeded { key, ttl }),
                Err(err) => {
                    this.inner.stats.record_write_back_failure();
                    this.emit(CacheEvent::WriteBackFailed {
                        key,
                        error: err.to_string(),
                    });
                }
            }
        });
    }

    // == Background Refresh ==
    /// Recomputes `key` after a short random delay unless work for it is
    /// already in flight. Best effort: a dropped refresh is not retried.
    fn schedule_refresh<T, F, Fut>(&self, key: &str, ttl: Duration, compute: F)
    where
        T: Serialize + Clone + Send + Sync + 'static,
        F: FnOnce(RequestContext) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        if !self.inner.config.refresh_enabled || !self.accepting_background_work() {
            return;
        }

        let delay = refresh_delay(self.inner.config.refresh_delay_max, &mut rand::thread_rng());
        self.emit(CacheEvent::RefreshScheduled {
            key: key.to_string(),
            delay,
        });

        let this = self.clone();
        let key = key.to_string();
        self.inner.tasks.spawn(async move {
            tokio::select! {
                biased;
                _ = this.inner.shutdown.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            let worker = this.clone();
            let base_key = key.clone();
            let call = this.inner.group.spawn_exclusive(
                &refresh_key(&key),
                &[key.as_str()],
                move || worker.refresh(base_key, ttl, compute),
            );

            match call {
                Some(call) => {
                    this.inner.stats.record_refresh_started();
                    // outcome already reported by `refresh`
                    let _ = call.wait::<T>().await;
                }
                None => {
                    this.inner.stats.record_refresh_skipped();
                    this.emit(CacheEvent::RefreshSkipped { key });
                }
            }
        });
    }

    fn refresh<T, F, Fut>(
        self,
        key: String,
        ttl: Duration,
        compute: F,
    ) -> impl Future<Output = Result<T>> + Send + 'static
    where
        T: Serialize + Clone + Send + Sync + 'static,
        F: FnOnce(RequestContext) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        async move {
            let value = match self.run_compute(compute).await {
                Ok(value) => value,
                Err(err) => {
                    self.inner.stats.record_refresh_failure();
                    self.emit(CacheEvent::RefreshFailed {
                        key,
                        error: err.to_string(),
                    });
                    return Err(CacheError::compute(err));
                }
            };

            match self.write(&key, &value, ttl).await {
                Ok(ttl) => self.emit(CacheEvent::RefreshSucceeded { key, ttl }),
                Err(err) => {
                    self.inner.stats.record_refresh_failure();
                    self.emit(CacheEvent::RefreshFailed {
                        key,
                        error: err.to_string(),
                    });
                }
            }
            Ok(value)
        }
    }

    // == Shutdown ==
    /// Stops scheduling background work, waits for what is running (up to
    /// `shutdown_timeout`), then closes the store.
    ///
    /// Refreshes still waiting out their start delay are dropped.
    pub async fn shutdown(&self) -> std::result::Result<(), StoreError> {
        self.inner.tasks.close();
        self.inner.shutdown.cancel();

        let timeout = self.inner.config.shutdown_timeout;
        if tokio::time::timeout(timeout, self.inner.tasks.wait())
            .await
            .is_err()
        {
            warn!(
                pending = self.inner.tasks.len(),
                "background tasks still running after {:?}", timeout
            );
        } else {
            info!("coordinator background tasks drained");
        }

        self.inner.store.close().await
    }
}
