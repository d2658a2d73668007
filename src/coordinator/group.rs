//! Coalescing group.
//!
//! At most one computation per key runs at a time. Callers arriving while a
//! computation is in flight wait for its result instead of starting another.
//! Computations run as spawned tasks, so a waiter that gives up never cancels
//! the work other waiters depend on.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use super::RequestContext;
use crate::error::{CacheError, Result};

type SharedValue = Arc<dyn Any + Send + Sync>;
type Outcome = std::result::Result<SharedValue, CacheError>;
type Slot = watch::Receiver<Option<Outcome>>;
type CallMap = Arc<Mutex<HashMap<String, Slot>>>;

/// Tracks in-flight computations by key.
///
/// Cloning shares the same in-flight map.
#[derive(Debug, Clone, Default)]
pub struct Group {
    calls: CallMap,
}

/// A registration on an in-flight computation.
#[derive(Debug)]
pub struct Call {
    key: String,
    slot: Slot,
    shared: bool,
}

impl Call {
    /// True if this caller joined a computation started by someone else.
    pub fn is_shared(&self) -> bool {
        self.shared
    }

    /// Waits for the computation's result.
    pub async fn wait<T>(mut self) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let published = self
            .slot
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|outcome| (*outcome).clone());

        let value = published.ok_or_else(|| CacheError::Aborted(self.key.clone()))??;
        value
            .downcast::<T>()
            .map(|value| (*value).clone())
            .map_err(|_| CacheError::TypeMismatch {
                key: self.key,
                expected: type_name::<T>(),
            })
    }

    /// Waits for the result, giving up when `ctx` is cancelled or expires.
    ///
    /// Giving up only stops this caller from waiting; the computation keeps
    /// running for anyone else.
    pub async fn wait_with<T>(self, ctx: &RequestContext) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        ctx.run(self.wait()).await?
    }
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        lock_calls(&self.calls)
    }

    /// Number of computations currently in flight.
    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    // == Join Or Start ==
    /// Joins the computation in flight under `key`, or starts `f` if there is none.
    ///
    /// `f` is only invoked when this caller is the first for `key`.
    pub fn join_or_start<T, F, Fut>(&self, key: &str, f: F) -> Call
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let (tx, slot) = {
            let mut calls = self.lock();
            if let Some(slot) = calls.get(key) {
                return Call {
                    key: key.to_string(),
                    slot: slot.clone(),
                    shared: true,
                };
            }
            let (tx, slot) = watch::channel(None);
            calls.insert(key.to_string(), slot.clone());
            (tx, slot)
        };

        self.start(key, tx, f);
        Call {
            key: key.to_string(),
            slot,
            shared: false,
        }
    }

    /// Runs `f` under `key` with coalescing and returns `(result, was_shared)`.
    pub async fn call<T, F, Fut>(&self, key: &str, f: F) -> (Result<T>, bool)
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let call = self.join_or_start(key, f);
        let shared = call.is_shared();
        (call.wait().await, shared)
    }

    /// Like [`Group::call`], but the wait honors `ctx`.
    pub async fn call_with_context<T, F, Fut>(
        &self,
        ctx: &RequestContext,
        key: &str,
        f: F,
    ) -> (Result<T>, bool)
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        if let Some(err) = ctx.err() {
            return (Err(err), false);
        }
        let call = self.join_or_start(key, f);
        let shared = call.is_shared();
        (call.wait_with(ctx).await, shared)
    }

    // == Spawn Exclusive ==
    /// Starts `f` under `key` only if neither `key` nor any of `conflicts` is
    /// in flight. Returns None, without invoking `f`, when it was dropped.
    ///
    /// Later callers of [`Group::join_or_start`] with `key` join this computation.
    pub fn spawn_exclusive<T, F, Fut>(&self, key: &str, conflicts: &[&str], f: F) -> Option<Call>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let (tx, slot) = {
            let mut calls = self.lock();
            if calls.contains_key(key) || conflicts.iter().any(|c| calls.contains_key(*c)) {
                return None;
            }
            let (tx, slot) = watch::channel(None);
            calls.insert(key.to_string(), slot.clone());
            (tx, slot)
        };

        self.start(key, tx, f);
        Some(Call {
            key: key.to_string(),
            slot,
            shared: false,
        })
    }

    /// Builds the computation's future and launches it. A panic while building
    /// it is published as [`CacheError::Aborted`] and frees `key`, the same as
    /// a panic while running.
    fn start<T, F, Fut>(&self, key: &str, tx: watch::Sender<Option<Outcome>>, f: F)
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(fut) => self.launch(key.to_string(), tx, fut),
            Err(_) => {
                tracing::error!(key, "coalesced computation panicked before starting");
                self.lock().remove(key);
                let _ = tx.send(Some(Err(CacheError::Aborted(key.to_string()))));
            }
        }
    }

    /// Drives `fut` to completion on its own task, unregisters `key`, then
    /// publishes the outcome to every waiter.
    fn launch<T, Fut>(&self, key: String, tx: watch::Sender<Option<Outcome>>, fut: Fut)
    where
        T: Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let calls = Arc::clone(&self.calls);
        tokio::spawn(async move {
            let outcome = match tokio::spawn(fut).await {
                Ok(Ok(value)) => Ok(Arc::new(value) as SharedValue),
                Ok(Err(err)) => Err(err),
                Err(join_err) => {
                    tracing::error!(key, error = %join_err, "coalesced computation panicked");
                    Err(CacheError::Aborted(key.clone()))
                }
            };

            lock_calls(&calls).remove(&key);
            // no receivers left is fine: everyone gave up waiting
            let _ = tx.send(Some(outcome));
        });
    }
}

fn lock_calls(calls: &CallMap) -> MutexGuard<'_, HashMap<String, Slot>> {
    calls.lock().unwrap_or_else(PoisonError::into_inner)
}
