//! Expiry Sweeper Task
//!
//! Background task that periodically removes expired entries from an
//! in-memory store. Reads already skip expired entries; the sweep only
//! reclaims memory for keys nobody asks for again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::MemoryStore;

/// Spawns a task that purges expired entries every `interval_secs` seconds.
///
/// The task stops on its own once the store is closed. The returned handle
/// can also be aborted during shutdown.
///
/// # Example
/// ```ignore
/// let store = MemoryStore::new(10_000);
/// let sweeper = spawn_expiry_sweeper(store.clone(), 1);
/// // Later, during shutdown:
/// sweeper.abort();
/// ```
pub fn spawn_expiry_sweeper(store: MemoryStore, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "starting expiry sweeper");

        loop {
            tokio::time::sleep(interval).await;

            if store.is_closed() {
                debug!("store closed, expiry sweeper exiting");
                break;
            }

            let removed = store.purge_expired().await;
            if removed > 0 {
                info!(removed, "expiry sweep removed entries");
            } else {
                debug!("expiry sweep found nothing to remove");
            }
        }
    })
}
