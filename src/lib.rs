//! Readthrough - read-through caching for expensive queries
//!
//! Serves answers from a key-value store, computes each missing answer once
//! no matter how many callers ask for it, refreshes hot entries in the
//! background and spreads expiry times with TTL jitter.

pub mod api;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod models;
pub mod scoring;
pub mod server;
pub mod store;
pub mod tasks;
pub mod telemetry;

pub use api::AppState;
pub use config::Config;
pub use coordinator::{Coordinator, CoordinatorConfig, RequestContext};
pub use error::{ApiError, CacheError, StoreError};
pub use scoring::{CachedScoring, ScoringService};
pub use store::{KeyValueStore, MemoryStore, StoreAdapter};
pub use tasks::spawn_expiry_sweeper;
