//! Background Tasks Module
//!
//! Long-running maintenance tasks owned by the service rather than by a
//! single request.
//!
//! # Tasks
//! - Expiry sweep: reclaims expired entries from the in-memory store

mod cleanup;

pub use cleanup::spawn_expiry_sweeper;
