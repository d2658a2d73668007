//! Error types for the cache coordinator
//!
//! Store faults, coordinator faults and HTTP-facing errors are kept apart so
//! that callers can tell "the cache is unhealthy" from "the answer failed".

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::scoring::ScoringError;

// == Store Error Enum ==
/// Errors reported by a key-value store or by the typed adapter around it.
///
/// "Not found" is deliberately absent: a missing key is `Ok(None)`.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// The store could not be reached or rejected the operation
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The stored bytes could not be decoded into the requested type
    #[error("failed to decode cached value: {0}")]
    Decode(String),

    /// The value could not be encoded for storage
    #[error("failed to encode value: {0}")]
    Encode(String),

    /// The store refused the write (key or value too large, store full)
    #[error("write rejected: {0}")]
    Rejected(String),

    /// The store has been closed
    #[error("store is closed")]
    Closed,

    /// The operation did not finish in time
    #[error("store operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

// == Cache Error Enum ==
/// Errors surfaced to callers of the coordinator.
///
/// Store faults never show up here; they are absorbed as soft misses.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// The compute function failed; shared verbatim with every coalesced waiter
    #[error("{0}")]
    Compute(Arc<anyhow::Error>),

    /// The in-flight result under this key has a different type than requested
    #[error("type mismatch for key {key:?}: expected {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
    },

    /// The caller cancelled while waiting
    #[error("request cancelled")]
    Cancelled,

    /// The caller's deadline passed while waiting
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The computation ended without publishing a result (it panicked)
    #[error("computation for key {0:?} aborted")]
    Aborted(String),
}

impl CacheError {
    /// Wraps a compute failure so it can be cloned to all waiters.
    pub fn compute(err: anyhow::Error) -> Self {
        CacheError::Compute(Arc::new(err))
    }

    /// Returns the underlying compute error, if this is one.
    pub fn compute_error(&self) -> Option<&anyhow::Error> {
        match self {
            CacheError::Compute(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    /// True for `Cancelled` and `DeadlineExceeded`.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, CacheError::Cancelled | CacheError::DeadlineExceeded)
    }
}

// == API Error Enum ==
/// Error type returned by HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Failure from the cached computation path
    #[error(transparent)]
    Cache(#[from] CacheError),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Cache(CacheError::Cancelled) => {
                (StatusCode::SERVICE_UNAVAILABLE, "request canceled".to_string())
            }
            ApiError::Cache(CacheError::DeadlineExceeded) => {
                (StatusCode::GATEWAY_TIMEOUT, "request timed out".to_string())
            }
            ApiError::Cache(err) => match err
                .compute_error()
                .and_then(|e| e.downcast_ref::<ScoringError>())
            {
                Some(ScoringError::NoRatings) => (
                    StatusCode::NOT_FOUND,
                    "no ratings found for the given period".to_string(),
                ),
                Some(ScoringError::Storage(_)) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "database error".to_string())
                }
                None => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            },
        };

        if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "request failed");
        }

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for coordinator operations.
pub type Result<T> = std::result::Result<T, CacheError>;
