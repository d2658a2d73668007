//! Response DTOs for the scoring API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::coordinator::CoordinatorSnapshot;
use crate::scoring::{AggregatedCategoryScores, PeriodChange, TicketScores};
use crate::store::memory::StoreStats;

/// Response body for GET /scores/overall
#[derive(Debug, Clone, Serialize)]
pub struct OverallScoreResponse {
    /// Weighted score percentage over the period
    pub score: f64,
}

/// Response body for GET /scores/tickets
#[derive(Debug, Clone, Serialize)]
pub struct TicketScoresResponse {
    pub ticket_scores: Vec<TicketScores>,
}

/// Response body for GET /scores/period-change
#[derive(Debug, Clone, Serialize)]
pub struct PeriodChangeResponse {
    #[serde(flatten)]
    pub change: PeriodChange,
}

/// Response body for GET /scores/categories
#[derive(Debug, Clone, Serialize)]
pub struct CategoryScoresResponse {
    pub category_scores: Vec<AggregatedCategoryScores>,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub coordinator: CoordinatorSnapshot,
    /// Coordinator hit rate (hits / lookups)
    pub hit_rate: f64,
    /// Computations currently in flight
    pub in_flight: usize,
    /// Present only when the coordinator runs on the in-memory store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreStatsResponse>,
}

impl StatsResponse {
    pub fn new(
        coordinator: CoordinatorSnapshot,
        in_flight: usize,
        store: Option<StoreStats>,
    ) -> Self {
        Self {
            hit_rate: coordinator.hit_rate(),
            coordinator,
            in_flight,
            store: store.map(StoreStatsResponse::from),
        }
    }
}

/// In-memory store counters as reported by GET /stats
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatsResponse {
    #[serde(flatten)]
    pub stats: StoreStats,
    pub hit_rate: f64,
}

impl From<StoreStats> for StoreStatsResponse {
    fn from(stats: StoreStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
