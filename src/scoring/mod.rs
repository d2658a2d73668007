//! Scoring Module
//!
//! Ticket-quality scoring answers served through the cache coordinator.
//! The scoring computation itself lives behind [`ScoringService`]; this
//! module only defines its shapes and binds each query to a cache key.

mod cached;
mod keys;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coordinator::RequestContext;

pub use cached::{CachedScoring, DEFAULT_CACHE_TTL};
pub use keys::{normalize_key, CacheKeyKind};

// == Scoring Error Enum ==
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoringError {
    /// No ratings exist in the requested period
    #[error("no ratings found for the given period")]
    NoRatings,

    /// The backing database failed
    #[error("storage failure: {0}")]
    Storage(String),
}

// == Date Range ==
/// Inclusive time period a query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// True when `end` is not before `start`.
    pub fn is_ordered(&self) -> bool {
        self.end >= self.start
    }
}

// == Domain Types ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketScores {
    pub ticket_id: i64,
    /// Category name to score percentage
    pub category_scores: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodChange {
    pub current_period_score: f64,
    pub previous_period_score: f64,
    pub change_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodScore {
    /// Day (`2024-01-15`) or week (`2024-W03`) label
    pub period: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedCategoryScores {
    pub category_name: String,
    pub total_ratings: u64,
    pub overall_category_score: f64,
    pub period_scores: Vec<PeriodScore>,
}

// == Scoring Service Trait ==
/// The expensive computations the cache sits in front of.
///
/// Implementations should honor `ctx`: it carries the fetch timeout the
/// coordinator grants each computation.
#[async_trait]
pub trait ScoringService: Send + Sync {
    async fn overall_score(
        &self,
        ctx: &RequestContext,
        range: DateRange,
    ) -> Result<f64, ScoringError>;

    async fn scores_by_ticket(
        &self,
        ctx: &RequestContext,
        range: DateRange,
    ) -> Result<Vec<TicketScores>, ScoringError>;

    async fn period_over_period_change(
        &self,
        ctx: &RequestContext,
        range: DateRange,
    ) -> Result<PeriodChange, ScoringError>;

    async fn aggregated_category_scores(
        &self,
        ctx: &RequestContext,
        range: DateRange,
    ) -> Result<Vec<AggregatedCategoryScores>, ScoringError>;
}
