//! API Handlers
//!
//! HTTP request handlers for each scoring endpoint. Every score query goes
//! through the cache coordinator under a per-request deadline.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::config::Config;
use crate::coordinator::{Coordinator, RequestContext};
use crate::error::ApiError;
use crate::models::{
    CategoryScoresResponse, HealthResponse, OverallScoreResponse, PeriodChangeResponse,
    PeriodQuery, StatsResponse, TicketScoresResponse,
};
use crate::scoring::{CachedScoring, DateRange, ScoringService};
use crate::store::MemoryStore;

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Scoring queries fronted by the coordinator
    pub scoring: CachedScoring,
    /// Time budget of one HTTP request
    pub request_timeout: Duration,
    /// The in-memory store behind the coordinator, when there is one
    pub store: Option<MemoryStore>,
}

impl AppState {
    pub fn new(scoring: CachedScoring, request_timeout: Duration) -> Self {
        Self {
            scoring,
            request_timeout,
            store: None,
        }
    }

    /// Reports this store's counters on `/stats`.
    pub fn with_memory_store(mut self, store: MemoryStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Wires an in-memory store, a coordinator and `service` from configuration.
    pub fn from_config(config: &Config, service: Arc<dyn ScoringService>) -> Self {
        let store = MemoryStore::new(config.max_entries);
        let coordinator = Coordinator::new(Arc::new(store.clone()), config.coordinator_config());
        let scoring = CachedScoring::new(service, coordinator, config.cache_ttl());
        Self::new(scoring, config.request_timeout()).with_memory_store(store)
    }

    pub fn coordinator(&self) -> &Coordinator {
        self.scoring.coordinator()
    }

    fn request_context(&self) -> RequestContext {
        RequestContext::with_timeout(self.request_timeout)
    }
}

fn parse_range(query: PeriodQuery) -> Result<DateRange, ApiError> {
    query.into_range().map_err(ApiError::InvalidRequest)
}

/// Handler for GET /scores/overall
pub async fn overall_score_handler(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<OverallScoreResponse> {
    let range = parse_range(query)?;
    let score = state
        .scoring
        .overall_score(&state.request_context(), range)
        .await?;

    Ok(Json(OverallScoreResponse { score }))
}

/// Handler for GET /scores/tickets
pub async fn ticket_scores_handler(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<TicketScoresResponse> {
    let range = parse_range(query)?;
    let ticket_scores = state
        .scoring
        .scores_by_ticket(&state.request_context(), range)
        .await?;

    Ok(Json(TicketScoresResponse { ticket_scores }))
}

/// Handler for GET /scores/period-change
pub async fn period_change_handler(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<PeriodChangeResponse> {
    let range = parse_range(query)?;
    let change = state
        .scoring
        .period_over_period_change(&state.request_context(), range)
        .await?;

    Ok(Json(PeriodChangeResponse { change }))
}

/// Handler for GET /scores/categories
pub async fn category_scores_handler(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<CategoryScoresResponse> {
    let range = parse_range(query)?;
    let category_scores = state
        .scoring
        .aggregated_category_scores(&state.request_context(), range)
        .await?;

    Ok(Json(CategoryScoresResponse { category_scores }))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let store = match &state.store {
        Some(store) => Some(store.stats().await),
        None => None,
    };
    let coordinator = state.coordinator();

    Json(StatsResponse::new(
        coordinator.stats(),
        coordinator.group().in_flight(),
        store,
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
