//! API Routes
//!
//! Configures the Axum router with all scoring endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    category_scores_handler, health_handler, overall_score_handler, period_change_handler,
    stats_handler, ticket_scores_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /scores/overall?start=..&end=..` - Overall quality score
/// - `GET /scores/tickets?start=..&end=..` - Category scores per ticket
/// - `GET /scores/period-change?start=..&end=..` - Change against the previous period
/// - `GET /scores/categories?start=..&end=..` - Category scores per day or week
/// - `GET /stats` - Coordinator and store statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/scores/overall", get(overall_score_handler))
        .route("/scores/tickets", get(ticket_scores_handler))
        .route("/scores/period-change", get(period_change_handler))
        .route("/scores/categories", get(category_scores_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
