//! API Module
//!
//! HTTP handlers and routing for the scoring REST API.
//!
//! # Endpoints
//! - `GET /scores/overall` - Overall quality score for a period
//! - `GET /scores/tickets` - Scores by ticket
//! - `GET /scores/period-change` - Period over period change
//! - `GET /scores/categories` - Aggregated category scores
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
