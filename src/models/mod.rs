//! Request and Response models for the scoring API
//!
//! DTOs used for deserializing query strings and serializing HTTP response
//! bodies.

pub mod requests;
pub mod responses;

pub use requests::PeriodQuery;
pub use responses::{
    CategoryScoresResponse, ErrorResponse, HealthResponse, OverallScoreResponse,
    PeriodChangeResponse, StatsResponse, StoreStatsResponse, TicketScoresResponse,
};
