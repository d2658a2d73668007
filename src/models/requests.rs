//! Request DTOs for the scoring API
//!
//! Defines the query parameters accepted by the score endpoints.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::scoring::DateRange;

/// Query string for every `/scores/*` endpoint.
///
/// Dates are kept as raw strings so a malformed value is reported through
/// the same JSON error body as any other validation failure.
///
/// # Fields
/// - `start`: period start, RFC 3339 (`2024-01-01T00:00:00Z`)
/// - `end`: period end, RFC 3339, not before `start`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeriodQuery {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

impl PeriodQuery {
    /// Parses and validates the period.
    ///
    /// Returns an error message if validation fails.
    pub fn into_range(self) -> Result<DateRange, String> {
        let (Some(start), Some(end)) = (non_empty(self.start), non_empty(self.end)) else {
            return Err("start and end dates are required".to_string());
        };

        let range = DateRange::new(parse_date("start", &start)?, parse_date("end", &end)?);
        if !range.is_ordered() {
            return Err("end date must be after start date".to_string());
        }
        Ok(range)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_date(field: &str, value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|date| date.with_timezone(&Utc))
        .map_err(|e| format!("invalid {field} date '{value}': {e}"))
}
