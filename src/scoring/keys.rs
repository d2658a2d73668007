//! Cache key derivation for scoring queries.

use std::fmt;

use super::DateRange;

/// Which query a cache key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKeyKind {
    OverallScore,
    TicketScores,
    PeriodChange,
    AggregatedCategory,
}

impl CacheKeyKind {
    pub fn prefix(self) -> &'static str {
        match self {
            CacheKeyKind::OverallScore => "scoring:overall_quality_score",
            CacheKeyKind::TicketScores => "scoring:scores_by_ticket",
            CacheKeyKind::PeriodChange => "scoring:period_over_period_score_change",
            CacheKeyKind::AggregatedCategory => "scoring:aggregated_category_scores",
        }
    }
}

impl fmt::Display for CacheKeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// `{prefix}:{start day}:{end day}`, both days in UTC.
///
/// Requests within the same pair of days share an entry, whatever their
/// time of day or offset.
pub fn normalize_key(kind: CacheKeyKind, range: &DateRange) -> String {
    format!(
        "{}:{}:{}",
        kind.prefix(),
        range.start.date_naive().format("%Y-%m-%d"),
        range.end.date_naive().format("%Y-%m-%d"),
    )
}
