//! Read-through bindings of [`ScoringService`] queries.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};

use super::{
    normalize_key, AggregatedCategoryScores, CacheKeyKind, DateRange, PeriodChange,
    ScoringService, TicketScores,
};
use crate::coordinator::{Coordinator, RequestContext};
use crate::error::Result;

/// TTL used when none (or zero) is configured.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// A [`ScoringService`] fronted by the cache coordinator.
#[derive(Clone)]
pub struct CachedScoring {
    service: Arc<dyn ScoringService>,
    coordinator: Coordinator,
    ttl: Duration,
}

impl CachedScoring {
    pub fn new(service: Arc<dyn ScoringService>, coordinator: Coordinator, ttl: Duration) -> Self {
        let ttl = if ttl.is_zero() { DEFAULT_CACHE_TTL } else { ttl };
        Self {
            service,
            coordinator,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    async fn cached<T, F, Fut>(
        &self,
        ctx: &RequestContext,
        kind: CacheKeyKind,
        range: DateRange,
        query: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
        F: FnOnce(Arc<dyn ScoringService>, RequestContext) -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, super::ScoringError>> + Send + 'static,
    {
        let key = normalize_key(kind, &range);
        let service = Arc::clone(&self.service);
        self.coordinator
            .get_or_compute(ctx, &key, self.ttl, move |fetch_ctx| async move {
                Ok::<_, anyhow::Error>(query(service, fetch_ctx).await?)
            })
            .await
    }

    pub async fn overall_score(&self, ctx: &RequestContext, range: DateRange) -> Result<f64> {
        self.cached(ctx, CacheKeyKind::OverallScore, range, move |svc, ctx| async move {
            svc.overall_score(&ctx, range).await
        })
        .await
    }

    pub async fn scores_by_ticket(
        &self,
        ctx: &RequestContext,
        range: DateRange,
    ) -> Result<Vec<TicketScores>> {
        self.cached(ctx, CacheKeyKind::TicketScores, range, move |svc, ctx| async move {
            svc.scores_by_ticket(&ctx, range).await
        })
        .await
    }

    pub async fn period_over_period_change(
        &self,
        ctx: &RequestContext,
        range: DateRange,
    ) -> Result<PeriodChange> {
        self.cached(ctx, CacheKeyKind::PeriodChange, range, move |svc, ctx| async move {
            svc.period_over_period_change(&ctx, range).await
        })
        .await
    }

    pub async fn aggregated_category_scores(
        &self,
        ctx: &RequestContext,
        range: DateRange,
    ) -> Result<Vec<AggregatedCategoryScores>> {
        self.cached(ctx, CacheKeyKind::AggregatedCategory, range, move |svc, ctx| async move {
            svc.aggregated_category_scores(&ctx, range).await
        })
        .await
    }
}
