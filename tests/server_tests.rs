//! End-to-end tests over a real TCP listener.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use readthrough::scoring::{
    AggregatedCategoryScores, DateRange, PeriodChange, ScoringError, TicketScores,
};
use readthrough::{server, Config, RequestContext, ScoringService};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

#[derive(Default)]
struct SteadyScoring {
    calls: AtomicUsize,
}

#[async_trait]
impl ScoringService for SteadyScoring {
    async fn overall_score(
        &self,
        _ctx: &RequestContext,
        _range: DateRange,
    ) -> Result<f64, ScoringError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(64.25)
    }

    async fn scores_by_ticket(
        &self,
        _ctx: &RequestContext,
        _range: DateRange,
    ) -> Result<Vec<TicketScores>, ScoringError> {
        Ok(Vec::new())
    }

    async fn period_over_period_change(
        &self,
        _ctx: &RequestContext,
        _range: DateRange,
    ) -> Result<PeriodChange, ScoringError> {
        Ok(PeriodChange {
            current_period_score: 70.0,
            previous_period_score: 56.0,
            change_percentage: 25.0,
        })
    }

    async fn aggregated_category_scores(
        &self,
        _ctx: &RequestContext,
        _range: DateRange,
    ) -> Result<Vec<AggregatedCategoryScores>, ScoringError> {
        Err(ScoringError::NoRatings)
    }
}

#[tokio::test]
async fn test_serve_answers_and_shuts_down() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let service = Arc::new(SteadyScoring::default());
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn({
        let service = service.clone();
        async move {
            server::serve_on(listener, &Config::default(), service, async {
                let _ = stop_rx.await;
            })
            .await
        }
    });

    let client = reqwest::Client::new();
    let query = "start=2024-03-01T00:00:00Z&end=2024-03-31T00:00:00Z";

    let health: Value = client
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");

    for _ in 0..2 {
        let response = client
            .get(format!("{base}/scores/overall?{query}"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["score"], 64.25);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(service.calls.load(Ordering::SeqCst), 1);

    let change: Value = client
        .get(format!("{base}/scores/period-change?{query}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(change["change_percentage"], 25.0);

    let missing = client
        .get(format!("{base}/scores/categories?{query}"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    drop(client);
    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}
