//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint against a fake
//! scoring service.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Datelike;
use readthrough::api::create_router;
use readthrough::scoring::{
    AggregatedCategoryScores, DateRange, PeriodChange, PeriodScore, ScoringError, TicketScores,
};
use readthrough::{
    AppState, CachedScoring, Coordinator, CoordinatorConfig, MemoryStore, RequestContext,
    ScoringService,
};
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

const JANUARY: &str = "start=2024-01-01T00:00:00Z&end=2024-01-31T00:00:00Z";

struct FakeScoring {
    calls: AtomicUsize,
    delay: Duration,
}

impl FakeScoring {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    async fn work(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
    }
}

#[async_trait]
impl ScoringService for FakeScoring {
    async fn overall_score(
        &self,
        _ctx: &RequestContext,
        _range: DateRange,
    ) -> Result<f64, ScoringError> {
        self.work().await;
        Ok(87.5)
    }

    async fn scores_by_ticket(
        &self,
        _ctx: &RequestContext,
        _range: DateRange,
    ) -> Result<Vec<TicketScores>, ScoringError> {
        self.work().await;
        Ok(vec![TicketScores {
            ticket_id: 7,
            category_scores: BTreeMap::from([
                ("Grammar".to_string(), 75.0),
                ("Tone".to_string(), 100.0),
            ]),
        }])
    }

    async fn period_over_period_change(
        &self,
        _ctx: &RequestContext,
        _range: DateRange,
    ) -> Result<PeriodChange, ScoringError> {
        self.work().await;
        Err(ScoringError::NoRatings)
    }

    async fn aggregated_category_scores(
        &self,
        _ctx: &RequestContext,
        range: DateRange,
    ) -> Result<Vec<AggregatedCategoryScores>, ScoringError> {
        self.work().await;
        if range.start.month() == 2 {
            return Err(ScoringError::Storage("relation \"ratings\" is locked".into()));
        }
        Ok(vec![AggregatedCategoryScores {
            category_name: "Spelling".into(),
            total_ratings: 3,
            overall_category_score: 80.0,
            period_scores: vec![PeriodScore {
                period: "2024-01-01".into(),
                score: 80.0,
            }],
        }])
    }
}

fn create_test_app(service: Arc<FakeScoring>, request_timeout: Duration) -> Router {
    let store = MemoryStore::new(100);
    let coordinator = Coordinator::with_observer(
        Arc::new(store.clone()),
        CoordinatorConfig::default().with_refresh(false),
        None,
    );
    let scoring = CachedScoring::new(service, coordinator, Duration::from_secs(600));
    create_router(AppState::new(scoring, request_timeout).with_memory_store(store))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// == Score Endpoint Tests ==

#[tokio::test]
async fn test_overall_score_success() {
    let app = create_test_app(FakeScoring::new(Duration::ZERO), Duration::from_secs(10));

    let response = app
        .oneshot(get(&format!("/scores/overall?{JANUARY}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["score"], 87.5);
}

#[tokio::test]
async fn test_ticket_scores_success() {
    let app = create_test_app(FakeScoring::new(Duration::ZERO), Duration::from_secs(10));

    let response = app
        .oneshot(get(&format!("/scores/tickets?{JANUARY}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["ticket_scores"][0]["ticket_id"], 7);
    assert_eq!(json["ticket_scores"][0]["category_scores"]["Tone"], 100.0);
}

#[tokio::test]
async fn test_category_scores_success() {
    let app = create_test_app(FakeScoring::new(Duration::ZERO), Duration::from_secs(10));

    let response = app
        .oneshot(get(&format!("/scores/categories?{JANUARY}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["category_scores"][0]["category_name"], "Spelling");
    assert_eq!(json["category_scores"][0]["period_scores"][0]["period"], "2024-01-01");
}

#[tokio::test]
async fn test_repeated_requests_are_served_from_cache() {
    let service = FakeScoring::new(Duration::ZERO);
    let app = create_test_app(service.clone(), Duration::from_secs(10));

    let first = app
        .clone()
        .oneshot(get(&format!("/scores/overall?{JANUARY}")))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    // let the write-back land
    tokio::time::sleep(Duration::from_millis(50)).await;

    // same days, different time of day
    let second = app
        .clone()
        .oneshot(get(
            "/scores/overall?start=2024-01-01T09:30:00Z&end=2024-01-31T18:00:00Z",
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(service.calls.load(Ordering::SeqCst), 1);

    let stats = body_to_json(app.oneshot(get("/stats")).await.unwrap().into_body()).await;
    assert_eq!(stats["coordinator"]["hits"], 1);
    assert_eq!(stats["coordinator"]["misses"], 1);
    assert_eq!(stats["store"]["total_entries"], 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_requests_compute_once() {
    let service = FakeScoring::new(Duration::from_millis(50));
    let app = create_test_app(service.clone(), Duration::from_secs(10));
    let uri = format!("/scores/tickets?{JANUARY}");

    let (a, b, c) = tokio::join!(
        app.clone().oneshot(get(&uri)),
        app.clone().oneshot(get(&uri)),
        app.clone().oneshot(get(&uri)),
    );

    for response in [a, b, c] {
        assert_eq!(response.unwrap().status(), StatusCode::OK);
    }
    assert_eq!(service.calls.load(Ordering::SeqCst), 1);
}

// == Error Mapping Tests ==

#[tokio::test]
async fn test_missing_dates_is_bad_request() {
    let app = create_test_app(FakeScoring::new(Duration::ZERO), Duration::from_secs(10));

    let response = app
        .oneshot(get("/scores/overall?start=2024-01-01T00:00:00Z"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "start and end dates are required");
}

#[tokio::test]
async fn test_reversed_dates_is_bad_request() {
    let app = create_test_app(FakeScoring::new(Duration::ZERO), Duration::from_secs(10));

    let response = app
        .oneshot(get(
            "/scores/tickets?start=2024-02-01T00:00:00Z&end=2024-01-01T00:00:00Z",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("after start date"));
}

#[tokio::test]
async fn test_malformed_date_is_bad_request() {
    let service = FakeScoring::new(Duration::ZERO);
    let app = create_test_app(service.clone(), Duration::from_secs(10));

    let response = app
        .oneshot(get("/scores/overall?start=last-week&end=2024-01-01T00:00:00Z"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_no_ratings_is_not_found() {
    let app = create_test_app(FakeScoring::new(Duration::ZERO), Duration::from_secs(10));

    let response = app
        .oneshot(get(&format!("/scores/period-change?{JANUARY}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "no ratings found for the given period");
}

#[tokio::test]
async fn test_storage_failure_is_internal_error() {
    let app = create_test_app(FakeScoring::new(Duration::ZERO), Duration::from_secs(10));

    let response = app
        .oneshot(get(
            "/scores/categories?start=2024-02-01T00:00:00Z&end=2024-02-28T00:00:00Z",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "database error");
}

#[tokio::test(start_paused = true)]
async fn test_slow_computation_times_out() {
    let service = FakeScoring::new(Duration::from_secs(1));
    let app = create_test_app(service.clone(), Duration::from_millis(100));

    let response = app
        .clone()
        .oneshot(get(&format!("/scores/overall?{JANUARY}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "request timed out");

    // the computation outlived the request and its result is now cached
    tokio::time::sleep(Duration::from_secs(2)).await;
    let response = app
        .oneshot(get(&format!("/scores/overall?{JANUARY}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(service.calls.load(Ordering::SeqCst), 1);
}

// == Stats / Health Tests ==

#[tokio::test]
async fn test_stats_endpoint_initial() {
    let app = create_test_app(FakeScoring::new(Duration::ZERO), Duration::from_secs(10));

    let response = app.oneshot(get("/stats")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["coordinator"]["hits"], 0);
    assert_eq!(json["hit_rate"], 0.0);
    assert_eq!(json["in_flight"], 0);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(FakeScoring::new(Duration::ZERO), Duration::from_secs(10));

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = create_test_app(FakeScoring::new(Duration::ZERO), Duration::from_secs(10));

    let response = app.oneshot(get("/scores/unknown")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
