//! HTTP surface tests driven through the router with `oneshot`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde_json::Value;
use tower::ServiceExt;

use sentiment_tracker::app::create_app;
use sentiment_tracker::config::AppConfig;
use sentiment_tracker::external::price_provider::{ExternalCandle, PriceProvider, PriceProviderError};
use sentiment_tracker::models::UpsertDailyMetric;
use sentiment_tracker::services::failure_cache::FailureCache;
use sentiment_tracker::services::job_scheduler_service::JobContext;
use sentiment_tracker::services::sentiment_scorer::VaderSentimentScorer;
use sentiment_tracker::state::AppState;
use sentiment_tracker::store::{InMemoryStore, Store};

struct NoPrices;

#[async_trait]
impl PriceProvider for NoPrices {
    fn source(&self) -> &'static str {
        "none"
    }

    async fn fetch_daily_candles(&self, _ticker: &str, _days: u32) -> Result<Vec<ExternalCandle>, PriceProviderError> {
        Ok(Vec::new())
    }
}

fn app_with(store: Arc<InMemoryStore>) -> Router {
    let context = JobContext {
        store,
        price_provider: Arc::new(NoPrices),
        news_provider: None,
        scorer: Arc::new(VaderSentimentScorer::new()),
        failure_cache: Arc::new(FailureCache::new()),
        config: Arc::new(AppConfig::default()),
    };
    create_app(AppState::new(context))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

async fn seed_metrics(store: &InMemoryStore, ticker: &str, days: std::ops::RangeInclusive<u32>) {
    for day in days {
        let metric = UpsertDailyMetric {
            ticker: ticker.to_string(),
            date: date(day),
            close_price: Some(100.0 + day as f64),
            daily_return: if day == 1 { None } else { Some(0.01) },
            avg_sentiment_score: Some(0.2),
            dominant_sentiment_label: Some("bullish".to_string()),
            article_count: 3,
        };
        store.upsert_daily_metric(&metric, Utc::now()).await.unwrap();
    }
}

#[tokio::test]
async fn test_health_is_ok() {
    let app = app_with(Arc::new(InMemoryStore::new()));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_lists_supported_tickers() {
    let app = app_with(Arc::new(InMemoryStore::new()));

    let (status, body) = get(app, "/tickers").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tickers"], serde_json::json!(["AAPL", "MSFT", "TSLA", "NVDA"]));
}

#[tokio::test]
async fn test_landing_lists_endpoints() {
    let app = app_with(Arc::new(InMemoryStore::new()));

    let (status, body) = get(app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["endpoints"]["/tickers"].is_string());
}

#[tokio::test]
async fn test_unsupported_ticker_is_404() {
    let app = app_with(Arc::new(InMemoryStore::new()));

    let (status, body) = get(app, "/ticker/ZZZZ/timeseries").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Ticker ZZZZ is not supported");
}

#[tokio::test]
async fn test_supported_ticker_without_rows_is_empty() {
    let app = app_with(Arc::new(InMemoryStore::new()));

    let (status, body) = get(app, "/ticker/MSFT/timeseries").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticker"], "MSFT");
    assert_eq!(body["points"], serde_json::json!([]));
    assert!(body["from_date"].is_null());
    assert!(body["to_date"].is_null());
}

#[tokio::test]
async fn test_days_out_of_range_is_400() {
    let app = app_with(Arc::new(InMemoryStore::new()));

    let (status, _) = get(app.clone(), "/ticker/AAPL/timeseries?days=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(app, "/ticker/AAPL/timeseries?days=91").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_timeseries_window_trails_latest_row() {
    let store = Arc::new(InMemoryStore::new());
    seed_metrics(&store, "AAPL", 1..=10).await;
    let app = app_with(store);

    // Lower-case path segment is normalized.
    let (status, body) = get(app, "/ticker/aapl/timeseries?days=3").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticker"], "AAPL");
    assert_eq!(body["from_date"], "2024-01-08");
    assert_eq!(body["to_date"], "2024-01-10");

    let points = body["points"].as_array().unwrap();
    assert_eq!(points.len(), 3);
    assert_eq!(points[0]["date"], "2024-01-08");
    assert_eq!(points[0]["close_price"], 108.0);
    assert_eq!(points[0]["avg_sentiment"], 0.2);
    assert_eq!(points[0]["dominant_sentiment"], "bullish");
    assert_eq!(points[0]["article_count"], 3);
    assert!(points[0]["rolling_corr_7d"].is_null());
}

#[tokio::test]
async fn test_trigger_unknown_job_is_404() {
    let app = app_with(Arc::new(InMemoryStore::new()));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/jobs/not_a_job/trigger")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_trigger_runs_correlation_job() {
    let store = Arc::new(InMemoryStore::new());
    seed_metrics(&store, "TSLA", 1..=3).await;
    let app = app_with(store);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/jobs/compute_rolling_correlation/trigger")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["job_name"], "compute_rolling_correlation");
    assert_eq!(body["items_processed"], 4);
    assert_eq!(body["items_failed"], 0);
}
