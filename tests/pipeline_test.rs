//! End-to-end runs of the batch pipeline against the in-memory store:
//! ingestion, scoring, aggregation and rolling correlation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use sentiment_tracker::config::AppConfig;
use sentiment_tracker::errors::AppError;
use sentiment_tracker::external::news_provider::{ExternalNewsItem, NewsProvider, NewsProviderError};
use sentiment_tracker::external::price_provider::{ExternalCandle, PriceProvider, PriceProviderError};
use sentiment_tracker::models::{
    CreateNewsEvent, DailyMetric, NewsCursor, NewsEvent, PriceCandle, SentimentScore, UpsertDailyMetric,
};
use sentiment_tracker::services::correlation::run_rolling_corr;
use sentiment_tracker::services::daily_aggregator::run_daily_aggregation;
use sentiment_tracker::services::failure_cache::FailureCache;
use sentiment_tracker::services::job_scheduler_service::{self, JobContext};
use sentiment_tracker::services::sentiment_scorer::VaderSentimentScorer;
use sentiment_tracker::store::{InMemoryStore, Store};

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

fn candle(ticker: &str, ts: DateTime<Utc>, close: f64) -> PriceCandle {
    PriceCandle {
        ticker: ticker.to_string(),
        ts,
        open: close,
        high: close,
        low: close,
        close,
        volume: 1_000_000.0,
        source: "fixture".to_string(),
    }
}

fn scored_news(ticker: &str, published_at: DateTime<Utc>, headline: &str, label: &str, score: f64) -> NewsEvent {
    NewsEvent {
        id: Uuid::new_v4(),
        source: "fixture".to_string(),
        ticker: ticker.to_string(),
        headline: headline.to_string(),
        url: None,
        published_at,
        sentiment_label: Some(label.to_string()),
        sentiment_score: Some(score),
        sentiment_updated_at: Some(published_at),
        ingested_at: published_at,
    }
}

/// Ten trading days of AAPL with a headline most days.
async fn seed_aapl(store: &InMemoryStore) {
    let closes = [100.0, 101.0, 99.0, 99.0, 100.5, 102.0, 101.0, 103.0, 104.0, 102.5];
    let sentiments = [None, Some(0.3), Some(-0.1), Some(0.0), Some(0.25), Some(0.4), None, Some(0.5), Some(0.6), Some(-0.3)];

    let candles: Vec<PriceCandle> = closes
        .iter()
        .enumerate()
        .map(|(i, close)| candle("AAPL", at(i as u32 + 1, 21), *close))
        .collect();
    store.insert_price_candles(&candles).await.unwrap();

    for (i, sentiment) in sentiments.iter().enumerate() {
        if let Some(score) = sentiment {
            let label = if *score >= 0.05 {
                "bullish"
            } else if *score <= -0.05 {
                "bearish"
            } else {
                "neutral"
            };
            store
                .seed_news_event(scored_news("AAPL", at(i as u32 + 1, 13), &format!("AAPL day {}", i + 1), label, *score))
                .await;
        }
    }
}

#[tokio::test]
async fn test_aggregation_and_correlation_rerun_is_identical() {
    let store = InMemoryStore::new();
    seed_aapl(&store).await;
    let tickers = vec!["AAPL".to_string()];

    run_daily_aggregation(&store, &tickers, 30, date(10), 2).await.unwrap();
    run_rolling_corr(&store, &tickers, 7, 2).await.unwrap();
    let first: Vec<DailyMetric> = store.fetch_daily_metrics("AAPL").await.unwrap();

    run_daily_aggregation(&store, &tickers, 30, date(10), 2).await.unwrap();
    run_rolling_corr(&store, &tickers, 7, 2).await.unwrap();
    let second: Vec<DailyMetric> = store.fetch_daily_metrics("AAPL").await.unwrap();

    assert_eq!(first.len(), 10);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_pipeline_produces_expected_rows() {
    let store = InMemoryStore::new();
    seed_aapl(&store).await;
    let tickers = vec!["AAPL".to_string()];

    run_daily_aggregation(&store, &tickers, 30, date(10), 1).await.unwrap();
    run_rolling_corr(&store, &tickers, 7, 1).await.unwrap();

    let rows = store.fetch_daily_metrics("AAPL").await.unwrap();

    let first = &rows[0];
    assert_eq!(first.date, date(1));
    assert_eq!(first.daily_return, None);
    assert_eq!(first.avg_sentiment_score, None);
    assert_eq!(first.article_count, 0);
    assert_eq!(first.rolling_corr_7d, None);

    // Day 2 has a single usable pair, not enough for a correlation.
    assert!((rows[1].daily_return.unwrap() - 0.01).abs() < 1e-12);
    assert_eq!(rows[1].rolling_corr_7d, None);

    // Flat day: zero return is a real value, not missing.
    assert_eq!(rows[3].daily_return, Some(0.0));
    assert_eq!(rows[3].dominant_sentiment_label.as_deref(), Some("neutral"));

    for row in &rows[2..] {
        if let Some(corr) = row.rolling_corr_7d {
            assert!((-1.0..=1.0).contains(&corr), "corr {} out of range on {}", corr, row.date);
        }
    }
    assert!(rows[9].rolling_corr_7d.is_some());
}

#[tokio::test]
async fn test_correlation_ignores_future_rows() {
    let store = InMemoryStore::new();
    seed_aapl(&store).await;
    let tickers = vec!["AAPL".to_string()];

    // Only the first eight days exist on the first pass.
    run_daily_aggregation(&store, &tickers, 30, date(8), 1).await.unwrap();
    let store_partial = InMemoryStore::new();
    for row in store.fetch_daily_metrics("AAPL").await.unwrap() {
        if row.date <= date(8) {
            store_partial
                .upsert_daily_metric(&upsert_from(&row), row.updated_at)
                .await
                .unwrap();
        }
    }
    run_rolling_corr(&store_partial, &tickers, 7, 1).await.unwrap();

    run_rolling_corr(&store, &tickers, 7, 1).await.unwrap();

    for d in 1..=8 {
        let partial = store_partial.daily_metric("AAPL", date(d)).await.unwrap();
        let full = store.daily_metric("AAPL", date(d)).await.unwrap();
        assert_eq!(partial.rolling_corr_7d, full.rolling_corr_7d, "day {}", d);
    }
}

fn upsert_from(row: &DailyMetric) -> UpsertDailyMetric {
    UpsertDailyMetric {
        ticker: row.ticker.clone(),
        date: row.date,
        close_price: row.close_price,
        daily_return: row.daily_return,
        avg_sentiment_score: row.avg_sentiment_score,
        dominant_sentiment_label: row.dominant_sentiment_label.clone(),
        article_count: row.article_count,
    }
}

/// Delegates to an in-memory store but fails every candle read for one ticker.
struct FlakyStore {
    inner: InMemoryStore,
    broken_ticker: &'static str,
}

#[async_trait]
impl Store for FlakyStore {
    async fn insert_news_events(&self, events: &[CreateNewsEvent]) -> Result<usize, AppError> {
        self.inner.insert_news_events(events).await
    }

    async fn fetch_unscored_news(
        &self,
        after: Option<NewsCursor>,
        limit: i64,
    ) -> Result<Vec<NewsEvent>, AppError> {
        self.inner.fetch_unscored_news(after, limit).await
    }

    async fn update_news_sentiment(
        &self,
        id: Uuid,
        sentiment: SentimentScore,
        scored_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.inner.update_news_sentiment(id, sentiment, scored_at).await
    }

    async fn fetch_scored_news(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<NewsEvent>, AppError> {
        self.inner.fetch_scored_news(ticker, start, end).await
    }

    async fn insert_price_candles(&self, candles: &[PriceCandle]) -> Result<usize, AppError> {
        self.inner.insert_price_candles(candles).await
    }

    async fn fetch_price_candles(&self, ticker: &str) -> Result<Vec<PriceCandle>, AppError> {
        if ticker == self.broken_ticker {
            return Err(AppError::External(format!("candle read failed for {}", ticker)));
        }
        self.inner.fetch_price_candles(ticker).await
    }

    async fn ensure_daily_metrics_index(&self) -> Result<(), AppError> {
        self.inner.ensure_daily_metrics_index().await
    }

    async fn upsert_daily_metric(
        &self,
        metric: &UpsertDailyMetric,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.inner.upsert_daily_metric(metric, updated_at).await
    }

    async fn fetch_daily_metrics(&self, ticker: &str) -> Result<Vec<DailyMetric>, AppError> {
        self.inner.fetch_daily_metrics(ticker).await
    }

    async fn fetch_daily_metrics_since(
        &self,
        ticker: &str,
        start: NaiveDate,
    ) -> Result<Vec<DailyMetric>, AppError> {
        self.inner.fetch_daily_metrics_since(ticker, start).await
    }

    async fn latest_metric_date(&self, ticker: &str) -> Result<Option<NaiveDate>, AppError> {
        self.inner.latest_metric_date(ticker).await
    }

    async fn update_rolling_corr(
        &self,
        ticker: &str,
        date: NaiveDate,
        corr: Option<f64>,
        computed_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.inner.update_rolling_corr(ticker, date, corr, computed_at).await
    }
}

#[tokio::test]
async fn test_one_failing_ticker_does_not_stop_the_others() {
    let inner = InMemoryStore::new();
    seed_aapl(&inner).await;
    inner
        .insert_price_candles(&[candle("TSLA", at(2, 21), 240.0), candle("TSLA", at(3, 21), 250.0)])
        .await
        .unwrap();
    let store = FlakyStore { inner: inner.clone(), broken_ticker: "TSLA" };
    let tickers = vec!["TSLA".to_string(), "AAPL".to_string()];

    let result = run_daily_aggregation(&store, &tickers, 30, date(10), 2).await.unwrap();

    assert_eq!(result.items_processed, 1);
    assert_eq!(result.items_failed, 1);
    assert_eq!(inner.fetch_daily_metrics("AAPL").await.unwrap().len(), 10);
    assert!(inner.fetch_daily_metrics("TSLA").await.unwrap().is_empty());
}

struct FixturePrices;

#[async_trait]
impl PriceProvider for FixturePrices {
    fn source(&self) -> &'static str {
        "fixture"
    }

    async fn fetch_daily_candles(&self, _ticker: &str, days: u32) -> Result<Vec<ExternalCandle>, PriceProviderError> {
        let today = Utc::now().date_naive();
        Ok((0..days.min(10) as i64)
            .rev()
            .map(|back| {
                let ts = (today - Duration::days(back)).and_hms_opt(20, 0, 0).unwrap().and_utc();
                let close = 100.0 + (back % 3) as f64;
                ExternalCandle { ts, open: close, high: close, low: close, close, volume: 10.0 }
            })
            .collect())
    }
}

struct FixtureNews;

#[async_trait]
impl NewsProvider for FixtureNews {
    async fn fetch_company_news(
        &self,
        ticker: &str,
        _from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ExternalNewsItem>, NewsProviderError> {
        let published_at = (to - Duration::days(1)).and_hms_opt(15, 0, 0).unwrap().and_utc();
        Ok(vec![
            ExternalNewsItem {
                source: "wire".to_string(),
                headline: format!("{} shares surge to record high after strong earnings", ticker),
                url: None,
                published_at,
            },
            ExternalNewsItem {
                source: "wire".to_string(),
                headline: format!("{} faces fraud lawsuit as stock plunges", ticker),
                url: None,
                published_at: published_at + Duration::minutes(5),
            },
        ])
    }
}

fn job_context(store: Arc<InMemoryStore>) -> JobContext {
    let config = AppConfig {
        tickers: vec!["NVDA".to_string()],
        price_history_days: 10,
        ..AppConfig::default()
    };
    JobContext {
        store,
        price_provider: Arc::new(FixturePrices),
        news_provider: Some(Arc::new(FixtureNews)),
        scorer: Arc::new(VaderSentimentScorer::new()),
        failure_cache: Arc::new(FailureCache::new()),
        config: Arc::new(config),
    }
}

#[tokio::test]
async fn test_jobs_run_end_to_end_by_name() {
    let store = Arc::new(InMemoryStore::new());
    let ctx = job_context(store.clone());

    let prices = job_scheduler_service::run_job_by_name("refresh_prices", ctx.clone()).await.unwrap();
    assert_eq!(prices.items_processed, 1);
    let news = job_scheduler_service::run_job_by_name("refresh_news", ctx.clone()).await.unwrap();
    assert_eq!(news.items_processed, 1);

    let scored = job_scheduler_service::run_job_by_name("score_sentiment", ctx.clone()).await.unwrap();
    assert_eq!(scored.items_processed, 2);

    let pipeline = job_scheduler_service::run_job_by_name("run_pipeline", ctx.clone()).await.unwrap();
    assert_eq!(pipeline.items_failed, 0);

    let rows = store.fetch_daily_metrics("NVDA").await.unwrap();
    assert_eq!(rows.len(), 10);
    let yesterday = Utc::now().date_naive() - Duration::days(1);
    let busy = rows.iter().find(|r| r.date == yesterday).unwrap();
    assert_eq!(busy.article_count, 2);
    assert_eq!(busy.dominant_sentiment_label.as_deref(), Some("bullish"));
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let ctx = job_context(Arc::new(InMemoryStore::new()));

    let err = job_scheduler_service::run_job_by_name("defragment_moon", ctx).await.unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}
