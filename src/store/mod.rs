//! Persistence seam for the pipeline.
//!
//! Services talk to a [`Store`] instead of a pool directly so the same
//! aggregation, correlation and read paths run against PostgreSQL in
//! production and against [`InMemoryStore`] in tests and local runs.

mod in_memory;
mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{
    CreateNewsEvent, DailyMetric, NewsCursor, NewsEvent, PriceCandle, SentimentScore, UpsertDailyMetric,
};

#[async_trait]
pub trait Store: Send + Sync {
    /// Insert headlines missing from the store; returns how many were new.
    async fn insert_news_events(&self, events: &[CreateNewsEvent]) -> Result<usize, AppError>;

    /// Up to `limit` unscored headlines ordered by `(published_at, id)`,
    /// starting strictly after `after` when given.
    async fn fetch_unscored_news(
        &self,
        after: Option<NewsCursor>,
        limit: i64,
    ) -> Result<Vec<NewsEvent>, AppError>;

    async fn update_news_sentiment(
        &self,
        id: Uuid,
        sentiment: SentimentScore,
        scored_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Scored headlines for `ticker` published in `[start, end)`, ordered by
    /// publication time then headline.
    async fn fetch_scored_news(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<NewsEvent>, AppError>;

    /// Insert candles missing from the store; returns how many were new.
    async fn insert_price_candles(&self, candles: &[PriceCandle]) -> Result<usize, AppError>;

    /// All candles for `ticker`, oldest first.
    async fn fetch_price_candles(&self, ticker: &str) -> Result<Vec<PriceCandle>, AppError>;

    async fn ensure_daily_metrics_index(&self) -> Result<(), AppError>;

    async fn upsert_daily_metric(
        &self,
        metric: &UpsertDailyMetric,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// All daily rows for `ticker`, oldest date first.
    async fn fetch_daily_metrics(&self, ticker: &str) -> Result<Vec<DailyMetric>, AppError>;

    /// Daily rows for `ticker` on or after `start`, oldest date first.
    async fn fetch_daily_metrics_since(
        &self,
        ticker: &str,
        start: NaiveDate,
    ) -> Result<Vec<DailyMetric>, AppError>;

    async fn latest_metric_date(&self, ticker: &str) -> Result<Option<NaiveDate>, AppError>;

    async fn update_rolling_corr(
        &self,
        ticker: &str,
        date: NaiveDate,
        corr: Option<f64>,
        computed_at: DateTime<Utc>,
    ) -> Result<(), AppError>;
}
