use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::Store;
use crate::db::{daily_metric_queries, news_queries, price_queries};
use crate::errors::AppError;
use crate::models::{
    CreateNewsEvent, DailyMetric, NewsCursor, NewsEvent, PriceCandle, SentimentScore, UpsertDailyMetric,
};

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_news_events(&self, events: &[CreateNewsEvent]) -> Result<usize, AppError> {
        Ok(news_queries::insert_missing(&self.pool, events).await?)
    }

    async fn fetch_unscored_news(
        &self,
        after: Option<NewsCursor>,
        limit: i64,
    ) -> Result<Vec<NewsEvent>, AppError> {
        Ok(news_queries::fetch_unscored(&self.pool, after, limit).await?)
    }

    async fn update_news_sentiment(
        &self,
        id: Uuid,
        sentiment: SentimentScore,
        scored_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        news_queries::update_sentiment(&self.pool, id, sentiment.label.as_str(), sentiment.score, scored_at)
            .await?;
        Ok(())
    }

    async fn fetch_scored_news(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<NewsEvent>, AppError> {
        Ok(news_queries::fetch_scored_between(&self.pool, ticker, start, end).await?)
    }

    async fn insert_price_candles(&self, candles: &[PriceCandle]) -> Result<usize, AppError> {
        Ok(price_queries::insert_missing(&self.pool, candles).await?)
    }

    async fn fetch_price_candles(&self, ticker: &str) -> Result<Vec<PriceCandle>, AppError> {
        Ok(price_queries::fetch_all(&self.pool, ticker).await?)
    }

    async fn ensure_daily_metrics_index(&self) -> Result<(), AppError> {
        daily_metric_queries::ensure_unique_index(&self.pool).await?;
        Ok(())
    }

    async fn upsert_daily_metric(
        &self,
        metric: &UpsertDailyMetric,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        daily_metric_queries::upsert(&self.pool, metric, updated_at).await?;
        Ok(())
    }

    async fn fetch_daily_metrics(&self, ticker: &str) -> Result<Vec<DailyMetric>, AppError> {
        Ok(daily_metric_queries::fetch_all(&self.pool, ticker).await?)
    }

    async fn fetch_daily_metrics_since(
        &self,
        ticker: &str,
        start: NaiveDate,
    ) -> Result<Vec<DailyMetric>, AppError> {
        Ok(daily_metric_queries::fetch_since(&self.pool, ticker, start).await?)
    }

    async fn latest_metric_date(&self, ticker: &str) -> Result<Option<NaiveDate>, AppError> {
        Ok(daily_metric_queries::fetch_latest_date(&self.pool, ticker).await?)
    }

    async fn update_rolling_corr(
        &self,
        ticker: &str,
        date: NaiveDate,
        corr: Option<f64>,
        computed_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        daily_metric_queries::update_rolling_corr(&self.pool, ticker, date, corr, computed_at).await?;
        Ok(())
    }
}
