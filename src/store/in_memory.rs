//! In-memory [`Store`] implementation.
//!
//! Mirrors the PostgreSQL semantics that the pipeline relies on:
//! insert-if-absent for raw events, replace-on-change upserts for daily
//! metrics and the same result ordering. Data is lost on restart.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Store;
use crate::errors::AppError;
use crate::models::{
    CreateNewsEvent, DailyMetric, NewsCursor, NewsEvent, PriceCandle, SentimentScore, UpsertDailyMetric,
};

#[derive(Default)]
struct Tables {
    news: Vec<NewsEvent>,
    candles: Vec<PriceCandle>,
    daily: BTreeMap<(String, NaiveDate), DailyMetric>,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed event, including any sentiment fields. Duplicates
    /// on (ticker, headline, published_at) are ignored.
    pub async fn seed_news_event(&self, event: NewsEvent) {
        let mut tables = self.tables.write().await;
        if !tables.news.iter().any(|e| same_news_key(e, &event.ticker, &event.headline, event.published_at)) {
            tables.news.push(event);
        }
    }

    pub async fn news_events(&self) -> Vec<NewsEvent> {
        self.tables.read().await.news.clone()
    }

    pub async fn daily_metric(&self, ticker: &str, date: NaiveDate) -> Option<DailyMetric> {
        self.tables
            .read()
            .await
            .daily
            .get(&(ticker.to_string(), date))
            .cloned()
    }
}

fn same_news_key(e: &NewsEvent, ticker: &str, headline: &str, published_at: DateTime<Utc>) -> bool {
    e.ticker == ticker && e.headline == headline && e.published_at == published_at
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert_news_events(&self, events: &[CreateNewsEvent]) -> Result<usize, AppError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let mut inserted = 0;

        for event in events {
            let exists = tables
                .news
                .iter()
                .any(|e| same_news_key(e, &event.ticker, &event.headline, event.published_at));
            if !exists {
                tables.news.push(NewsEvent::from_create(event, now));
                inserted += 1;
            }
        }

        Ok(inserted)
    }

    async fn fetch_unscored_news(
        &self,
        after: Option<NewsCursor>,
        limit: i64,
    ) -> Result<Vec<NewsEvent>, AppError> {
        let tables = self.tables.read().await;
        let mut unscored: Vec<NewsEvent> = tables
            .news
            .iter()
            .filter(|e| e.sentiment_score.is_none())
            .filter(|e| after.map_or(true, |cursor| NewsCursor::of(e) > cursor))
            .cloned()
            .collect();
        unscored.sort_by_key(NewsCursor::of);
        unscored.truncate(limit.max(0) as usize);
        Ok(unscored)
    }

    async fn update_news_sentiment(
        &self,
        id: Uuid,
        sentiment: SentimentScore,
        scored_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if let Some(event) = tables.news.iter_mut().find(|e| e.id == id) {
            event.sentiment_label = Some(sentiment.label.to_string());
            event.sentiment_score = Some(sentiment.score);
            event.sentiment_updated_at = Some(scored_at);
        }
        Ok(())
    }

    async fn fetch_scored_news(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<NewsEvent>, AppError> {
        let tables = self.tables.read().await;
        let mut events: Vec<NewsEvent> = tables
            .news
            .iter()
            .filter(|e| e.ticker == ticker)
            .filter(|e| e.published_at >= start && e.published_at < end)
            .filter(|e| e.sentiment_score.is_some())
            .cloned()
            .collect();
        // Stable sort: equal keys keep insertion order.
        events.sort_by(|a, b| {
            a.published_at
                .cmp(&b.published_at)
                .then_with(|| a.headline.cmp(&b.headline))
        });
        Ok(events)
    }

    async fn insert_price_candles(&self, candles: &[PriceCandle]) -> Result<usize, AppError> {
        let mut tables = self.tables.write().await;
        let mut inserted = 0;

        for candle in candles {
            let exists = tables
                .candles
                .iter()
                .any(|c| c.ticker == candle.ticker && c.ts == candle.ts);
            if !exists {
                tables.candles.push(candle.clone());
                inserted += 1;
            }
        }

        Ok(inserted)
    }

    async fn fetch_price_candles(&self, ticker: &str) -> Result<Vec<PriceCandle>, AppError> {
        let tables = self.tables.read().await;
        let mut candles: Vec<PriceCandle> = tables
            .candles
            .iter()
            .filter(|c| c.ticker == ticker)
            .cloned()
            .collect();
        candles.sort_by_key(|c| c.ts);
        Ok(candles)
    }

    async fn ensure_daily_metrics_index(&self) -> Result<(), AppError> {
        // The map key is the unique index.
        Ok(())
    }

    async fn upsert_daily_metric(
        &self,
        metric: &UpsertDailyMetric,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        let key = (metric.ticker.clone(), metric.date);

        match tables.daily.get_mut(&key) {
            Some(row) if metric.matches(row) => {}
            Some(row) => {
                row.close_price = metric.close_price;
                row.daily_return = metric.daily_return;
                row.avg_sentiment_score = metric.avg_sentiment_score;
                row.dominant_sentiment_label = metric.dominant_sentiment_label.clone();
                row.article_count = metric.article_count;
                row.updated_at = updated_at;
            }
            None => {
                tables.daily.insert(
                    key,
                    DailyMetric {
                        ticker: metric.ticker.clone(),
                        date: metric.date,
                        close_price: metric.close_price,
                        daily_return: metric.daily_return,
                        avg_sentiment_score: metric.avg_sentiment_score,
                        dominant_sentiment_label: metric.dominant_sentiment_label.clone(),
                        article_count: metric.article_count,
                        rolling_corr_7d: None,
                        updated_at,
                        corr_updated_at: None,
                    },
                );
            }
        }

        Ok(())
    }

    async fn fetch_daily_metrics(&self, ticker: &str) -> Result<Vec<DailyMetric>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .daily
            .values()
            .filter(|m| m.ticker == ticker)
            .cloned()
            .collect())
    }

    async fn fetch_daily_metrics_since(
        &self,
        ticker: &str,
        start: NaiveDate,
    ) -> Result<Vec<DailyMetric>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .daily
            .values()
            .filter(|m| m.ticker == ticker && m.date >= start)
            .cloned()
            .collect())
    }

    async fn latest_metric_date(&self, ticker: &str) -> Result<Option<NaiveDate>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .daily
            .values()
            .filter(|m| m.ticker == ticker)
            .map(|m| m.date)
            .max())
    }

    async fn update_rolling_corr(
        &self,
        ticker: &str,
        date: NaiveDate,
        corr: Option<f64>,
        computed_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if let Some(row) = tables.daily.get_mut(&(ticker.to_string(), date)) {
            if row.corr_updated_at.is_none() || row.rolling_corr_7d != corr {
                row.rolling_corr_7d = corr;
                row.corr_updated_at = Some(computed_at);
            }
        }
        Ok(())
    }
}
