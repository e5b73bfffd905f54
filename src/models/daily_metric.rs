use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row of `daily_ticker_metrics`: price, return, sentiment and rolling
/// correlation for a ticker on a UTC calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct DailyMetric {
    pub ticker: String,
    pub date: NaiveDate,
    pub close_price: Option<f64>,
    pub daily_return: Option<f64>,
    pub avg_sentiment_score: Option<f64>,
    pub dominant_sentiment_label: Option<String>,
    pub article_count: i32,
    pub rolling_corr_7d: Option<f64>,
    pub updated_at: DateTime<Utc>,
    pub corr_updated_at: Option<DateTime<Utc>>,
}

/// Metric fields written by the aggregation pass. The correlation columns
/// are owned by the correlation pass and never appear here.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertDailyMetric {
    pub ticker: String,
    pub date: NaiveDate,
    pub close_price: Option<f64>,
    pub daily_return: Option<f64>,
    pub avg_sentiment_score: Option<f64>,
    pub dominant_sentiment_label: Option<String>,
    pub article_count: i32,
}

impl UpsertDailyMetric {
    /// True when applying this upsert to `row` would not change any metric field.
    pub fn matches(&self, row: &DailyMetric) -> bool {
        self.close_price == row.close_price
            && self.daily_return == row.daily_return
            && self.avg_sentiment_score == row.avg_sentiment_score
            && self.dominant_sentiment_label == row.dominant_sentiment_label
            && self.article_count == row.article_count
    }
}
