use serde::{Deserialize, Serialize};

use super::DailyMetric;

/// One day of the ticker time series as served to the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeSeriesPoint {
    pub date: String,
    pub close_price: Option<f64>,
    pub daily_return: Option<f64>,
    pub avg_sentiment: Option<f64>,
    pub dominant_sentiment: Option<String>,
    pub article_count: i32,
    pub rolling_corr_7d: Option<f64>,
}

impl From<DailyMetric> for TimeSeriesPoint {
    fn from(row: DailyMetric) -> Self {
        Self {
            date: row.date.format("%Y-%m-%d").to_string(),
            close_price: row.close_price,
            daily_return: row.daily_return,
            avg_sentiment: row.avg_sentiment_score,
            dominant_sentiment: row.dominant_sentiment_label,
            article_count: row.article_count,
            rolling_corr_7d: row.rolling_corr_7d,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeSeriesResponse {
    pub ticker: String,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub points: Vec<TimeSeriesPoint>,
}

impl TimeSeriesResponse {
    /// Response for a supported ticker that has no daily rows yet.
    pub fn empty(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            from_date: None,
            to_date: None,
            points: Vec::new(),
        }
    }
}
