use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// One daily OHLCV bar as returned by an upstream feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalCandle {
    pub ts: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("ticker not found")]
    NotFound,

    #[error("rate limited")]
    RateLimited,
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Value stored in the `source` column of candles from this provider.
    fn source(&self) -> &'static str;

    /// Daily bars covering roughly the last `days` days, oldest first.
    async fn fetch_daily_candles(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<ExternalCandle>, PriceProviderError>;
}
