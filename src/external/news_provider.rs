use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct ExternalNewsItem {
    pub source: String,
    pub headline: String,
    pub url: Option<String>,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum NewsProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("rate limited")]
    RateLimited,
}

#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Articles about `ticker` published between `from` and `to`, both inclusive.
    async fn fetch_company_news(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ExternalNewsItem>, NewsProviderError>;
}
