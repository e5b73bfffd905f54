use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// Which upstream feed a failure was recorded against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureSource {
    Prices,
    News,
}

impl fmt::Display for FailureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureSource::Prices => write!(f, "prices"),
            FailureSource::News => write!(f, "news"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    NotFound,
    RateLimited,
    ApiError,
}

impl FailureType {
    fn ttl(self) -> Duration {
        match self {
            FailureType::NotFound => Duration::hours(24),
            FailureType::RateLimited => Duration::hours(1),
            FailureType::ApiError => Duration::hours(6),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FailureInfo {
    pub failed_at: DateTime<Utc>,
    pub error_type: FailureType,
    pub retry_after: DateTime<Utc>,
}

/// Per-feed, per-ticker record of recent upstream failures.
///
/// Ingestion consults it before calling a provider so a ticker that just
/// failed is not hammered again on every scheduler tick.
#[derive(Clone, Default)]
pub struct FailureCache {
    cache: Arc<DashMap<String, FailureInfo>>,
}

impl FailureCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(source: FailureSource, ticker: &str) -> String {
        format!("{}:{}", source, ticker)
    }

    /// Active failure for the ticker, if any. Expired entries are evicted on read.
    pub fn is_failed(&self, source: FailureSource, ticker: &str) -> Option<FailureInfo> {
        self.is_failed_at(source, ticker, Utc::now())
    }

    fn is_failed_at(&self, source: FailureSource, ticker: &str, now: DateTime<Utc>) -> Option<FailureInfo> {
        let key = Self::key(source, ticker);
        if let Some(entry) = self.cache.get(&key) {
            let info = entry.value().clone();
            if now < info.retry_after {
                return Some(info);
            }
            drop(entry);
            self.cache.remove(&key);
        }
        None
    }

    pub fn record_failure(&self, source: FailureSource, ticker: &str, error_type: FailureType) {
        self.record_failure_at(source, ticker, error_type, Utc::now());
    }

    fn record_failure_at(
        &self,
        source: FailureSource,
        ticker: &str,
        error_type: FailureType,
        failed_at: DateTime<Utc>,
    ) {
        let info = FailureInfo {
            failed_at,
            error_type,
            retry_after: failed_at + error_type.ttl(),
        };
        self.cache.insert(Self::key(source, ticker), info);
    }

    pub fn clear(&self, source: FailureSource, ticker: &str) {
        self.cache.remove(&Self::key(source, ticker));
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.cache.len();
        self.cache.retain(|_, info| now < info.retry_after);
        before - self.cache.len()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_records_and_retrieves_failures() {
        let cache = FailureCache::new();

        cache.record_failure(FailureSource::Prices, "INVALID", FailureType::NotFound);

        let result = cache.is_failed(FailureSource::Prices, "INVALID");
        assert!(result.is_some());
        assert_eq!(result.unwrap().error_type, FailureType::NotFound);
    }

    #[test]
    fn test_sources_are_tracked_separately() {
        let cache = FailureCache::new();

        cache.record_failure(FailureSource::News, "AAPL", FailureType::RateLimited);

        assert!(cache.is_failed(FailureSource::News, "AAPL").is_some());
        assert!(cache.is_failed(FailureSource::Prices, "AAPL").is_none());
    }

    #[test]
    fn test_cache_clears_ticker() {
        let cache = FailureCache::new();

        cache.record_failure(FailureSource::Prices, "TEST", FailureType::ApiError);
        cache.clear(FailureSource::Prices, "TEST");

        assert!(cache.is_failed(FailureSource::Prices, "TEST").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expired_entries_are_evicted() {
        let cache = FailureCache::new();
        let two_hours_ago = Utc::now() - Duration::hours(2);

        cache.record_failure_at(FailureSource::Prices, "MSFT", FailureType::RateLimited, two_hours_ago);
        cache.record_failure_at(FailureSource::Prices, "TSLA", FailureType::NotFound, two_hours_ago);

        assert!(cache.is_failed(FailureSource::Prices, "MSFT").is_none());
        assert!(cache.is_failed_at(FailureSource::Prices, "TSLA", Utc::now()).is_some());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.cleanup_expired(), 0);
    }
}
