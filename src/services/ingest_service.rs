//! Pulls raw candles and headlines from upstream feeds into the store.
//!
//! Both feeds are insert-if-absent: rows already present are never
//! rewritten, so re-running a refresh only adds what is new.

use chrono::{NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use tracing::{error, info};

use crate::errors::AppError;
use crate::external::news_provider::{NewsProvider, NewsProviderError};
use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::{CreateNewsEvent, PriceCandle};
use crate::services::daily_aggregator::lookback_start;
use crate::services::failure_cache::{FailureCache, FailureSource, FailureType};
use crate::services::job_scheduler_service::JobResult;
use crate::store::Store;

fn skip_if_failed(cache: &FailureCache, source: FailureSource, ticker: &str) -> Result<(), AppError> {
    if let Some(failure) = cache.is_failed(source, ticker) {
        info!(
            "⚠️ Skipping {} fetch for {} - recent {:?} failure. Will retry after {}",
            source, ticker, failure.error_type, failure.retry_after
        );
        return Err(AppError::External(format!(
            "{} fetch for {} is backing off until {}",
            source, ticker, failure.retry_after
        )));
    }
    Ok(())
}

fn price_error(cache: &FailureCache, ticker: &str, e: PriceProviderError) -> AppError {
    let (failure_type, err) = match e {
        PriceProviderError::RateLimited => (FailureType::RateLimited, AppError::RateLimited),
        PriceProviderError::NotFound => (
            FailureType::NotFound,
            AppError::External(format!("no price data for {}", ticker)),
        ),
        other => (FailureType::ApiError, AppError::External(other.to_string())),
    };
    cache.record_failure(FailureSource::Prices, ticker, failure_type);
    err
}

fn news_error(cache: &FailureCache, ticker: &str, e: NewsProviderError) -> AppError {
    let (failure_type, err) = match e {
        NewsProviderError::RateLimited => (FailureType::RateLimited, AppError::RateLimited),
        other => (FailureType::ApiError, AppError::External(other.to_string())),
    };
    cache.record_failure(FailureSource::News, ticker, failure_type);
    err
}

/// Fetch and insert recent daily candles for one ticker. Returns the number of new rows.
pub async fn refresh_prices_for_ticker(
    store: &dyn Store,
    provider: &dyn PriceProvider,
    cache: &FailureCache,
    ticker: &str,
    days: u32,
) -> Result<usize, AppError> {
    skip_if_failed(cache, FailureSource::Prices, ticker)?;

    let external = provider
        .fetch_daily_candles(ticker, days)
        .await
        .map_err(|e| price_error(cache, ticker, e))?;

    let candles: Vec<PriceCandle> = external
        .into_iter()
        .map(|c| PriceCandle {
            ticker: ticker.to_string(),
            ts: c.ts,
            open: c.open,
            high: c.high,
            low: c.low,
            close: c.close,
            volume: c.volume,
            source: provider.source().to_string(),
        })
        .collect();

    let inserted = store.insert_price_candles(&candles).await?;
    cache.clear(FailureSource::Prices, ticker);

    info!("{}: fetched {} candles, inserted {} new", ticker, candles.len(), inserted);
    Ok(inserted)
}

/// Fetch and insert headlines published in `[from, to]` for one ticker.
pub async fn refresh_news_for_ticker(
    store: &dyn Store,
    provider: &dyn NewsProvider,
    cache: &FailureCache,
    ticker: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<usize, AppError> {
    skip_if_failed(cache, FailureSource::News, ticker)?;

    let items = provider
        .fetch_company_news(ticker, from, to)
        .await
        .map_err(|e| news_error(cache, ticker, e))?;

    let events: Vec<CreateNewsEvent> = items
        .into_iter()
        .filter(|item| !item.headline.trim().is_empty())
        .map(|item| CreateNewsEvent {
            source: item.source,
            ticker: ticker.to_string(),
            headline: item.headline,
            url: item.url,
            published_at: item.published_at,
        })
        .collect();

    let inserted = store.insert_news_events(&events).await?;
    cache.clear(FailureSource::News, ticker);

    info!("{}: fetched {} headlines, inserted {} new", ticker, events.len(), inserted);
    Ok(inserted)
}

fn tally(job: &str, outcomes: Vec<(String, Result<usize, AppError>)>) -> JobResult {
    let mut result = JobResult::default();
    for (ticker, outcome) in outcomes {
        match outcome {
            Ok(_) => result.items_processed += 1,
            Err(e) => {
                error!("❌ {} failed for {}: {}", job, ticker, e);
                result.items_failed += 1;
            }
        }
    }
    result
}

pub async fn run_price_refresh(
    store: &dyn Store,
    provider: &dyn PriceProvider,
    cache: &FailureCache,
    tickers: &[String],
    days: u32,
    concurrency: usize,
) -> JobResult {
    info!("💰 Refreshing {} days of prices for {} tickers", days, tickers.len());

    let outcomes = stream::iter(tickers.iter().cloned())
        .map(|ticker| async move {
            let outcome = refresh_prices_for_ticker(store, provider, cache, &ticker, days).await;
            (ticker, outcome)
        })
        .buffer_unordered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await;

    tally("Price refresh", outcomes)
}

pub async fn run_news_refresh(
    store: &dyn Store,
    provider: &dyn NewsProvider,
    cache: &FailureCache,
    tickers: &[String],
    lookback_days: i64,
    concurrency: usize,
) -> Result<JobResult, AppError> {
    let to = Utc::now().date_naive();
    let from = lookback_start(to, lookback_days)?;
    info!("📰 Fetching news from {} to {} for {} tickers", from, to, tickers.len());

    let outcomes = stream::iter(tickers.iter().cloned())
        .map(|ticker| async move {
            let outcome = refresh_news_for_ticker(store, provider, cache, &ticker, from, to).await;
            (ticker, outcome)
        })
        .buffer_unordered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await;

    Ok(tally("News refresh", outcomes))
}
