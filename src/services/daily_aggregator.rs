//! Builds `daily_ticker_metrics` rows from raw candles and scored news.
//!
//! One row per (ticker, date) that has a price candle inside the lookback
//! window. Sentiment fields are independent of price and fall back to
//! null / 0 on days without scored news.

use chrono::{Duration, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::UpsertDailyMetric;
use crate::services::daily_series::build_price_series;
use crate::services::job_scheduler_service::JobResult;
use crate::services::sentiment_aggregator::aggregate_sentiment_for_day;
use crate::store::Store;

/// Aggregate and upsert every date on or after `start_date` for one ticker.
/// Returns the number of rows written.
pub async fn aggregate_ticker(
    store: &dyn Store,
    ticker: &str,
    start_date: NaiveDate,
) -> Result<usize, AppError> {
    let candles = store.fetch_price_candles(ticker).await?;
    let series = build_price_series(&candles);

    if series.is_empty() {
        warn!("No price data for {}, skipping", ticker);
        return Ok(0);
    }

    let updated_at = Utc::now();
    let mut written = 0;

    for (date, price) in series.range(start_date..) {
        let sentiment = aggregate_sentiment_for_day(store, ticker, *date).await?;

        let metric = UpsertDailyMetric {
            ticker: ticker.to_string(),
            date: *date,
            close_price: Some(price.close_price),
            daily_return: price.daily_return,
            avg_sentiment_score: sentiment.avg_sentiment_score,
            dominant_sentiment_label: sentiment.dominant_label,
            article_count: sentiment.article_count,
        };

        store.upsert_daily_metric(&metric, updated_at).await?;
        written += 1;
    }

    info!("{}: upserted {} daily metric rows", ticker, written);
    Ok(written)
}

/// `today - lookback_days`, or a validation error when the subtraction
/// does not fit in a date.
pub fn lookback_start(today: NaiveDate, lookback_days: i64) -> Result<NaiveDate, AppError> {
    Duration::try_days(lookback_days)
        .and_then(|span| today.checked_sub_signed(span))
        .ok_or_else(|| AppError::Validation(format!("lookback of {} days is out of range", lookback_days)))
}

/// Aggregate all tickers for dates in `[today - lookback_days, ..]`.
///
/// Store connectivity problems while preparing the index abort the run.
/// Failures inside one ticker are logged and counted without touching the
/// other tickers.
pub async fn run_daily_aggregation(
    store: &dyn Store,
    tickers: &[String],
    lookback_days: i64,
    today: NaiveDate,
    concurrency: usize,
) -> Result<JobResult, AppError> {
    let start_date = lookback_start(today, lookback_days)?;
    info!(
        "🧮 Aggregating daily metrics for {} tickers since {}",
        tickers.len(),
        start_date
    );

    store.ensure_daily_metrics_index().await?;

    let outcomes: Vec<(String, Result<usize, AppError>)> = stream::iter(tickers.iter().cloned())
        .map(|ticker| async move {
            let outcome = aggregate_ticker(store, &ticker, start_date).await;
            (ticker, outcome)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut result = JobResult::default();
    for (ticker, outcome) in outcomes {
        match outcome {
            Ok(_) => result.items_processed += 1,
            Err(e) => {
                error!("❌ Daily aggregation failed for {}: {}", ticker, e);
                result.items_failed += 1;
            }
        }
    }

    Ok(result)
}
