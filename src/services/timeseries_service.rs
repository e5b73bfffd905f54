use chrono::Duration;
use tracing::info;

use crate::errors::AppError;
use crate::models::{TimeSeriesPoint, TimeSeriesResponse};
use crate::store::Store;

pub const MIN_DAYS_BACK: i64 = 1;
pub const MAX_DAYS_BACK: i64 = 90;
pub const DEFAULT_DAYS_BACK: i64 = 7;

/// Slice the daily metrics of `ticker` ending at its latest stored date.
///
/// The window trails the data rather than the wall clock: `to_date` is the
/// newest row for the ticker and `from_date` is `days_back - 1` calendar days
/// before it. A ticker with no rows yields an empty response, not an error.
pub async fn build_ticker_timeseries(
    store: &dyn Store,
    ticker: &str,
    days_back: i64,
) -> Result<TimeSeriesResponse, AppError> {
    if !(MIN_DAYS_BACK..=MAX_DAYS_BACK).contains(&days_back) {
        return Err(AppError::Validation(format!(
            "days must be between {} and {}, got {}",
            MIN_DAYS_BACK, MAX_DAYS_BACK, days_back
        )));
    }

    let Some(latest_date) = store.latest_metric_date(ticker).await? else {
        info!("No daily metrics yet for {}", ticker);
        return Ok(TimeSeriesResponse::empty(ticker));
    };

    let start_date = latest_date - Duration::days(days_back - 1);
    let rows = store.fetch_daily_metrics_since(ticker, start_date).await?;

    Ok(TimeSeriesResponse {
        ticker: ticker.to_string(),
        from_date: Some(start_date.format("%Y-%m-%d").to_string()),
        to_date: Some(latest_date.format("%Y-%m-%d").to_string()),
        points: rows.into_iter().map(TimeSeriesPoint::from).collect(),
    })
}
