//! Rolling Pearson correlation between daily return and average sentiment.
//!
//! The window is positional: it holds the last `W` daily rows of a ticker in
//! date order, whatever calendar span they cover. Days with no row (weekends,
//! holidays, missing candles) are not filled in, so a 7-row window can reach
//! back more than 7 calendar days.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::DailyMetric;
use crate::services::job_scheduler_service::JobResult;
use crate::store::Store;

pub const DEFAULT_WINDOW: usize = 7;

/// Fixed-capacity FIFO. Pushing onto a full window evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RollingWindow<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, item: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Pearson r over `(x, y)` pairs.
///
/// `None` with fewer than two pairs or when either series has exactly zero
/// variance, instead of dividing into NaN or infinity.
pub fn pearson_correlation(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }

    // A constant series can leave rounding noise in the mean; catch it exactly.
    let (x0, y0) = pairs[0];
    if pairs.iter().all(|(x, _)| *x == x0) || pairs.iter().all(|(_, y)| *y == y0) {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut sum_sq_x = 0.0;
    let mut sum_sq_y = 0.0;

    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        numerator += dx * dy;
        sum_sq_x += dx * dx;
        sum_sq_y += dy * dy;
    }

    if sum_sq_x == 0.0 || sum_sq_y == 0.0 {
        return None;
    }

    // Rounding can land a hair outside [-1, 1] on perfectly linear data.
    Some((numerator / (sum_sq_x * sum_sq_y).sqrt()).clamp(-1.0, 1.0))
}

/// One correlation per observation, in input order.
///
/// Each observation is a `(daily_return, avg_sentiment)` pair. The value at
/// position `i` only looks at positions `i - W + 1 ..= i`; incomplete pairs in
/// the window are skipped, they do not shrink the window.
pub fn rolling_correlations<I>(observations: I, window: usize) -> Vec<Option<f64>>
where
    I: IntoIterator<Item = (Option<f64>, Option<f64>)>,
{
    let mut history = RollingWindow::new(window);
    let mut out = Vec::new();

    for observation in observations {
        history.push(observation);

        let pairs: Vec<(f64, f64)> = history
            .iter()
            .filter_map(|(ret, sent)| Some(((*ret)?, (*sent)?)))
            .collect();

        out.push(pearson_correlation(&pairs));
    }

    out
}

fn observations(rows: &[DailyMetric]) -> impl Iterator<Item = (Option<f64>, Option<f64>)> + '_ {
    rows.iter().map(|r| (r.daily_return, r.avg_sentiment_score))
}

/// Recompute and store the rolling correlation on every daily row of `ticker`.
/// Returns the number of rows visited.
pub async fn update_rolling_corr_for_ticker(
    store: &dyn Store,
    ticker: &str,
    window: usize,
    computed_at: DateTime<Utc>,
) -> Result<usize, AppError> {
    let rows = store.fetch_daily_metrics(ticker).await?;

    if rows.is_empty() {
        warn!("No daily metrics for {}, skipping correlation", ticker);
        return Ok(0);
    }

    let correlations = rolling_correlations(observations(&rows), window);

    for (row, corr) in rows.iter().zip(correlations) {
        store
            .update_rolling_corr(ticker, row.date, corr, computed_at)
            .await?;
    }

    info!("{}: updated rolling correlation for {} daily rows", ticker, rows.len());
    Ok(rows.len())
}

/// Run the correlation pass for every ticker. A failing ticker is logged and
/// counted; the others still run.
pub async fn run_rolling_corr(
    store: &dyn Store,
    tickers: &[String],
    window: usize,
    concurrency: usize,
) -> Result<JobResult, AppError> {
    info!(
        "📈 Computing {}-row rolling correlation for {} tickers",
        window,
        tickers.len()
    );
    let computed_at = Utc::now();

    let outcomes: Vec<(String, Result<usize, AppError>)> = stream::iter(tickers.iter().cloned())
        .map(|ticker| async move {
            let outcome = update_rolling_corr_for_ticker(store, &ticker, window, computed_at).await;
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
                error!("❌ Rolling correlation failed for {}: {}", ticker, e);
                result.items_failed += 1;
            }
        }
    }

    Ok(result)
}
