//! Scores headlines that have not been through the sentiment model yet.

use chrono::Utc;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::NewsCursor;
use crate::services::job_scheduler_service::JobResult;
use crate::services::sentiment_scorer::SentimentScorer;
use crate::store::Store;

pub const DEFAULT_BATCH_SIZE: i64 = 50;
pub const DEFAULT_MAX_LOOPS: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub fetched: usize,
    pub updated: usize,
    pub failed: usize,
    /// Last event of the batch; the next batch starts after it.
    pub last_seen: Option<NewsCursor>,
}

/// Score one batch of unscored headlines, oldest first, starting after `after`.
///
/// A scorer or write failure on one headline is logged and counted; the
/// rest of the batch still runs.
pub async fn process_batch(
    store: &dyn Store,
    scorer: &dyn SentimentScorer,
    after: Option<NewsCursor>,
    batch_size: i64,
) -> Result<BatchOutcome, AppError> {
    let events = store.fetch_unscored_news(after, batch_size).await?;
    let mut outcome = BatchOutcome {
        fetched: events.len(),
        last_seen: events.last().map(NewsCursor::of),
        ..BatchOutcome::default()
    };

    if events.is_empty() {
        return Ok(outcome);
    }

    for event in events {
        let sentiment = match scorer.score(&event.headline) {
            Ok(sentiment) => sentiment,
            Err(e) => {
                warn!("Failed to score news event {} ({}): {}", event.id, event.ticker, e);
                outcome.failed += 1;
                continue;
            }
        };

        match store.update_news_sentiment(event.id, sentiment, Utc::now()).await {
            Ok(()) => outcome.updated += 1,
            Err(e) => {
                warn!("Failed to store sentiment for news event {}: {}", event.id, e);
                outcome.failed += 1;
            }
        }
    }

    info!(
        "Scored batch: {} fetched, {} updated, {} failed",
        outcome.fetched, outcome.updated, outcome.failed
    );
    Ok(outcome)
}

/// Run batches until the queue is exhausted or `max_loops` batches have run.
///
/// Each batch resumes after the last event of the previous one, so headlines
/// that fail to score are passed over for the rest of the run instead of
/// being fetched again. The next run retries them.
pub async fn run_worker(
    store: &dyn Store,
    scorer: &dyn SentimentScorer,
    batch_size: i64,
    max_loops: usize,
) -> Result<JobResult, AppError> {
    let mut result = JobResult::default();
    let mut cursor = None;

    for _ in 0..max_loops {
        let outcome = process_batch(store, scorer, cursor, batch_size).await?;
        result.items_processed += outcome.updated as i32;
        result.items_failed += outcome.failed as i32;

        match outcome.last_seen {
            Some(last) => cursor = Some(last),
            None => break,
        }
    }

    info!("🧠 Sentiment scoring complete: {} headlines updated", result.items_processed);
    Ok(result)
}
