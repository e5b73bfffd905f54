//! Scores every headline still missing a sentiment label.
//!
//! Runs after the news refresh so the daily aggregation sees fresh scores.

use crate::errors::AppError;
use crate::services::job_scheduler_service::{JobContext, JobResult};
use crate::services::sentiment_worker;

pub async fn score_pending_news(ctx: JobContext) -> Result<JobResult, AppError> {
    sentiment_worker::run_worker(
        ctx.store.as_ref(),
        ctx.scorer.as_ref(),
        ctx.config.sentiment_batch_size,
        ctx.config.sentiment_max_loops,
    )
    .await
}
