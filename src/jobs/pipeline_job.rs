//! Aggregation and correlation back to back.
//!
//! Used at start-up (`RUN_PIPELINE_ON_STARTUP`) and by the admin trigger, so
//! the API has fresh rows without waiting for the nightly schedule.

use tracing::info;

use crate::errors::AppError;
use crate::jobs::{daily_metrics_job, rolling_correlation_job};
use crate::services::job_scheduler_service::{JobContext, JobResult};

pub async fn run_analytics_pipeline(ctx: JobContext) -> Result<JobResult, AppError> {
    let aggregated = daily_metrics_job::aggregate_daily_metrics(ctx.clone()).await?;
    info!(
        "Aggregation step: {} tickers processed, {} failed",
        aggregated.items_processed, aggregated.items_failed
    );

    let correlated = rolling_correlation_job::compute_rolling_correlations(ctx).await?;

    let mut result = aggregated;
    result += correlated;
    Ok(result)
}
