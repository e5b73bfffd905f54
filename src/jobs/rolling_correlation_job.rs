use crate::errors::AppError;
use crate::services::correlation;
use crate::services::job_scheduler_service::{JobContext, JobResult};

/// Recompute `rolling_corr_7d` over every stored daily row.
/// Must run after the daily aggregation for the same day.
pub async fn compute_rolling_correlations(ctx: JobContext) -> Result<JobResult, AppError> {
    correlation::run_rolling_corr(
        ctx.store.as_ref(),
        &ctx.config.tickers,
        ctx.config.correlation_window,
        ctx.config.pipeline_concurrency,
    )
    .await
}
