use chrono::Utc;

use crate::errors::AppError;
use crate::services::daily_aggregator;
use crate::services::job_scheduler_service::{JobContext, JobResult};

/// Rebuild daily metric rows for the configured lookback window, ending today (UTC).
pub async fn aggregate_daily_metrics(ctx: JobContext) -> Result<JobResult, AppError> {
    daily_aggregator::run_daily_aggregation(
        ctx.store.as_ref(),
        &ctx.config.tickers,
        ctx.config.aggregation_lookback_days,
        Utc::now().date_naive(),
        ctx.config.pipeline_concurrency,
    )
    .await
}
