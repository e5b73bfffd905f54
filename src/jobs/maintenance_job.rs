use tracing::info;

use crate::errors::AppError;
use crate::services::job_scheduler_service::{JobContext, JobResult};

pub async fn cleanup_failure_cache(ctx: JobContext) -> Result<JobResult, AppError> {
    let removed = ctx.failure_cache.cleanup_expired();
    if removed > 0 {
        info!("🧹 Evicted {} expired failure cache entries", removed);
    }

    Ok(JobResult {
        items_processed: removed as i32,
        items_failed: 0,
    })
}
