use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::external::news_provider::NewsProvider;
use crate::external::price_provider::PriceProvider;
use crate::jobs::{
    daily_metrics_job, ingestion_jobs, maintenance_job, pipeline_job, rolling_correlation_job,
    sentiment_scoring_job,
};
use crate::services::failure_cache::FailureCache;
use crate::services::sentiment_scorer::SentimentScorer;
use crate::store::Store;

// Context passed to job functions
#[derive(Clone)]
pub struct JobContext {
    pub store: Arc<dyn Store>,
    pub price_provider: Arc<dyn PriceProvider>,
    pub news_provider: Option<Arc<dyn NewsProvider>>,
    pub scorer: Arc<dyn SentimentScorer>,
    pub failure_cache: Arc<FailureCache>,
    pub config: Arc<AppConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobResult {
    pub items_processed: i32,
    pub items_failed: i32,
}

pub const REFRESH_PRICES: &str = "refresh_prices";
pub const REFRESH_NEWS: &str = "refresh_news";
pub const SCORE_SENTIMENT: &str = "score_sentiment";
pub const AGGREGATE_DAILY_METRICS: &str = "aggregate_daily_metrics";
pub const COMPUTE_ROLLING_CORRELATION: &str = "compute_rolling_correlation";
pub const RUN_PIPELINE: &str = "run_pipeline";
pub const CLEANUP_FAILURE_CACHE: &str = "cleanup_failure_cache";

/// Every job that can be triggered by name.
pub const JOB_NAMES: &[&str] = &[
    REFRESH_PRICES,
    REFRESH_NEWS,
    SCORE_SENTIMENT,
    AGGREGATE_DAILY_METRICS,
    COMPUTE_ROLLING_CORRELATION,
    RUN_PIPELINE,
    CLEANUP_FAILURE_CACHE,
];

pub struct JobSchedulerService {
    scheduler: JobScheduler,
    context: JobContext,
}

impl JobSchedulerService {
    pub async fn new(context: JobContext) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::External(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler, context })
    }

    /// Start all scheduled jobs
    pub async fn start(&mut self) -> Result<(), AppError> {
        info!("🚀 Starting job scheduler...");

        let test_mode = self.context.config.job_scheduler_test_mode;
        if test_mode {
            info!("⚠️  JOB SCHEDULER IN TEST MODE - Jobs will run every few minutes!");
        }

        // Nightly ingestion, after the US close (format: sec min hour day month weekday)
        let (schedule, desc) = if test_mode {
            ("0 */5 * * * *", "Every 5 minutes (TEST MODE)")
        } else {
            ("0 0 22 * * MON-FRI", "Weekdays at 22:00 UTC")
        };
        self.schedule_job(schedule, REFRESH_PRICES, desc, ingestion_jobs::refresh_prices)
            .await?;

        if self.context.news_provider.is_some() {
            let (schedule, desc) = if test_mode {
                ("0 1-59/5 * * * *", "Every 5 minutes, offset 1 (TEST MODE)")
            } else {
                ("0 10 22 * * *", "Daily at 22:10 UTC")
            };
            self.schedule_job(schedule, REFRESH_NEWS, desc, ingestion_jobs::refresh_news)
                .await?;
        } else {
            info!("📰 FINNHUB_API_KEY not set, news ingestion is disabled");
        }

        let (schedule, desc) = if test_mode {
            ("0 2-59/5 * * * *", "Every 5 minutes, offset 2 (TEST MODE)")
        } else {
            ("0 30 22 * * *", "Daily at 22:30 UTC")
        };
        self.schedule_job(schedule, SCORE_SENTIMENT, desc, sentiment_scoring_job::score_pending_news)
            .await?;

        let (schedule, desc) = if test_mode {
            ("0 3-59/5 * * * *", "Every 5 minutes, offset 3 (TEST MODE)")
        } else {
            ("0 45 22 * * *", "Daily at 22:45 UTC")
        };
        self.schedule_job(schedule, AGGREGATE_DAILY_METRICS, desc, daily_metrics_job::aggregate_daily_metrics)
            .await?;

        let (schedule, desc) = if test_mode {
            ("0 4-59/5 * * * *", "Every 5 minutes, offset 4 (TEST MODE)")
        } else {
            ("0 0 23 * * *", "Daily at 23:00 UTC")
        };
        self.schedule_job(
            schedule,
            COMPUTE_ROLLING_CORRELATION,
            desc,
            rolling_correlation_job::compute_rolling_correlations,
        )
        .await?;

        self.schedule_job(
            "0 0 * * * *",
            CLEANUP_FAILURE_CACHE,
            "Every hour at :00",
            maintenance_job::cleanup_failure_cache,
        )
        .await?;

        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::External(format!("Failed to start scheduler: {}", e)))?;

        info!("✅ Job scheduler started successfully");
        Ok(())
    }

    /// Stop the scheduler gracefully
    pub async fn stop(&mut self) -> Result<(), AppError> {
        info!("🛑 Stopping job scheduler...");
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::External(format!("Failed to stop scheduler: {}", e)))?;
        info!("✅ Job scheduler stopped");
        Ok(())
    }

    async fn schedule_job<F, Fut>(
        &mut self,
        schedule: &str,
        job_name: &'static str,
        description: &str,
        job_fn: F,
    ) -> Result<(), AppError>
    where
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<JobResult, AppError>> + Send + 'static,
    {
        let context = self.context.clone();
        let job_fn = Arc::new(job_fn);

        let job = Job::new_async(schedule, move |_uuid, _l| {
            let context = context.clone();
            let job_fn = job_fn.clone();
            Box::pin(async move {
                // Failures are already logged; the next tick runs regardless.
                let _ = execute_job_with_tracking(job_name, context, job_fn.as_ref()).await;
            })
        })
        .map_err(|e| AppError::External(format!("Failed to create job {}: {}", job_name, e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::External(format!("Failed to add job {}: {}", job_name, e)))?;

        info!("📅 Scheduled: {} - {} [cron: {}]", job_name, description, schedule);
        Ok(())
    }
}

/// Run a job, logging its start, duration and item counts.
pub async fn execute_job_with_tracking<F, Fut>(
    job_name: &str,
    context: JobContext,
    job_fn: &F,
) -> Result<JobResult, AppError>
where
    F: Fn(JobContext) -> Fut,
    Fut: Future<Output = Result<JobResult, AppError>>,
{
    info!("🏃 Starting job: {}", job_name);
    let started_at = Utc::now();

    let result = job_fn(context).await;

    let duration_ms = (Utc::now() - started_at).num_milliseconds();

    match &result {
        Ok(job_result) => info!(
            "✅ Job completed: {} (processed: {}, failed: {}, duration: {}ms)",
            job_name, job_result.items_processed, job_result.items_failed, duration_ms
        ),
        Err(e) => error!("❌ Job failed: {} - {} (duration: {}ms)", job_name, e, duration_ms),
    }

    result
}

/// Run a job immediately by name, outside of its schedule.
pub async fn run_job_by_name(job_name: &str, ctx: JobContext) -> Result<JobResult, AppError> {
    match job_name {
        REFRESH_PRICES => execute_job_with_tracking(job_name, ctx, &ingestion_jobs::refresh_prices).await,
        REFRESH_NEWS => execute_job_with_tracking(job_name, ctx, &ingestion_jobs::refresh_news).await,
        SCORE_SENTIMENT => {
            execute_job_with_tracking(job_name, ctx, &sentiment_scoring_job::score_pending_news).await
        }
        AGGREGATE_DAILY_METRICS => {
            execute_job_with_tracking(job_name, ctx, &daily_metrics_job::aggregate_daily_metrics).await
        }
        COMPUTE_ROLLING_CORRELATION => {
            execute_job_with_tracking(job_name, ctx, &rolling_correlation_job::compute_rolling_correlations)
                .await
        }
        RUN_PIPELINE => execute_job_with_tracking(job_name, ctx, &pipeline_job::run_analytics_pipeline).await,
        CLEANUP_FAILURE_CACHE => {
            execute_job_with_tracking(job_name, ctx, &maintenance_job::cleanup_failure_cache).await
        }
        other => Err(AppError::NotFound(format!("Unknown job: {}", other))),
    }
}

impl std::ops::AddAssign for JobResult {
    fn add_assign(&mut self, rhs: Self) {
        self.items_processed += rhs.items_processed;
        self.items_failed += rhs.items_failed;
    }
}
