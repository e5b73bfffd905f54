//! Nightly ingestion of raw market data.
//!
//! # Job Schedule
//!
//! - **Prices**: Weekdays at 22:00 UTC (0 0 22 * * MON-FRI)
//! - **News**: Daily at 22:10 UTC (0 10 22 * * *), only when a news provider is configured
//! - **Test Mode**: Every 5 minutes

use tracing::info;

use crate::errors::AppError;
use crate::services::ingest_service;
use crate::services::job_scheduler_service::{JobContext, JobResult};

pub async fn refresh_prices(ctx: JobContext) -> Result<JobResult, AppError> {
    let result = ingest_service::run_price_refresh(
        ctx.store.as_ref(),
        ctx.price_provider.as_ref(),
        ctx.failure_cache.as_ref(),
        &ctx.config.tickers,
        ctx.config.price_history_days,
        ctx.config.pipeline_concurrency,
    )
    .await;

    Ok(result)
}

pub async fn refresh_news(ctx: JobContext) -> Result<JobResult, AppError> {
    let Some(provider) = ctx.news_provider.as_ref() else {
        info!("📰 No news provider configured, skipping news refresh");
        return Ok(JobResult::default());
    };

    ingest_service::run_news_refresh(
        ctx.store.as_ref(),
        provider.as_ref(),
        ctx.failure_cache.as_ref(),
        &ctx.config.tickers,
        ctx.config.news_lookback_days,
        ctx.config.pipeline_concurrency,
    )
    .await
}
