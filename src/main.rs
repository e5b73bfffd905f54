use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use sentiment_tracker::app;
use sentiment_tracker::config::AppConfig;
use sentiment_tracker::external::finnhub::FinnhubProvider;
use sentiment_tracker::external::news_provider::NewsProvider;
use sentiment_tracker::external::yahoo::YahooProvider;
use sentiment_tracker::logging::{self, LoggingConfig};
use sentiment_tracker::services::failure_cache::FailureCache;
use sentiment_tracker::services::job_scheduler_service::{self, JobContext, JobSchedulerService};
use sentiment_tracker::services::sentiment_scorer::VaderSentimentScorer;
use sentiment_tracker::state::AppState;
use sentiment_tracker::store::PgStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    logging::init_logging(LoggingConfig::from_env())
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    let config = Arc::new(AppConfig::from_env()?);
    tracing::info!("📋 Tracking tickers: {}", config.tickers.join(", "));

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to DATABASE_URL")?;

    let store = PgStore::new(pool);
    store.run_migrations().await.context("failed to run migrations")?;

    let news_provider: Option<Arc<dyn NewsProvider>> = match &config.finnhub_api_key {
        Some(key) => Some(Arc::new(FinnhubProvider::new(key.clone()))),
        None => {
            tracing::warn!("FINNHUB_API_KEY is not set, news ingestion is disabled");
            None
        }
    };

    let context = JobContext {
        store: Arc::new(store),
        price_provider: Arc::new(YahooProvider::new()),
        news_provider,
        scorer: Arc::new(VaderSentimentScorer::new()),
        failure_cache: Arc::new(FailureCache::new()),
        config: config.clone(),
    };

    // Kept alive for the lifetime of the server.
    let _scheduler = if config.job_scheduler_enabled {
        let mut scheduler = JobSchedulerService::new(context.clone()).await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("⏸️  Job scheduler disabled (JOB_SCHEDULER_ENABLED=false)");
        None
    };

    if config.run_pipeline_on_startup {
        let ctx = context.clone();
        tokio::spawn(async move {
            let _ = job_scheduler_service::run_job_by_name(job_scheduler_service::RUN_PIPELINE, ctx).await;
        });
    }

    let app = app::create_app(AppState::new(context));

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("🚀 Sentiment tracker running at http://{}/", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
