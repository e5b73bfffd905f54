use std::str::FromStr;

use crate::errors::AppError;

pub const DEFAULT_TICKERS: [&str; 4] = ["AAPL", "MSFT", "TSLA", "NVDA"];

/// Upper bound for both lookback settings, ten years of days.
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

/// Runtime configuration, read once from the environment at start-up.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: String,
    pub tickers: Vec<String>,
    pub aggregation_lookback_days: i64,
    pub correlation_window: usize,
    pub pipeline_concurrency: usize,
    pub sentiment_batch_size: i64,
    pub sentiment_max_loops: usize,
    pub price_history_days: u32,
    pub news_lookback_days: i64,
    pub finnhub_api_key: Option<String>,
    pub job_scheduler_enabled: bool,
    pub job_scheduler_test_mode: bool,
    pub run_pipeline_on_startup: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            database_max_connections: 10,
            bind_addr: "0.0.0.0:3000".to_string(),
            tickers: DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect(),
            aggregation_lookback_days: 90,
            correlation_window: 7,
            pipeline_concurrency: 4,
            sentiment_batch_size: 50,
            sentiment_max_loops: 100,
            price_history_days: 90,
            news_lookback_days: 30,
            finnhub_api_key: None,
            job_scheduler_enabled: true,
            job_scheduler_test_mode: false,
            run_pipeline_on_startup: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| AppError::Config("DATABASE_URL is not set".to_string()))?;

        let tickers = match std::env::var("TICKERS") {
            Ok(raw) => parse_tickers(&raw),
            Err(_) => defaults.tickers,
        };

        let config = Self {
            database_url,
            database_max_connections: env_or("DATABASE_MAX_CONNECTIONS", defaults.database_max_connections)?,
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            tickers,
            aggregation_lookback_days: env_or("AGGREGATION_LOOKBACK_DAYS", defaults.aggregation_lookback_days)?,
            correlation_window: env_or("CORRELATION_WINDOW", defaults.correlation_window)?,
            pipeline_concurrency: env_or("PIPELINE_CONCURRENCY", defaults.pipeline_concurrency)?,
            sentiment_batch_size: env_or("SENTIMENT_BATCH_SIZE", defaults.sentiment_batch_size)?,
            sentiment_max_loops: env_or("SENTIMENT_MAX_LOOPS", defaults.sentiment_max_loops)?,
            price_history_days: env_or("PRICE_HISTORY_DAYS", defaults.price_history_days)?,
            news_lookback_days: env_or("NEWS_LOOKBACK_DAYS", defaults.news_lookback_days)?,
            finnhub_api_key: std::env::var("FINNHUB_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            job_scheduler_enabled: env_or("JOB_SCHEDULER_ENABLED", defaults.job_scheduler_enabled)?,
            job_scheduler_test_mode: env_or("JOB_SCHEDULER_TEST_MODE", defaults.job_scheduler_test_mode)?,
            run_pipeline_on_startup: env_or("RUN_PIPELINE_ON_STARTUP", defaults.run_pipeline_on_startup)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.tickers.is_empty() {
            return Err(AppError::Config("TICKERS must name at least one ticker".to_string()));
        }
        if self.correlation_window < 2 {
            return Err(AppError::Config(format!(
                "CORRELATION_WINDOW must be at least 2, got {}",
                self.correlation_window
            )));
        }
        for (key, value) in [
            ("AGGREGATION_LOOKBACK_DAYS", self.aggregation_lookback_days),
            ("NEWS_LOOKBACK_DAYS", self.news_lookback_days),
        ] {
            if !(1..=MAX_LOOKBACK_DAYS).contains(&value) {
                return Err(AppError::Config(format!(
                    "{} must be between 1 and {}, got {}",
                    key, MAX_LOOKBACK_DAYS, value
                )));
            }
        }
        if self.pipeline_concurrency == 0 {
            return Err(AppError::Config("PIPELINE_CONCURRENCY must be positive".to_string()));
        }
        if self.sentiment_batch_size <= 0 {
            return Err(AppError::Config("SENTIMENT_BATCH_SIZE must be positive".to_string()));
        }
        Ok(())
    }

    pub fn is_supported(&self, ticker: &str) -> bool {
        self.tickers.iter().any(|t| t == ticker)
    }
}

/// Split a comma separated ticker list, upper-casing and dropping blanks and repeats.
pub fn parse_tickers(raw: &str) -> Vec<String> {
    let mut tickers: Vec<String> = Vec::new();
    for ticker in raw.split(',').map(|t| t.trim().to_uppercase()) {
        if !ticker.is_empty() && !tickers.contains(&ticker) {
            tickers.push(ticker);
        }
    }
    tickers
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: {}", key, raw))),
        Err(_) => Ok(default),
    }
}
