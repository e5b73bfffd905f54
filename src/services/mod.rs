pub mod correlation;
pub mod daily_aggregator;
pub mod daily_series;
pub mod failure_cache;
pub mod ingest_service;
pub mod job_scheduler_service;
pub mod sentiment_aggregator;
pub mod sentiment_scorer;
pub mod sentiment_worker;
pub mod timeseries_service;
