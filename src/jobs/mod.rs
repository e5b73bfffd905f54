//! Background Jobs Module
//!
//! Job entry points run by the job scheduler service, or on demand through
//! the admin trigger route. Each takes a [`JobContext`] and returns a
//! [`JobResult`] counting the tickers or headlines handled.
//!
//! # Available Jobs
//!
//! - `ingestion_jobs` - Pulls daily candles and company news into the store
//! - `sentiment_scoring_job` - Scores headlines that have no sentiment yet
//! - `daily_metrics_job` - Rebuilds per-ticker daily metric rows
//! - `rolling_correlation_job` - Recomputes the rolling sentiment/return correlation
//! - `pipeline_job` - Aggregation followed by correlation, as one run
//! - `maintenance_job` - Evicts expired entries from the failure cache
//!
//! Every job can be re-run without changing rows whose values are unchanged.
//!
//! [`JobContext`]: crate::services::job_scheduler_service::JobContext
//! [`JobResult`]: crate::services::job_scheduler_service::JobResult

pub mod daily_metrics_job;
pub mod ingestion_jobs;
pub mod maintenance_job;
pub mod pipeline_job;
pub mod rolling_correlation_job;
pub mod sentiment_scoring_job;
