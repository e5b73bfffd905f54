use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::job_scheduler_service::JobContext;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
    pub jobs: JobContext,
}

impl AppState {
    pub fn new(jobs: JobContext) -> Self {
        Self {
            store: jobs.store.clone(),
            config: jobs.config.clone(),
            jobs,
        }
    }
}
