use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::services::job_scheduler_service::{self, JobResult, JOB_NAMES};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/jobs", get(list_jobs))
        .route("/admin/jobs/:job_name/trigger", post(trigger_job_manually))
}

#[derive(Debug, Serialize)]
pub struct JobList {
    pub jobs: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub job_name: String,
    #[serde(flatten)]
    pub result: JobResult,
}

async fn list_jobs() -> Json<JobList> {
    Json(JobList {
        jobs: JOB_NAMES.to_vec(),
    })
}

/// POST /admin/jobs/:job_name/trigger - run a job now and wait for it
async fn trigger_job_manually(
    State(state): State<AppState>,
    Path(job_name): Path<String>,
) -> Result<Json<TriggerResponse>, AppError> {
    info!("POST /admin/jobs/{}/trigger - Manual job run", job_name);

    let result = job_scheduler_service::run_job_by_name(&job_name, state.jobs.clone()).await?;

    Ok(Json(TriggerResponse { job_name, result }))
}
