//! Job API Handlers
//!
//! HTTP endpoints for submitting and inspecting transcription jobs.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use scribe_core::domain::job::Job;
use scribe_core::dto::job::SubmitJob;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::service::job_service;
use crate::state::AppState;

/// POST /job
/// Submit a URL for transcription
pub async fn submit_job(
    State(state): State<AppState>,
    payload: Result<Json<SubmitJob>, JsonRejection>,
) -> ApiResult<Json<Job>> {
    let Json(req) = payload.map_err(|rejection| {
        tracing::debug!("Rejected submission body: {}", rejection);
        ApiError::BadRequest("Invalid JSON".to_string())
    })?;

    let job = job_service::submit_job(&state.store, &state.queue, &state.allowlist, req).await?;

    Ok(Json(job))
}

/// GET /job/{id}
/// Get job details by ID
pub async fn get_job(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Job>> {
    let Path(id) = id.map_err(|_| ApiError::NotFound("Job not found".to_string()))?;
    tracing::debug!("Getting job: {}", id);

    let job = job_service::get_job(&state.store, id)?;

    Ok(Json(job))
}

/// GET /job/
pub async fn missing_job_id() -> ApiError {
    ApiError::BadRequest("Job ID required".to_string())
}

/// GET /jobs/active
/// Unfinished jobs plus finished jobs created in the last 24 hours, newest first
pub async fn list_active_jobs(State(state): State<AppState>) -> Json<Vec<Job>> {
    Json(job_service::list_active_jobs(&state.store))
}

/// GET /jobs/history
/// Completed jobs, newest first
pub async fn list_job_history(State(state): State<AppState>) -> Json<Vec<Job>> {
    Json(job_service::list_job_history(&state.store))
}
