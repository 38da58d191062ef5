//! Job Service
//!
//! Business logic for submitting and querying transcription jobs.

use scribe_core::domain::job::Job;
use scribe_core::domain::source::SourceAllowlist;
use scribe_core::dto::job::{SubmitError, SubmitJob};
use uuid::Uuid;

use crate::repository::{JobStore, StoreError};
use crate::scheduler::{Dispatch, WorkQueue};

/// Failure message recorded on a job turned away by a full queue
pub const REJECTED_MESSAGE: &str = "Rejected: work queue is full";

/// Service error type
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("{0}")]
    Validation(#[from] SubmitError),

    #[error("Job not found")]
    NotFound(Uuid),

    #[error("Internal error: {0}")]
    Store(#[from] StoreError),
}

/// Validate a submission, record the job and hand it to the queue
///
/// Returns the job as created. A job rejected by a full queue is returned
/// in its `error` state.
pub async fn submit_job(
    store: &JobStore,
    queue: &WorkQueue,
    allowlist: &SourceAllowlist,
    req: SubmitJob,
) -> Result<Job, JobError> {
    let url = req.validate(allowlist)?;

    let job = store.create(Job::new(url))?;
    tracing::info!("Job created: {} for {}", job.id, job.url);

    match queue.enqueue(job.id).await {
        Dispatch::Queued | Dispatch::Spilled => Ok(job),
        Dispatch::Rejected => {
            let job = store.update(job.id, |job| job.mark_failed(REJECTED_MESSAGE))?;
            Ok(job)
        }
    }
}

/// Get a job by ID
pub fn get_job(store: &JobStore, id: Uuid) -> Result<Job, JobError> {
    store.get(id).ok_or(JobError::NotFound(id))
}

/// Unfinished jobs plus finished jobs still inside the active window, newest first
pub fn list_active_jobs(store: &JobStore) -> Vec<Job> {
    store.list_active()
}

/// Completed jobs, newest first
pub fn list_job_history(store: &JobStore) -> Vec<Job> {
    store.list_history()
}
