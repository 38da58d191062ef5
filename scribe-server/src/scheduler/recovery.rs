//! Startup recovery
//!
//! Reloads persisted jobs and restarts every one that was still in flight
//! when the previous process stopped.

use scribe_core::domain::job::JobStatus;
use tracing::{info, warn};

use super::queue::DetachedRuns;
use crate::pipeline::Pipeline;
use crate::repository::JobStore;

/// What recovery found on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecoverySummary {
    pub loaded: usize,
    pub resumed: usize,
}

/// Loads every job record and resumes the unfinished ones
///
/// Resumed jobs are reset to `queued` and run through
/// [`Pipeline::resume`] on detached tasks.
pub fn recover(store: &JobStore, pipeline: &Pipeline, detached: &DetachedRuns) -> RecoverySummary {
    let jobs = store.load_all();
    let mut summary = RecoverySummary {
        loaded: jobs.len(),
        resumed: 0,
    };

    for job in jobs.into_iter().filter(|job| !job.status.is_terminal()) {
        info!("Resuming interrupted job {} (was {})", job.id, job.status);

        if let Err(e) = store.update(job.id, |job| job.status = JobStatus::Queued) {
            warn!("Could not reset job {}: {}", job.id, e);
            continue;
        }

        let pipeline = pipeline.clone();
        let id = job.id;
        detached.spawn(async move { pipeline.resume(id).await });
        summary.resumed += 1;
    }

    info!(
        "Loaded {} job(s) from disk, resumed {}",
        summary.loaded, summary.resumed
    );
    summary
}
