//! Job Repository
//!
//! Owns the authoritative map of job id to job record. Every mutation is
//! applied under the write lock and then written through to
//! `<jobs_dir>/<id>.json` before the lock is released, so the file on disk
//! always trails memory by at most the mutation in flight.

use chrono::{DateTime, Duration, Utc};
use scribe_core::domain::job::{Job, JobStatus, Progress};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// How long a finished job keeps showing up in the active listing
pub const ACTIVE_WINDOW_HOURS: i64 = 24;

/// Repository error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("job {0} not found")]
    NotFound(Uuid),
    #[error("job {0} already exists")]
    AlreadyExists(Uuid),
}

/// In-memory job map with per-job durable files
pub struct JobStore {
    jobs: RwLock<HashMap<Uuid, Job>>,
    dir: PathBuf,
}

impl JobStore {
    /// Creates an empty store persisting into `dir`
    ///
    /// The directory is not read here; call [`JobStore::load_all`] at startup.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Inserts a new job as `queued` with zero progress and persists it
    pub fn create(&self, mut job: Job) -> Result<Job, StoreError> {
        job.status = JobStatus::Queued;
        job.progress = Progress::default();

        let mut jobs = self.write();
        if jobs.contains_key(&job.id) {
            return Err(StoreError::AlreadyExists(job.id));
        }

        self.persist(&job);
        jobs.insert(job.id, job.clone());

        debug!("Job {} created", job.id);
        Ok(job)
    }

    /// Returns a snapshot of the job
    pub fn get(&self, id: Uuid) -> Option<Job> {
        self.read().get(&id).cloned()
    }

    /// Non-terminal jobs plus terminal jobs created in the last 24 hours
    pub fn list_active(&self) -> Vec<Job> {
        self.list_active_at(Utc::now())
    }

    /// Same as [`JobStore::list_active`] evaluated at `now`
    pub fn list_active_at(&self, now: DateTime<Utc>) -> Vec<Job> {
        let window = Duration::hours(ACTIVE_WINDOW_HOURS);

        let mut jobs: Vec<Job> = self
            .read()
            .values()
            .filter(|job| !job.status.is_terminal() || job.created_within(now, window))
            .cloned()
            .collect();

        jobs.sort_by(|a, b| b.created.cmp(&a.created));
        jobs
    }

    /// Completed jobs, newest created first
    pub fn list_history(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self
            .read()
            .values()
            .filter(|job| job.status == JobStatus::Done)
            .cloned()
            .collect();

        jobs.sort_by(|a, b| b.created.cmp(&a.created));
        jobs
    }

    /// Applies `mutation` under the write lock and writes the record through
    ///
    /// A failed write is logged and otherwise ignored: memory stays
    /// authoritative for this process.
    pub fn update<F>(&self, id: Uuid, mutation: F) -> Result<Job, StoreError>
    where
        F: FnOnce(&mut Job),
    {
        let mut jobs = self.write();
        let job = jobs.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        mutation(job);
        self.persist(job);

        Ok(job.clone())
    }

    /// Loads every `*.json` record from the jobs directory into memory
    ///
    /// Unreadable or malformed files are logged and skipped. Returns the
    /// loaded jobs, oldest first.
    pub fn load_all(&self) -> Vec<Job> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Could not read jobs directory {}: {}", self.dir.display(), e);
                return Vec::new();
            }
        };

        let mut loaded = Vec::new();

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let data = match std::fs::read(&path) {
                Ok(data) => data,
                Err(e) => {
                    warn!("Error reading job file {}: {}", path.display(), e);
                    continue;
                }
            };

            match serde_json::from_slice::<Job>(&data) {
                Ok(job) => loaded.push(job),
                Err(e) => warn!("Skipping malformed job file {}: {}", path.display(), e),
            }
        }

        loaded.sort_by(|a, b| a.created.cmp(&b.created));

        let mut jobs = self.write();
        for job in &loaded {
            jobs.insert(job.id, job.clone());
        }

        if !loaded.is_empty() {
            info!("Loaded {} job(s) from {}", loaded.len(), self.dir.display());
        }

        loaded
    }

    /// Path of the durable record for `id`
    pub fn record_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Writes the record to a sibling temp file, then renames it into place
    ///
    /// The staging file is fsynced before the rename; the directory entry is
    /// not, so a power loss may still roll the record back one mutation.
    fn persist(&self, job: &Job) {
        let data = match serde_json::to_vec_pretty(job) {
            Ok(data) => data,
            Err(e) => {
                error!("Error serializing job {}: {}", job.id, e);
                return;
            }
        };

        let path = self.record_path(job.id);
        let staging = path.with_extension("json.tmp");

        let result = write_synced(&staging, &data)
            .and_then(|_| std::fs::rename(&staging, &path));

        if let Err(e) = result {
            error!("Error saving job {} to {}: {}", job.id, path.display(), e);
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, Job>> {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, Job>> {
        self.jobs.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(data)?;
    file.sync_all()
}
