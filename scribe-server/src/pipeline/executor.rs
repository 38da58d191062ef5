//! Pipeline execution
//!
//! [`Pipeline::run`] processes a freshly queued job. Every run executes on
//! its own task so that an error or a panic inside the stages ends up as an
//! `error` record instead of taking down the worker.

use scribe_core::domain::job::{Job, JobStatus, Progress};
use std::any::Any;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::artifacts::ArtifactLayout;
use super::chunker::{self, ChunkPolicy};
use crate::repository::{JobStore, StoreError};
use crate::tooling::{self, MediaTooling, ToolError};

/// Reasons a job ends in the `error` state
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Download failed: {0}")]
    Download(#[source] ToolError),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Save failed: {0}")]
    Save(#[source] std::io::Error),

    #[error("cannot resume: source not saved")]
    SourceMissing,

    #[error("Internal error: {0}")]
    Store(#[from] StoreError),
}

/// Shared handle to everything a job run needs
#[derive(Clone)]
pub struct Pipeline {
    pub(super) store: Arc<JobStore>,
    pub(super) tooling: Arc<dyn MediaTooling>,
    pub(super) layout: ArtifactLayout,
    pub(super) chunking: ChunkPolicy,
}

impl Pipeline {
    pub fn new(
        store: Arc<JobStore>,
        tooling: Arc<dyn MediaTooling>,
        layout: ArtifactLayout,
        chunking: ChunkPolicy,
    ) -> Self {
        Self {
            store,
            tooling,
            layout,
            chunking,
        }
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Processes a queued job through every stage
    pub async fn run(&self, id: Uuid) {
        let pipeline = self.clone();
        self.contain(id, async move { pipeline.process(id).await }).await;
    }

    /// Runs `work` on its own task and records any failure on the job
    pub(super) async fn contain<F>(&self, id: Uuid, work: F)
    where
        F: Future<Output = Result<(), PipelineError>> + Send + 'static,
    {
        let message = match tokio::spawn(work).await {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(join_error) if join_error.is_panic() => format!(
                "Internal error: {}",
                panic_message(join_error.into_panic().as_ref())
            ),
            Err(join_error) => format!("Internal error: {}", join_error),
        };

        error!("Job {} failed: {}", id, message);

        if let Err(e) = self.store.update(id, |job| job.mark_failed(message)) {
            warn!("Could not record failure of job {}: {}", id, e);
        }
    }

    async fn process(&self, id: Uuid) -> Result<(), PipelineError> {
        let job = self.advance(id, JobStatus::FetchingInfo, Progress::new(10, 0, 0))?;
        info!("Job {} started for {}", id, job.url);

        match self.tooling.probe_metadata(&job.url).await {
            Ok(metadata) => {
                self.store.update(id, |job| job.metadata = metadata)?;
            }
            Err(e) => warn!("Failed to extract metadata for job {}: {}", id, e),
        }

        let audio = self.acquire_audio(id, &job.url).await?;
        self.advance(id, JobStatus::Transcribing, Progress::new(50, 100, 0))?;
        self.finish_from_audio(id, &audio).await
    }

    pub(super) fn advance(
        &self,
        id: Uuid,
        status: JobStatus,
        progress: Progress,
    ) -> Result<Job, PipelineError> {
        Ok(self.store.update(id, |job| job.advance(status, progress))?)
    }

    /// Downloads the source audio into scratch space and publishes a copy
    pub(super) async fn acquire_audio(
        &self,
        id: Uuid,
        url: &str,
    ) -> Result<PathBuf, PipelineError> {
        self.advance(id, JobStatus::Downloading, Progress::new(25, 0, 0))?;

        let audio = self.layout.temp_audio(id);
        self.tooling
            .fetch_audio(url, &audio)
            .await
            .map_err(PipelineError::Download)?;

        self.publish_audio(id, &audio).await;
        Ok(audio)
    }

    /// Copies scratch audio to the public directory
    ///
    /// Publishing is best effort: a failed copy is logged and the job
    /// carries on without an `audio_file` reference.
    pub(super) async fn publish_audio(&self, id: Uuid, source: &Path) {
        let dest = self.layout.public_audio(id);

        match tokio::fs::copy(source, &dest).await {
            Ok(bytes) => {
                info!("Published {} bytes of audio for job {}", bytes, id);
                let reference = self.layout.audio_ref(id);
                if let Err(e) = self.store.update(id, |job| job.audio_file = Some(reference)) {
                    warn!("Could not record audio for job {}: {}", id, e);
                }
            }
            Err(e) => {
                warn!(
                    "Failed to copy audio for job {} to {}: {}",
                    id,
                    dest.display(),
                    e
                );
            }
        }
    }

    /// Transcribes `audio`, writes the transcript and completes the job
    pub(super) async fn finish_from_audio(
        &self,
        id: Uuid,
        audio: &Path,
    ) -> Result<(), PipelineError> {
        let text = self.transcribe(id, audio).await?;

        self.advance(id, JobStatus::Saving, Progress::new(90, 100, 90))?;

        let transcript_path = self.layout.public_transcript(id);
        tokio::fs::write(&transcript_path, &text)
            .await
            .map_err(PipelineError::Save)?;

        let file = self.layout.transcript_ref(id);
        self.store.update(id, |job| job.mark_done(text, file))?;
        info!("Job {} completed", id);

        self.discard_temp_audio(id).await;
        Ok(())
    }

    async fn transcribe(&self, id: Uuid, audio: &Path) -> Result<String, PipelineError> {
        let size = tokio::fs::metadata(audio)
            .await
            .map_err(|e| PipelineError::Transcription(format!("cannot read audio file: {}", e)))?
            .len();

        if !self.chunking.needs_chunking(size) {
            return tooling::transcribe_direct(self.tooling.as_ref(), audio)
                .await
                .map_err(|e| PipelineError::Transcription(e.to_string()));
        }

        info!(
            "Audio for job {} is {} bytes, transcribing in segments",
            id, size
        );

        let segments =
            chunker::split_audio(self.tooling.as_ref(), &self.chunking, &self.layout, id, audio)
                .await;
        if segments.is_empty() {
            return Err(PipelineError::Transcription(
                "no audio segments could be extracted".to_string(),
            ));
        }

        let text = chunker::transcribe_segments(self.tooling.as_ref(), id, &segments).await;
        if text.is_empty() {
            return Err(PipelineError::Transcription(
                "no segment produced any text".to_string(),
            ));
        }

        Ok(text)
    }

    async fn discard_temp_audio(&self, id: Uuid) {
        let path = self.layout.temp_audio(id);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove {}: {}", path.display(), e);
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "job panicked".to_string()
    }
}
