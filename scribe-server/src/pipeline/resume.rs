//! Resuming interrupted jobs
//!
//! A job that was mid-flight when the server stopped is reconciled against
//! the artifacts on disk, skipping every stage whose output already exists.

use scribe_core::domain::job::{JobStatus, Progress};
use tracing::{info, warn};
use uuid::Uuid;

use super::executor::{Pipeline, PipelineError};
use crate::repository::StoreError;

impl Pipeline {
    /// Continues a job from the furthest stage its artifacts allow
    pub async fn resume(&self, id: Uuid) {
        let pipeline = self.clone();
        self.contain(id, async move { pipeline.reconcile(id).await }).await;
    }

    async fn reconcile(&self, id: Uuid) -> Result<(), PipelineError> {
        let job = self.store.get(id).ok_or(StoreError::NotFound(id))?;
        info!("Resuming job {} from status: {}", id, job.status);

        let transcript_path = self.layout.public_transcript(id);
        let public_audio = self.layout.public_audio(id);
        let temp_audio = self.layout.temp_audio(id);

        if transcript_path.exists() {
            match tokio::fs::read_to_string(&transcript_path).await {
                Ok(text) if !text.trim().is_empty() => {
                    let audio_ref = public_audio.exists().then(|| self.layout.audio_ref(id));
                    let file = self.layout.transcript_ref(id);
                    self.store.update(id, |job| {
                        if audio_ref.is_some() {
                            job.audio_file = audio_ref;
                        }
                        job.mark_done(text.trim().to_string(), file);
                    })?;
                    info!("Job {} already completed, loaded existing transcript", id);
                    return Ok(());
                }
                Ok(_) => warn!("Transcript for job {} is empty, transcribing again", id),
                Err(e) => warn!("Failed to read transcript for job {}: {}", id, e),
            }
        }

        let audio = if public_audio.exists() {
            info!("Found published audio for job {}", id);
            let reference = self.layout.audio_ref(id);
            self.store.update(id, |job| job.audio_file = Some(reference))?;
            public_audio
        } else if temp_audio.exists() {
            info!("Found downloaded audio for job {}", id);
            self.publish_audio(id, &temp_audio).await;
            temp_audio
        } else {
            if job.url.trim().is_empty() {
                return Err(PipelineError::SourceMissing);
            }
            info!("No audio found for job {}, downloading again", id);
            self.acquire_audio(id, &job.url).await?
        };

        self.advance(id, JobStatus::Transcribing, Progress::new(50, 100, 0))?;
        self.finish_from_audio(id, &audio).await
    }
}
