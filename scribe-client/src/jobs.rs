//! Job-related API endpoints

use crate::ScribeClient;
use crate::error::{ClientError, Result};
use scribe_core::domain::job::Job;
use scribe_core::dto::job::SubmitJob;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Polling behaviour for [`ScribeClient::wait_for_job`]
#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    /// Delay between status checks
    pub poll_interval: Duration,
    /// Give up after this long (None = wait forever)
    pub timeout: Option<Duration>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            timeout: None,
        }
    }
}

impl ScribeClient {
    /// Submit a video URL for transcription
    ///
    /// # Returns
    /// The created job, normally in the `queued` state
    pub async fn submit_job(&self, url: impl Into<String>) -> Result<Job> {
        let req = SubmitJob::new(url);
        tracing::debug!("Submitting job for {}", req.url);

        let response = self
            .client
            .post(self.url_for("/job"))
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a job by ID
    pub async fn get_job(&self, id: Uuid) -> Result<Job> {
        let response = self
            .client
            .get(self.url_for(&format!("/job/{}", id)))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// List unfinished jobs plus finished ones created within the last 24 hours, newest first
    pub async fn list_active_jobs(&self) -> Result<Vec<Job>> {
        let response = self.client.get(self.url_for("/jobs/active")).send().await?;
        self.handle_response(response).await
    }

    /// List completed jobs, newest first
    pub async fn list_job_history(&self) -> Result<Vec<Job>> {
        let response = self.client.get(self.url_for("/jobs/history")).send().await?;
        self.handle_response(response).await
    }

    /// Poll a job until it reaches `done` or `error`
    ///
    /// `on_update` is called with every snapshot fetched, which lets callers
    /// render progress.
    pub async fn wait_for_job<F>(
        &self,
        id: Uuid,
        options: WaitOptions,
        mut on_update: F,
    ) -> Result<Job>
    where
        F: FnMut(&Job),
    {
        let started = Instant::now();

        loop {
            let job = self.get_job(id).await?;
            on_update(&job);

            if job.status.is_terminal() {
                return Ok(job);
            }

            if let Some(timeout) = options.timeout {
                if started.elapsed() >= timeout {
                    return Err(ClientError::Timeout(id));
                }
            }

            tokio::time::sleep(options.poll_interval).await;
        }
    }

    /// Fetch a published artifact, e.g. the transcript referenced by `Job::file`
    pub async fn fetch_artifact(&self, reference: &str) -> Result<String> {
        let response = self.client.get(self.url_for(reference)).send().await?;
        self.handle_text_response(response).await
    }
}
