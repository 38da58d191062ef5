//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Transcription job record
///
/// The same shape is written to the per-job durable file and returned by the API.
/// Empty optional fields are omitted on output and defaulted on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    /// Source URL, kept so an interrupted job can re-download its audio.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    /// Public reference to the transcript artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Public reference to the audio artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_file: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(flatten)]
    pub progress: Progress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created: DateTime<Utc>,
    #[serde(flatten)]
    pub metadata: VideoMetadata,
}

impl Job {
    /// Creates a freshly submitted job for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Queued,
            url: url.into(),
            file: None,
            audio_file: None,
            text: String::new(),
            progress: Progress::default(),
            error: None,
            created: Utc::now(),
            metadata: VideoMetadata::default(),
        }
    }

    /// Moves the job to a new non-terminal stage
    pub fn advance(&mut self, status: JobStatus, progress: Progress) {
        self.status = status;
        self.progress = progress;
    }

    /// Marks the job as failed
    ///
    /// Overall progress drops to zero; audio and transcript progress keep
    /// their last values so the failing stage can still be read off the record.
    pub fn mark_failed(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.status = JobStatus::Error;
        self.progress.overall = 0;
        self.error = Some(if message.trim().is_empty() {
            "Unknown error".to_string()
        } else {
            message
        });
    }

    /// Marks the job as done with its transcript
    pub fn mark_done(&mut self, text: String, file: String) {
        self.status = JobStatus::Done;
        self.progress = Progress::COMPLETE;
        self.text = text;
        self.file = Some(file);
    }

    /// Whether the job was created within `window` before `now`
    pub fn created_within(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        now.signed_duration_since(self.created) < window
    }
}

/// Job lifecycle status
///
/// `Done` and `Error` are terminal. The remaining variants follow the order in
/// which a run visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    FetchingInfo,
    Downloading,
    Transcribing,
    Saving,
    Done,
    Error,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::FetchingInfo => "fetching_info",
            JobStatus::Downloading => "downloading",
            JobStatus::Transcribing => "transcribing",
            JobStatus::Saving => "saving",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress percentages, 0-100 each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Progress {
    #[serde(rename = "progress", default)]
    pub overall: u8,
    #[serde(rename = "audio_progress", default)]
    pub audio: u8,
    #[serde(rename = "transcript_progress", default)]
    pub transcript: u8,
}

impl Progress {
    pub const COMPLETE: Progress = Progress::new(100, 100, 100);

    pub const fn new(overall: u8, audio: u8, transcript: u8) -> Self {
        Self {
            overall,
            audio,
            transcript,
        }
    }
}

/// Best-effort information about the source video
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VideoMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Duration in whole seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
}
