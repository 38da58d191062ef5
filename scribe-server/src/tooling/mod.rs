//! External tooling
//!
//! The pipeline talks to its external collaborators (metadata probe, audio
//! download/convert, segment extraction, speech-to-text) only through the
//! [`MediaTooling`] trait. [`CommandTooling`] is the subprocess-backed
//! implementation used in production.

pub mod command;

pub use command::CommandTooling;

use async_trait::async_trait;
use scribe_core::domain::job::VideoMetadata;
use std::path::Path;

/// Failure of a single external tool invocation
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed ({status}): {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("unexpected output from {tool}: {message}")]
    Output { tool: String, message: String },

    #[error("empty transcript generated")]
    EmptyTranscript,
}

/// Contract with the external media tools
///
/// Implementations hold no per-job state; every call is independent.
#[async_trait]
pub trait MediaTooling: Send + Sync {
    /// Looks up title, description, thumbnail, duration and channel for `url`
    async fn probe_metadata(&self, url: &str) -> Result<VideoMetadata, ToolError>;

    /// Downloads the audio of `url` and writes a mono 16 kHz PCM wave file to `dest`
    async fn fetch_audio(&self, url: &str, dest: &Path) -> Result<(), ToolError>;

    /// Copies `length_secs` of `audio` starting at `start_secs` into `dest`
    async fn extract_segment(
        &self,
        audio: &Path,
        start_secs: u64,
        length_secs: u64,
        dest: &Path,
    ) -> Result<(), ToolError>;

    /// Produces plain transcript text for `audio`
    async fn transcribe(&self, audio: &Path) -> Result<String, ToolError>;
}

/// Transcribes a single file, treating blank output as a failure
pub async fn transcribe_direct(
    tooling: &dyn MediaTooling,
    audio: &Path,
) -> Result<String, ToolError> {
    let text = tooling.transcribe(audio).await?;
    let text = text.trim();

    if text.is_empty() {
        return Err(ToolError::EmptyTranscript);
    }

    Ok(text.to_string())
}
