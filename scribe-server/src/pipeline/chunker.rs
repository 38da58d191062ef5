//! Chunked transcription
//!
//! Long recordings are cut into fixed-length segments which are transcribed
//! one after another and joined with single spaces.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::artifacts::ArtifactLayout;
use crate::tooling::MediaTooling;

/// Limits governing when and how audio is split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPolicy {
    /// Files strictly larger than this are split
    pub size_threshold_bytes: u64,

    /// Length of each segment in seconds
    pub segment_secs: u64,

    /// Upper bound on the number of segments
    pub max_segments: usize,

    /// Segments at or below this size mark the end of the audio
    pub min_segment_bytes: u64,
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        Self {
            size_threshold_bytes: 10 * 1024 * 1024,
            segment_secs: 120,
            max_segments: 10,
            min_segment_bytes: 1000,
        }
    }
}

impl ChunkPolicy {
    pub fn needs_chunking(&self, audio_bytes: u64) -> bool {
        audio_bytes > self.size_threshold_bytes
    }
}

/// Cuts `audio` into segments
///
/// Extraction stops at the first failure, at a segment that is too small to
/// hold audio, or at `max_segments`. The segments written are returned in order.
pub async fn split_audio(
    tooling: &dyn MediaTooling,
    policy: &ChunkPolicy,
    layout: &ArtifactLayout,
    job_id: Uuid,
    audio: &Path,
) -> Vec<PathBuf> {
    let mut segments = Vec::new();

    for index in 0..policy.max_segments {
        let dest = layout.segment(job_id, index);
        let start = index as u64 * policy.segment_secs;

        if let Err(e) = tooling
            .extract_segment(audio, start, policy.segment_secs, &dest)
            .await
        {
            debug!("Segment {} of job {} not extracted: {}", index, job_id, e);
            remove_quietly(&dest).await;
            break;
        }

        let size = match tokio::fs::metadata(&dest).await {
            Ok(meta) => meta.len(),
            Err(_) => 0,
        };

        if size <= policy.min_segment_bytes {
            remove_quietly(&dest).await;
            break;
        }

        segments.push(dest);
    }

    if segments.len() == policy.max_segments {
        warn!(
            "Audio for job {} reached the {} segment limit, anything past {}s is not transcribed",
            job_id,
            policy.max_segments,
            policy.max_segments as u64 * policy.segment_secs
        );
    }

    info!("Split audio for job {} into {} segment(s)", job_id, segments.len());
    segments
}

/// Transcribes each segment in order and joins the texts
///
/// Segments that fail or come back blank are skipped. Every segment file is
/// removed afterwards. The result is empty when no segment produced text.
pub async fn transcribe_segments(
    tooling: &dyn MediaTooling,
    job_id: Uuid,
    segments: &[PathBuf],
) -> String {
    let mut parts = Vec::with_capacity(segments.len());

    for (index, segment) in segments.iter().enumerate() {
        match tooling.transcribe(segment).await {
            Ok(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    parts.push(text.to_string());
                }
            }
            Err(e) => warn!(
                "Transcription of segment {} for job {} failed: {}",
                index, job_id, e
            ),
        }

        remove_quietly(segment).await;
    }

    parts.join(" ").trim().to_string()
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!("Failed to remove {}: {}", path.display(), e);
        }
    }
}
