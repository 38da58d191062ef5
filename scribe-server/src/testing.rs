//! Shared fixtures for unit tests

use async_trait::async_trait;
use scribe_core::domain::job::{Job, VideoMetadata};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

use crate::pipeline::artifacts::ArtifactLayout;
use crate::pipeline::chunker::ChunkPolicy;
use crate::pipeline::Pipeline;
use crate::repository::JobStore;
use crate::tooling::{MediaTooling, ToolError};

/// Scripted stand-in for the external tools
///
/// Segment files are named `<id>_chunk_<i>.wav`; the fake reads the index
/// back from the file name to decide what each segment transcribes to.
pub struct FakeTooling {
    metadata: Option<VideoMetadata>,
    audio_bytes: Option<u64>,
    transcript: Option<String>,
    segment_count: usize,
    failing_segments: HashSet<usize>,
    panic_on_transcribe: bool,
    transcribe_delay: Duration,

    pub fetch_calls: AtomicUsize,
    pub transcribe_calls: AtomicUsize,
    /// `(start_secs, length_secs)` of every extraction, in call order
    pub extract_calls: Mutex<Vec<(u64, u64)>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeTooling {
    pub fn new() -> Self {
        Self {
            metadata: Some(VideoMetadata {
                title: Some("Test Video".to_string()),
                channel_name: Some("Test Channel".to_string()),
                duration: Some(42),
                ..VideoMetadata::default()
            }),
            audio_bytes: Some(2048),
            transcript: Some("hello world".to_string()),
            segment_count: 0,
            failing_segments: HashSet::new(),
            panic_on_transcribe: false,
            transcribe_delay: Duration::ZERO,
            fetch_calls: AtomicUsize::new(0),
            transcribe_calls: AtomicUsize::new(0),
            extract_calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn without_metadata(mut self) -> Self {
        self.metadata = None;
        self
    }

    pub fn failing_download(mut self) -> Self {
        self.audio_bytes = None;
        self
    }

    pub fn with_audio_bytes(mut self, bytes: u64) -> Self {
        self.audio_bytes = Some(bytes);
        self
    }

    pub fn with_transcript(mut self, text: &str) -> Self {
        self.transcript = Some(text.to_string());
        self
    }

    pub fn failing_transcription(mut self) -> Self {
        self.transcript = None;
        self
    }

    pub fn with_segments(mut self, count: usize, failing: &[usize]) -> Self {
        self.segment_count = count;
        self.failing_segments = failing.iter().copied().collect();
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic_on_transcribe = true;
        self
    }

    pub fn with_transcribe_delay(mut self, delay: Duration) -> Self {
        self.transcribe_delay = delay;
        self
    }
}

fn segment_index(audio: &Path) -> Option<usize> {
    let stem = audio.file_stem()?.to_str()?;
    let (_, index) = stem.rsplit_once("_chunk_")?;
    index.parse().ok()
}

#[async_trait]
impl MediaTooling for FakeTooling {
    async fn probe_metadata(&self, _url: &str) -> Result<VideoMetadata, ToolError> {
        self.metadata.clone().ok_or_else(|| ToolError::Output {
            tool: "fake".to_string(),
            message: "metadata unavailable".to_string(),
        })
    }

    async fn fetch_audio(&self, _url: &str, dest: &Path) -> Result<(), ToolError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        let bytes = self.audio_bytes.ok_or_else(|| ToolError::Failed {
            tool: "fake".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "video unavailable".to_string(),
        })?;

        let file = std::fs::File::create(dest).map_err(|source| ToolError::Spawn {
            tool: "fake".to_string(),
            source,
        })?;
        file.set_len(bytes).map_err(|source| ToolError::Spawn {
            tool: "fake".to_string(),
            source,
        })?;
        Ok(())
    }

    async fn extract_segment(
        &self,
        _audio: &Path,
        start_secs: u64,
        length_secs: u64,
        dest: &Path,
    ) -> Result<(), ToolError> {
        self.extract_calls
            .lock()
            .unwrap()
            .push((start_secs, length_secs));

        let index = (start_secs / length_secs) as usize;
        if index >= self.segment_count {
            return Err(ToolError::Failed {
                tool: "fake".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "past end of input".to_string(),
            });
        }

        std::fs::write(dest, vec![0u8; 4096]).map_err(|source| ToolError::Spawn {
            tool: "fake".to_string(),
            source,
        })
    }

    async fn transcribe(&self, audio: &Path) -> Result<String, ToolError> {
        self.transcribe_calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.transcribe_delay.is_zero() {
            tokio::time::sleep(self.transcribe_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.panic_on_transcribe {
            panic!("model crashed");
        }

        if let Some(index) = segment_index(audio) {
            if self.failing_segments.contains(&index) {
                return Err(ToolError::EmptyTranscript);
            }
            return Ok(format!(" segment {} ", index));
        }

        self.transcript.clone().ok_or_else(|| ToolError::Failed {
            tool: "fake".to_string(),
            status: "exit status: 2".to_string(),
            stderr: "model not found".to_string(),
        })
    }
}

/// Temporary directories plus a pipeline wired to a fake
pub struct Fixture {
    _dir: TempDir,
    pub store: Arc<JobStore>,
    pub tooling: Arc<FakeTooling>,
    pub layout: ArtifactLayout,
    pub pipeline: Pipeline,
}

impl Fixture {
    pub fn new(tooling: FakeTooling) -> Self {
        Self::with_policy(tooling, ChunkPolicy::default())
    }

    pub fn with_policy(tooling: FakeTooling, chunking: ChunkPolicy) -> Self {
        let dir = TempDir::new().unwrap();
        let public_dir = dir.path().join("public");
        let jobs_dir = dir.path().join("jobs");
        let tmp_dir = dir.path().join("tmp");
        for path in [&public_dir, &jobs_dir, &tmp_dir] {
            std::fs::create_dir_all(path).unwrap();
        }

        let store = Arc::new(JobStore::new(jobs_dir));
        let tooling = Arc::new(tooling);
        let layout = ArtifactLayout::new(public_dir, tmp_dir);
        let pipeline = Pipeline::new(
            store.clone(),
            tooling.clone(),
            layout.clone(),
            chunking,
        );

        Self {
            _dir: dir,
            store,
            tooling,
            layout,
            pipeline,
        }
    }

    /// Creates a queued job for `url`
    pub fn submit(&self, url: &str) -> Uuid {
        self.store.create(Job::new(url)).unwrap().id
    }
}

/// Polls the store until the job reaches a terminal state
pub async fn wait_for_terminal(store: &JobStore, id: Uuid) -> Job {
    for _ in 0..500 {
        if let Some(job) = store.get(id) {
            if job.status.is_terminal() {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} did not finish", id);
}
