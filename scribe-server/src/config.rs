//! Server configuration
//!
//! Defines all configurable parameters for the server: listening address,
//! artifact directories, queue sizing and overflow policy, chunking limits,
//! and the external tool binaries.

use std::path::PathBuf;
use std::str::FromStr;

use scribe_core::domain::source::SourceAllowlist;

use crate::pipeline::chunker::ChunkPolicy;
use crate::scheduler::queue::OverflowPolicy;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_addr: String,

    /// Directory holding published artifacts, served under `/files`
    pub public_dir: PathBuf,

    /// Directory holding one JSON record per job
    pub jobs_dir: PathBuf,

    /// Scratch directory for downloads, segments and tool output
    pub tmp_dir: PathBuf,

    /// Number of job ids the work queue buffers
    pub queue_capacity: usize,

    /// What happens to a submission when the queue is full
    pub overflow_policy: OverflowPolicy,

    /// Cap on concurrently running spilled and resumed jobs (None = unbounded)
    pub max_detached_runs: Option<usize>,

    /// Audio chunking limits
    pub chunking: ChunkPolicy,

    /// Domains accepted on submission
    pub allowlist: SourceAllowlist,

    /// External tool binaries
    pub tools: ToolPaths,
}

/// Names or paths of the external binaries the pipeline invokes
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub ytdlp: String,
    pub ffmpeg: String,
    pub whisper: String,
    pub whisper_model: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ytdlp: "yt-dlp".to_string(),
            ffmpeg: "ffmpeg".to_string(),
            whisper: "whisper".to_string(),
            whisper_model: "tiny".to_string(),
        }
    }
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Every variable is optional and falls back to the default:
    /// - SCRIBE_BIND_ADDR (default: 0.0.0.0:8081)
    /// - SCRIBE_PUBLIC_DIR (default: /data)
    /// - SCRIBE_JOBS_DIR (default: /data/jobs)
    /// - SCRIBE_TMP_DIR (default: /tmp)
    /// - SCRIBE_QUEUE_CAPACITY (default: 100)
    /// - SCRIBE_OVERFLOW_POLICY (spill | block | reject, default: spill)
    /// - SCRIBE_MAX_DETACHED_RUNS (default: unbounded)
    /// - SCRIBE_CHUNK_THRESHOLD_BYTES, SCRIBE_CHUNK_SECONDS, SCRIBE_MAX_CHUNKS
    /// - SCRIBE_ALLOWED_DOMAINS (comma separated)
    /// - SCRIBE_YTDLP_BIN, SCRIBE_FFMPEG_BIN, SCRIBE_WHISPER_BIN, SCRIBE_WHISPER_MODEL
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let overflow_policy = match std::env::var("SCRIBE_OVERFLOW_POLICY") {
            Ok(value) => OverflowPolicy::from_str(&value)?,
            Err(_) => defaults.overflow_policy,
        };

        let max_detached_runs = match env_parse::<usize>("SCRIBE_MAX_DETACHED_RUNS") {
            Some(0) | None => None,
            Some(n) => Some(n),
        };

        let chunking = ChunkPolicy {
            size_threshold_bytes: env_parse("SCRIBE_CHUNK_THRESHOLD_BYTES")
                .unwrap_or(defaults.chunking.size_threshold_bytes),
            segment_secs: env_parse("SCRIBE_CHUNK_SECONDS")
                .unwrap_or(defaults.chunking.segment_secs),
            max_segments: env_parse("SCRIBE_MAX_CHUNKS").unwrap_or(defaults.chunking.max_segments),
            ..defaults.chunking
        };

        let allowlist = std::env::var("SCRIBE_ALLOWED_DOMAINS")
            .map(|list| SourceAllowlist::parse(&list))
            .unwrap_or(defaults.allowlist);

        let tools = ToolPaths {
            ytdlp: env_string("SCRIBE_YTDLP_BIN").unwrap_or(defaults.tools.ytdlp),
            ffmpeg: env_string("SCRIBE_FFMPEG_BIN").unwrap_or(defaults.tools.ffmpeg),
            whisper: env_string("SCRIBE_WHISPER_BIN").unwrap_or(defaults.tools.whisper),
            whisper_model: env_string("SCRIBE_WHISPER_MODEL")
                .unwrap_or(defaults.tools.whisper_model),
        };

        Ok(Self {
            bind_addr: env_string("SCRIBE_BIND_ADDR").unwrap_or(defaults.bind_addr),
            public_dir: env_string("SCRIBE_PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.public_dir),
            jobs_dir: env_string("SCRIBE_JOBS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.jobs_dir),
            tmp_dir: env_string("SCRIBE_TMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.tmp_dir),
            queue_capacity: env_parse("SCRIBE_QUEUE_CAPACITY").unwrap_or(defaults.queue_capacity),
            overflow_policy,
            max_detached_runs,
            chunking,
            allowlist,
            tools,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if self.queue_capacity == 0 {
            anyhow::bail!("queue_capacity must be greater than 0");
        }

        if self.chunking.segment_secs == 0 {
            anyhow::bail!("chunk segment length must be greater than 0");
        }

        if self.chunking.max_segments == 0 {
            anyhow::bail!("max chunk count must be greater than 0");
        }

        if self.allowlist.domains().is_empty() {
            anyhow::bail!("at least one allowed source domain is required");
        }

        if self.jobs_dir == self.tmp_dir {
            anyhow::bail!("jobs_dir and tmp_dir must differ");
        }

        if self.public_dir == self.tmp_dir {
            anyhow::bail!("public_dir and tmp_dir must differ");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8081".to_string(),
            public_dir: PathBuf::from("/data"),
            jobs_dir: PathBuf::from("/data/jobs"),
            tmp_dir: PathBuf::from("/tmp"),
            queue_capacity: 100,
            overflow_policy: OverflowPolicy::Spill,
            max_detached_runs: None,
            chunking: ChunkPolicy::default(),
            allowlist: SourceAllowlist::default(),
            tools: ToolPaths::default(),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|s| s.trim().parse::<T>().ok())
}
