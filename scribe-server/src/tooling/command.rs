//! Subprocess-backed media tooling
//!
//! Drives the external binaries:
//! - yt-dlp for metadata probing and audio download
//! - ffmpeg for conversion to 16 kHz mono PCM and segment extraction
//! - whisper for speech-to-text

use async_trait::async_trait;
use scribe_core::domain::job::VideoMetadata;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{MediaTooling, ToolError};
use crate::config::ToolPaths;

/// Checks that each configured binary can be started
///
/// Missing tools are only reported; the server still starts and the
/// affected jobs fail with a download or transcription error.
pub async fn check_tools_available(tools: &ToolPaths) {
    let probes = [
        (tools.ytdlp.as_str(), "--version"),
        (tools.ffmpeg.as_str(), "-version"),
        (tools.whisper.as_str(), "--help"),
    ];

    for (bin, arg) in probes {
        match Command::new(bin)
            .arg(arg)
            .stdin(Stdio::null())
            .output()
            .await
        {
            Ok(output) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let first_line = stdout.lines().next().unwrap_or_default();
                info!("{} is available: {}", bin, first_line.trim());
            }
            Ok(output) => warn!("{} exited with {} during availability check", bin, output.status),
            Err(e) => warn!("{} is not available: {}", bin, e),
        }
    }
}

/// Runs yt-dlp, ffmpeg and whisper as child processes
pub struct CommandTooling {
    tools: ToolPaths,
    tmp_dir: PathBuf,
}

impl CommandTooling {
    /// Creates the tooling
    ///
    /// # Arguments
    /// * `tools` - Binary names or paths
    /// * `tmp_dir` - Directory whisper writes its text output to
    pub fn new(tools: ToolPaths, tmp_dir: impl Into<PathBuf>) -> Self {
        Self {
            tools,
            tmp_dir: tmp_dir.into(),
        }
    }

    /// Where whisper leaves the transcript for `audio`
    fn whisper_output_path(&self, audio: &Path) -> PathBuf {
        let stem = audio
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.tmp_dir.join(format!("{}.txt", stem))
    }
}

#[async_trait]
impl MediaTooling for CommandTooling {
    async fn probe_metadata(&self, url: &str) -> Result<VideoMetadata, ToolError> {
        let mut command = Command::new(&self.tools.ytdlp);
        command.arg("--dump-json").arg("--no-download").arg(url);

        let output = run(&self.tools.ytdlp, &mut command).await?;
        parse_probe_output(&output.stdout)
    }

    async fn fetch_audio(&self, url: &str, dest: &Path) -> Result<(), ToolError> {
        info!("Downloading audio from {} to {}", url, dest.display());

        let mut download = Command::new(&self.tools.ytdlp)
            .arg("-f")
            .arg("ba")
            .arg("-o")
            .arg("-")
            .arg(url)
            .arg("--quiet")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolError::Spawn {
                tool: self.tools.ytdlp.clone(),
                source,
            })?;

        let audio_stream: Stdio = download
            .stdout
            .take()
            .ok_or_else(|| ToolError::Output {
                tool: self.tools.ytdlp.clone(),
                message: "stdout was not captured".to_string(),
            })?
            .try_into()
            .map_err(|source| ToolError::Spawn {
                tool: self.tools.ffmpeg.clone(),
                source,
            })?;

        let convert = Command::new(&self.tools.ffmpeg)
            .arg("-i")
            .arg("pipe:0")
            .arg("-vn")
            .arg("-ac")
            .arg("1")
            .arg("-ar")
            .arg("16000")
            .arg("-f")
            .arg("wav")
            .arg(dest)
            .arg("-y")
            .stdin(audio_stream)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let convert = match convert {
            Ok(child) => child,
            Err(source) => {
                if let Err(e) = download.start_kill() {
                    debug!("Failed to stop {} after ffmpeg spawn error: {}", self.tools.ytdlp, e);
                }
                return Err(ToolError::Spawn {
                    tool: self.tools.ffmpeg.clone(),
                    source,
                });
            }
        };

        let (download_output, convert_output) =
            tokio::join!(download.wait_with_output(), convert.wait_with_output());

        let download_output = download_output.map_err(|source| ToolError::Spawn {
            tool: self.tools.ytdlp.clone(),
            source,
        })?;
        let convert_output = convert_output.map_err(|source| ToolError::Spawn {
            tool: self.tools.ffmpeg.clone(),
            source,
        })?;

        check_status(&self.tools.ytdlp, &download_output)?;
        check_status(&self.tools.ffmpeg, &convert_output)?;

        info!("Audio downloaded to {}", dest.display());
        Ok(())
    }

    async fn extract_segment(
        &self,
        audio: &Path,
        start_secs: u64,
        length_secs: u64,
        dest: &Path,
    ) -> Result<(), ToolError> {
        let mut command = Command::new(&self.tools.ffmpeg);
        command
            .arg("-i")
            .arg(audio)
            .arg("-ss")
            .arg(start_secs.to_string())
            .arg("-t")
            .arg(length_secs.to_string())
            .arg("-c")
            .arg("copy")
            .arg(dest)
            .arg("-y");

        run(&self.tools.ffmpeg, &mut command).await?;
        Ok(())
    }

    async fn transcribe(&self, audio: &Path) -> Result<String, ToolError> {
        debug!("Running {} on {}", self.tools.whisper, audio.display());

        let mut command = Command::new(&self.tools.whisper);
        command
            .arg(audio)
            .arg("--model")
            .arg(&self.tools.whisper_model)
            .arg("--output_format")
            .arg("txt")
            .arg("--output_dir")
            .arg(&self.tmp_dir)
            .arg("--verbose")
            .arg("False");

        run(&self.tools.whisper, &mut command).await?;

        let text_path = self.whisper_output_path(audio);
        let text = tokio::fs::read_to_string(&text_path)
            .await
            .map_err(|e| ToolError::Output {
                tool: self.tools.whisper.clone(),
                message: format!("cannot read {}: {}", text_path.display(), e),
            })?;

        if let Err(e) = tokio::fs::remove_file(&text_path).await {
            debug!("Failed to remove {}: {}", text_path.display(), e);
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(ToolError::EmptyTranscript);
        }

        Ok(text.to_string())
    }
}

/// Runs a command to completion, failing on a non-zero exit
async fn run(tool: &str, command: &mut Command) -> Result<Output, ToolError> {
    let output = command
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| ToolError::Spawn {
            tool: tool.to_string(),
            source,
        })?;

    check_status(tool, &output)?;
    Ok(output)
}

fn check_status(tool: &str, output: &Output) -> Result<(), ToolError> {
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    debug!("{} failed: status={} stderr='{}'", tool, output.status, stderr.trim());

    Err(ToolError::Failed {
        tool: tool.to_string(),
        status: output.status.to_string(),
        stderr: last_lines(&stderr, 5),
    })
}

/// Keeps the tail of a noisy stderr stream
fn last_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.trim().lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}

/// Subset of the yt-dlp `--dump-json` document the pipeline uses
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProbeOutput {
    title: Option<String>,
    description: Option<String>,
    thumbnail: Option<String>,
    duration: Option<f64>,
    channel: Option<String>,
    uploader: Option<String>,
}

fn parse_probe_output(stdout: &[u8]) -> Result<VideoMetadata, ToolError> {
    let probe: ProbeOutput = serde_json::from_slice(stdout).map_err(|e| ToolError::Output {
        tool: "yt-dlp".to_string(),
        message: e.to_string(),
    })?;

    let non_empty = |value: Option<String>| value.filter(|s| !s.trim().is_empty());

    Ok(VideoMetadata {
        title: non_empty(probe.title),
        description: non_empty(probe.description),
        thumbnail: non_empty(probe.thumbnail),
        duration: probe
            .duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .map(|d| d.trunc() as u64),
        channel_name: non_empty(probe.channel).or_else(|| non_empty(probe.uploader)),
    })
}
