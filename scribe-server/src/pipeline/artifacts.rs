//! Artifact naming
//!
//! Every file a job produces is derived from its id, so a restarted server
//! can find the work a previous process left behind.

use std::path::{Path, PathBuf};
use uuid::Uuid;

/// URL prefix the public directory is served under
pub const PUBLIC_PREFIX: &str = "/files";

/// Locations of published and scratch artifacts
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    public_dir: PathBuf,
    tmp_dir: PathBuf,
}

impl ArtifactLayout {
    pub fn new(public_dir: impl Into<PathBuf>, tmp_dir: impl Into<PathBuf>) -> Self {
        Self {
            public_dir: public_dir.into(),
            tmp_dir: tmp_dir.into(),
        }
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    /// Published copy of the extracted audio
    pub fn public_audio(&self, id: Uuid) -> PathBuf {
        self.public_dir.join(format!("{}.wav", id))
    }

    /// Published transcript
    pub fn public_transcript(&self, id: Uuid) -> PathBuf {
        self.public_dir.join(format!("{}.txt", id))
    }

    /// Download target
    pub fn temp_audio(&self, id: Uuid) -> PathBuf {
        self.tmp_dir.join(format!("{}.wav", id))
    }

    /// Scratch file for the `index`-th segment of a chunked transcription
    pub fn segment(&self, id: Uuid, index: usize) -> PathBuf {
        self.tmp_dir.join(format!("{}_chunk_{}.wav", id, index))
    }

    /// Reference stored in `audio_file`
    pub fn audio_ref(&self, id: Uuid) -> String {
        format!("{}/{}.wav", PUBLIC_PREFIX, id)
    }

    /// Reference stored in `file`
    pub fn transcript_ref(&self, id: Uuid) -> String {
        format!("{}/{}.txt", PUBLIC_PREFIX, id)
    }
}
