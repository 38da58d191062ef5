//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod job;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Submit a video URL for transcription
    Submit {
        /// Video URL
        url: String,

        /// Wait for the job to finish and print the transcript
        #[arg(short, long)]
        wait: bool,
    },
    /// Get job details
    Get {
        /// Job ID or unambiguous prefix
        id: String,

        /// Print the raw JSON record
        #[arg(long)]
        json: bool,
    },
    /// List unfinished jobs and jobs submitted in the last 24 hours
    Active,
    /// List completed jobs
    History,
    /// Wait for a job to finish
    Wait {
        /// Job ID or unambiguous prefix
        id: String,

        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Print or save the transcript of a finished job
    Transcript {
        /// Job ID or unambiguous prefix
        id: String,

        /// Write the transcript to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    job::handle_job_command(command, config).await
}
