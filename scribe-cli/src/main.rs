//! Scribe CLI
//!
//! Command-line interface for submitting videos to a Scribe server and
//! reading back their transcripts.

mod commands;
mod config;
mod id_resolver;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "scribe")]
#[command(about = "Scribe video transcription CLI", long_about = None)]
struct Cli {
    /// Server URL
    #[arg(long, env = "SCRIBE_SERVER_URL", default_value = "http://localhost:8081")]
    server_url: String,

    /// Seconds between status checks when waiting on a job
    #[arg(long, env = "SCRIBE_POLL_SECONDS", default_value_t = 2)]
    poll_seconds: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        server_url: cli.server_url,
        poll_interval: Duration::from_secs(cli.poll_seconds.max(1)),
    };

    handle_command(cli.command, &config).await
}
