//! Job command handlers
//!
//! Handles submitting jobs, inspecting them, waiting on them and
//! fetching their transcripts.

use anyhow::{Context, Result, bail};
use colored::*;
use scribe_client::{ScribeClient, WaitOptions};
use scribe_core::domain::job::{Job, JobStatus};
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

use super::Commands;
use crate::config::Config;
use crate::id_resolver::resolve_job_id;

/// Handle job commands
pub async fn handle_job_command(command: Commands, config: &Config) -> Result<()> {
    let client = ScribeClient::new(&config.server_url);

    match command {
        Commands::Submit { url, wait } => submit_job(&client, config, &url, wait).await,
        Commands::Get { id, json } => get_job(&client, &id, json).await,
        Commands::Active => list_active_jobs(&client).await,
        Commands::History => list_job_history(&client).await,
        Commands::Wait { id, timeout } => {
            let uuid = resolve_job_id(&client, &id).await?;
            let job = wait_for_job(&client, config, uuid, timeout).await?;
            print_job_details(&job);
            Ok(())
        }
        Commands::Transcript { id, output } => {
            get_transcript(&client, &id, output.as_deref()).await
        }
    }
}

/// Submit a URL and optionally wait for the transcript
async fn submit_job(client: &ScribeClient, config: &Config, url: &str, wait: bool) -> Result<()> {
    let job = client.submit_job(url).await?;

    if job.status == JobStatus::Error {
        bail!(
            "Job {} was not accepted: {}",
            job.id,
            job.error.as_deref().unwrap_or("Unknown error")
        );
    }

    println!("{}", "✓ Job submitted".green());
    println!("  ID:     {}", job.id.to_string().cyan());
    println!("  Status: {}", colorize_status(job.status));

    if !wait {
        return Ok(());
    }

    println!();
    let job = wait_for_job(client, config, job.id, None).await?;
    println!();
    println!("{}", job.text);
    Ok(())
}

/// Get and display a single job
async fn get_job(client: &ScribeClient, id: &str, json: bool) -> Result<()> {
    let uuid = resolve_job_id(client, id).await?;
    let job = client.get_job(uuid).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&job)?);
    } else {
        print_job_details(&job);
    }

    Ok(())
}

/// List unfinished jobs plus jobs created in the last 24 hours
async fn list_active_jobs(client: &ScribeClient) -> Result<()> {
    let jobs = client.list_active_jobs().await?;

    if jobs.is_empty() {
        println!("{}", "No active jobs found.".yellow());
    } else {
        println!("{}", format!("Found {} active job(s):", jobs.len()).bold());
        println!();
        for job in jobs {
            print_job_summary(&job);
        }
    }

    Ok(())
}

/// List completed jobs
async fn list_job_history(client: &ScribeClient) -> Result<()> {
    let jobs = client.list_job_history().await?;

    if jobs.is_empty() {
        println!("{}", "No completed jobs found.".yellow());
    } else {
        println!("{}", format!("Found {} completed job(s):", jobs.len()).bold());
        println!();
        for job in jobs {
            print_job_summary(&job);
        }
    }

    Ok(())
}

/// Poll until the job finishes, printing each stage change
async fn wait_for_job(
    client: &ScribeClient,
    config: &Config,
    id: Uuid,
    timeout_secs: Option<u64>,
) -> Result<Job> {
    let options = WaitOptions {
        poll_interval: config.poll_interval,
        timeout: timeout_secs.map(Duration::from_secs),
    };

    let mut last_status = None;
    let job = client
        .wait_for_job(id, options, |job| {
            if last_status != Some(job.status) {
                last_status = Some(job.status);
                println!(
                    "  {} {:<14} {:>3}%",
                    "▸".cyan(),
                    colorize_status(job.status),
                    job.progress.overall
                );
            }
        })
        .await?;

    if job.status == JobStatus::Error {
        bail!(
            "Job {} failed: {}",
            job.id,
            job.error.as_deref().unwrap_or("Unknown error")
        );
    }

    Ok(job)
}

/// Print or save the transcript of a finished job
async fn get_transcript(client: &ScribeClient, id: &str, output: Option<&Path>) -> Result<()> {
    let uuid = resolve_job_id(client, id).await?;
    let job = client.get_job(uuid).await?;

    if job.status != JobStatus::Done {
        bail!("Job {} is not finished (status: {})", job.id, job.status);
    }

    let text = match &job.file {
        Some(reference) => client
            .fetch_artifact(reference)
            .await
            .with_context(|| format!("Failed to download transcript {}", reference))?,
        None => job.text.clone(),
    };

    match output {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{}",
                format!("✓ Transcript written to {}", path.display()).green()
            );
        }
        None => println!("{}", text),
    }

    Ok(())
}

/// Print a one-block job summary
fn print_job_summary(job: &Job) {
    println!("  {} Job {}", "▸".cyan(), job.id.to_string().dimmed());
    if let Some(title) = &job.metadata.title {
        println!("    Title:    {}", title);
    }
    println!("    Status:   {}", colorize_status(job.status));
    println!("    Progress: {}%", job.progress.overall);
    println!(
        "    Created:  {}",
        job.created
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!();
}

/// Print detailed job information
fn print_job_details(job: &Job) {
    println!("{}", "Job Details:".bold());
    println!("  ID:          {}", job.id.to_string().cyan());
    println!("  Status:      {}", colorize_status(job.status));
    println!(
        "  Progress:    {}% (audio {}%, transcript {}%)",
        job.progress.overall, job.progress.audio, job.progress.transcript
    );
    println!("  Created:     {}", job.created.format("%Y-%m-%d %H:%M:%S"));

    if !job.url.is_empty() {
        println!("  URL:         {}", job.url);
    }

    let metadata = &job.metadata;
    if let Some(title) = &metadata.title {
        println!("  Title:       {}", title);
    }
    if let Some(channel) = &metadata.channel_name {
        println!("  Channel:     {}", channel);
    }
    if let Some(duration) = metadata.duration {
        println!("  Duration:    {}", format_duration(duration));
    }

    if let Some(audio) = &job.audio_file {
        println!("  Audio:       {}", audio.dimmed());
    }
    if let Some(file) = &job.file {
        println!("  Transcript:  {}", file.dimmed());
    }

    if let Some(error) = &job.error {
        println!("\n{}", "Error:".bold());
        println!("{}", error.red());
    }
}

fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Colorize job status for display
fn colorize_status(status: JobStatus) -> colored::ColoredString {
    let label = status.as_str();
    match status {
        JobStatus::Queued => label.yellow(),
        JobStatus::FetchingInfo
        | JobStatus::Downloading
        | JobStatus::Transcribing
        | JobStatus::Saving => label.cyan(),
        JobStatus::Done => label.green(),
        JobStatus::Error => label.red(),
    }
}
