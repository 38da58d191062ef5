//! ID resolver module
//!
//! Lets users type a short, unambiguous prefix instead of a full job UUID.
//! Prefixes are matched against the active list and the history list.

use anyhow::{Context, Result, anyhow};
use scribe_client::ScribeClient;
use uuid::Uuid;

/// Identifier that can be either a full UUID or an unambiguous prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdOrPrefix {
    Full(Uuid),
    Prefix(String),
}

impl IdOrPrefix {
    /// Attempts to parse as a full UUID first, otherwise treats input as a prefix
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        match Uuid::parse_str(input) {
            Ok(uuid) => IdOrPrefix::Full(uuid),
            Err(_) => IdOrPrefix::Prefix(input.to_lowercase()),
        }
    }
}

/// Resolve a job ID or prefix to a full UUID
///
/// A full UUID is returned as is. A prefix is looked up among the jobs the
/// server currently lists.
pub async fn resolve_job_id(client: &ScribeClient, input: &str) -> Result<Uuid> {
    let prefix = match IdOrPrefix::parse(input) {
        IdOrPrefix::Full(uuid) => return Ok(uuid),
        IdOrPrefix::Prefix(prefix) => prefix,
    };

    let active = client
        .list_active_jobs()
        .await
        .context("Failed to fetch active jobs for ID resolution")?;
    let history = client
        .list_job_history()
        .await
        .context("Failed to fetch job history for ID resolution")?;

    let known = active.iter().chain(history.iter()).map(|job| job.id);
    match_prefix(&prefix, known)
}

/// Picks the single id starting with `prefix`
fn match_prefix(prefix: &str, ids: impl IntoIterator<Item = Uuid>) -> Result<Uuid> {
    if prefix.is_empty() {
        return Err(anyhow!("Job ID cannot be empty"));
    }

    let mut matches: Vec<Uuid> = ids
        .into_iter()
        .filter(|id| id.to_string().starts_with(prefix))
        .collect();
    matches.sort();
    matches.dedup();

    match matches.as_slice() {
        [] => Err(anyhow!("No job found with ID starting with '{}'", prefix)),
        [id] => Ok(*id),
        _ => {
            let ids: Vec<String> = matches.iter().map(Uuid::to_string).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple jobs: {}",
                prefix,
                ids.join(", ")
            ))
        }
    }
}
