//! Configuration module
//!
//! Handles CLI configuration including the server URL and polling settings.

use std::time::Duration;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the Scribe server
    pub server_url: String,

    /// Delay between status checks while waiting on a job
    pub poll_interval: Duration,
}
