//! Scribe HTTP Client
//!
//! A simple, type-safe HTTP client for the Scribe transcription server API.
//!
//! # Example
//!
//! ```no_run
//! use scribe_client::ScribeClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ScribeClient::new("http://localhost:8081");
//!
//!     let job = client
//!         .submit_job("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
//!         .await?;
//!
//!     println!("Submitted job: {}", job.id);
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use jobs::WaitOptions;

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the Scribe server API
#[derive(Debug, Clone)]
pub struct ScribeClient {
    /// Base URL of the server (e.g., "http://localhost:8081")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl ScribeClient {
    /// Create a new client
    ///
    /// # Example
    /// ```
    /// use scribe_client::ScribeClient;
    ///
    /// let client = ScribeClient::new("http://localhost:8081");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a server path such as `/files/<id>.txt` against the base URL
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Check that the server is up
    pub async fn health(&self) -> Result<()> {
        let response = self.client.get(self.url_for("/health")).send().await?;
        self.handle_text_response(response).await.map(|_| ())
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response with a plain-text body
    async fn handle_text_response(&self, response: reqwest::Response) -> Result<String> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ScribeClient::new("http://localhost:8081");
        assert_eq!(client.base_url(), "http://localhost:8081");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = ScribeClient::new("http://localhost:8081/");
        assert_eq!(client.base_url(), "http://localhost:8081");
    }

    #[test]
    fn test_client_with_custom_client() {
        let http_client = Client::new();
        let client = ScribeClient::with_client("http://localhost:8081", http_client);
        assert_eq!(client.base_url(), "http://localhost:8081");
    }

    #[test]
    fn test_url_for() {
        let client = ScribeClient::new("http://scribe.local:8081/");
        assert_eq!(
            client.url_for("/files/abc.txt"),
            "http://scribe.local:8081/files/abc.txt"
        );
        assert_eq!(client.url_for("jobs/active"), "http://scribe.local:8081/jobs/active");
    }
}
