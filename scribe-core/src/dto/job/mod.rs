//! Job DTOs

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::source::SourceAllowlist;

/// Request to submit a new transcription job
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitJob {
    #[serde(default)]
    pub url: String,
}

impl SubmitJob {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Checks the request and returns the URL to process
    pub fn validate(&self, allowlist: &SourceAllowlist) -> Result<&str, SubmitError> {
        if self.url.trim().is_empty() {
            return Err(SubmitError::MissingUrl);
        }

        if !allowlist.is_allowed(&self.url) {
            return Err(SubmitError::UnsupportedSource);
        }

        Ok(&self.url)
    }
}

/// Reasons a submission is rejected before any job exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    MissingUrl,
    UnsupportedSource,
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::MissingUrl => f.write_str("URL is required"),
            SubmitError::UnsupportedSource => f.write_str("Invalid YouTube URL"),
        }
    }
}

impl std::error::Error for SubmitError {}

/// Error body returned by the API for any non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_known_host() {
        let req = SubmitJob::new("https://youtu.be/abc123");
        assert_eq!(
            req.validate(&SourceAllowlist::default()),
            Ok("https://youtu.be/abc123")
        );
    }

    #[test]
    fn test_validate_rejects_empty_and_blank() {
        let allowlist = SourceAllowlist::default();
        assert_eq!(
            SubmitJob::new("").validate(&allowlist),
            Err(SubmitError::MissingUrl)
        );
        assert_eq!(
            SubmitJob::new("   ").validate(&allowlist),
            Err(SubmitError::MissingUrl)
        );
    }

    #[test]
    fn test_validate_rejects_unknown_host() {
        let err = SubmitJob::new("https://example.com/video")
            .validate(&SourceAllowlist::default())
            .unwrap_err();
        assert_eq!(err, SubmitError::UnsupportedSource);
        assert_eq!(err.to_string(), "Invalid YouTube URL");
    }

    #[test]
    fn test_missing_url_field_deserializes_to_empty() {
        let req: SubmitJob = serde_json::from_str("{}").unwrap();
        assert!(req.url.is_empty());
    }
}
