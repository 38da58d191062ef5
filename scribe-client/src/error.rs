//! Error types for the Scribe client

use scribe_core::dto::job::ErrorBody;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the Scribe client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Gave up waiting for a job to finish
    #[error("Timed out waiting for job {0}")]
    Timeout(Uuid),
}

impl ClientError {
    /// Create an API error from status code and response body
    ///
    /// The server answers failures with `{"error": "..."}`; that message is
    /// used when present, the raw body otherwise.
    pub fn api_error(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|parsed| parsed.error)
            .unwrap_or(body);

        Self::ApiError { status, message }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_extracts_message() {
        let err = ClientError::api_error(400, r#"{"error":"Invalid YouTube URL"}"#);
        assert_eq!(
            err.to_string(),
            "API error (status 400): Invalid YouTube URL"
        );
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_api_error_keeps_raw_body() {
        let err = ClientError::api_error(502, "Bad Gateway");
        assert!(matches!(
            &err,
            ClientError::ApiError { status: 502, message } if message == "Bad Gateway"
        ));
        assert!(err.is_server_error());
    }

    #[test]
    fn test_is_not_found() {
        assert!(ClientError::api_error(404, r#"{"error":"Job not found"}"#).is_not_found());
        assert!(!ClientError::api_error(400, "nope").is_not_found());
        assert!(!ClientError::Timeout(Uuid::nil()).is_not_found());
    }
}
