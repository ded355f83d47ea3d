//! Typed failures for a listing run.
//!
//! Configuration and render failures abort the run. File access failures only
//! exclude the offending file. Summary service failures are retried when
//! transient and otherwise fall back to the rule-based summary, so they never
//! reach the user as an error.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("failed to read {}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render PDF: {0}")]
    Render(String),
}

impl Error {
    pub fn configuration<S: Into<String>>(message: S) -> Error {
        Error::Configuration(message.into())
    }

    pub fn render<S: Into<String>>(message: S) -> Error {
        Error::Render(message.into())
    }
}

/// Failures talking to the external summary service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SummaryServiceError {
    #[error("no API key configured (set `ai.api_key` or the {0} environment variable)")]
    MissingApiKey(String),

    #[error("summary service is overloaded ({0})")]
    Overloaded(u16),

    #[error("summary service rate limit exceeded")]
    RateLimited,

    #[error("summary service returned server error {0}")]
    Server(u16),

    #[error("summary service rejected the credentials ({0})")]
    Auth(u16),

    #[error("summary service rejected the request ({status}): {message}")]
    Request { status: u16, message: String },

    #[error("summary service request failed: {0}")]
    Transport(String),

    #[error("summary service returned an unusable response: {0}")]
    MalformedResponse(String),
}

impl SummaryServiceError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SummaryServiceError::Overloaded(_)
                | SummaryServiceError::RateLimited
                | SummaryServiceError::Server(_)
                | SummaryServiceError::Transport(_)
        )
    }

    /// Maps an HTTP error status from the service onto the taxonomy.
    pub fn from_status(status: u16, message: String) -> SummaryServiceError {
        match status {
            529 | 503 => SummaryServiceError::Overloaded(status),
            429 => SummaryServiceError::RateLimited,
            401 | 403 => SummaryServiceError::Auth(status),
            500..=599 => SummaryServiceError::Server(status),
            _ => SummaryServiceError::Request { status, message },
        }
    }
}
