//! Error types for the streaming client

use thiserror::Error;

/// Streaming client error types
#[derive(Error, Debug)]
pub enum StreamError {
    /// Non-success HTTP status from the agent endpoint
    #[error("{message}")]
    Request {
        status: u16,
        message: String,
        retry_after_secs: Option<u64>,
    },

    /// Response body missing or unreadable
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A single frame failed to parse. Never surfaced to callers.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error chunk sent by the agent mid-stream
    #[error("{0}")]
    Agent(String),

    /// Session configuration rejected before any request was made
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Connection or read failure
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StreamError {
    /// Whether resending the same message has a reasonable chance to succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            StreamError::Request { status, .. } => *status == 429 || *status >= 500,
            StreamError::Transport(_) => true,
            StreamError::Http(err) => err.is_timeout() || err.is_connect() || err.is_body(),
            _ => false,
        }
    }

    /// HTTP status for request errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            StreamError::Request { status, .. } => Some(*status),
            StreamError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for streaming operations
pub type Result<T> = std::result::Result<T, StreamError>;
