//! Error types for the TAPIR client.

use thiserror::Error;

/// Errors surfaced through the raised-failure channel (uploads, downloads,
/// reads, queries, timeline) and by configuration and CLI plumbing.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status; `body` is the server's response text.
    #[error("Server returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),

    #[error("Invalid node id: {0}")]
    InvalidNodeId(String),

    /// An optional-channel operation came back empty (CLI reporting only).
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}
