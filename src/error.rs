//! Error types for MirrorSync
//!
//! One crate-wide error enum covering the reconciliation engine's failure
//! modes. Uses thiserror for ergonomic error handling.

use thiserror::Error;

/// Result type alias for MirrorSync operations
pub type Result<T> = std::result::Result<T, MirrorSyncError>;

/// Comprehensive error type for MirrorSync operations
#[derive(Error, Debug)]
pub enum MirrorSyncError {
    /// Configuration errors (missing/invalid settings, raised before any per-issue work)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input rejected before any work started (empty canonical id, malformed query)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Canonical-id resolution failures (search/auth errors with no safe partial answer)
    #[error("Resolver error: {0}")]
    Resolver(String),

    /// External tracker API errors (GraphQL errors, unexpected HTTP statuses)
    #[error("Integration error: {0}")]
    Integration(String),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Issue not found in the external tracker
    #[error("Issue not found: {0}")]
    IssueNotFound(String),

    /// Rate limited (with retry-after duration in seconds)
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Storage errors (corrupt or unexpected persisted values)
    #[error("Storage error: {0}")]
    Storage(String),

    /// SQLite database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),

    /// Anyhow errors (for more context)
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

impl MirrorSyncError {
    /// Short stable code for this error, recorded in per-issue sync errors.
    pub fn code(&self) -> &'static str {
        match self {
            MirrorSyncError::Config(_) => "config",
            MirrorSyncError::Validation(_) => "validation",
            MirrorSyncError::Resolver(_) => "resolver",
            MirrorSyncError::Integration(_) => "integration",
            MirrorSyncError::Auth(_) => "auth",
            MirrorSyncError::IssueNotFound(_) => "not_found",
            MirrorSyncError::RateLimited(_) => "rate_limited",
            MirrorSyncError::Io(_) => "io",
            MirrorSyncError::Json(_) => "json",
            MirrorSyncError::Yaml(_) => "yaml",
            MirrorSyncError::Storage(_) => "storage",
            MirrorSyncError::Database(_) => "database",
            MirrorSyncError::Http(_) => "http",
            MirrorSyncError::Other(_) => "other",
            MirrorSyncError::Anyhow(_) => "other",
        }
    }

    /// One-line message safe to persist: first line only, bounded length,
    /// no stack traces. Credential material never enters error messages
    /// upstream, so truncation is the only concern here.
    pub fn sanitized_message(&self) -> String {
        const MAX_LEN: usize = 200;
        let text = self.to_string();
        let line = text.lines().next().unwrap_or_default();
        if line.len() > MAX_LEN {
            let mut end = MAX_LEN;
            while !line.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &line[..end])
        } else {
            line.to_string()
        }
    }
}

impl crate::github::retry::RetryableError for MirrorSyncError {
    fn retry_decision(&self) -> crate::github::retry::RetryDecision {
        use crate::github::retry::RetryDecision;
        use std::time::Duration;

        match self {
            MirrorSyncError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    RetryDecision::Retry
                } else if let Some(status) = e.status() {
                    match status.as_u16() {
                        429 => RetryDecision::RetryAfter(Duration::from_secs(60)),
                        500..=599 => RetryDecision::Retry,
                        _ => RetryDecision::NoRetry,
                    }
                } else {
                    RetryDecision::Retry
                }
            }
            MirrorSyncError::RateLimited(secs) => {
                RetryDecision::RetryAfter(Duration::from_secs(*secs))
            }
            MirrorSyncError::Integration(msg) => {
                let msg = msg.to_lowercase();
                if msg.contains("rate limit") {
                    RetryDecision::RetryAfter(Duration::from_secs(60))
                } else if msg.contains("timeout") || msg.contains("connection") {
                    RetryDecision::Retry
                } else {
                    RetryDecision::NoRetry
                }
            }
            _ => RetryDecision::NoRetry,
        }
    }
}
