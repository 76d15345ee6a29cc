// Error types for the portfolio crate.
// Covers argument validation, GitHub API status codes, transport, decoding and IO failures.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Authentication failed: invalid or expired token")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Rate limit exceeded, resets at {}", format_reset(.reset_at))]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    #[error("GitHub API error: HTTP {status} {status_text}")]
    Provider { status: u16, status_text: String },

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PortfolioError {
    /// Whether this error represents a missing remote resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortfolioError::NotFound(_))
    }

    /// Whether this error represents an exhausted rate limit.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, PortfolioError::RateLimited { .. })
    }
}

fn format_reset(reset_at: &Option<DateTime<Utc>>) -> String {
    reset_at
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub type Result<T> = std::result::Result<T, PortfolioError>;
