//! Error types for sensordash.
//!
//! The core degrades to a stale display rather than failing, so this set is
//! small: boundary parsing errors and the ways a push source can fail to open.

use thiserror::Error;

/// Result type alias for sensordash operations.
pub type Result<T> = std::result::Result<T, DashError>;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("unknown metric '{0}' (expected one of: temp, humidity, pressure, x, y, z, altitude)")]
    UnknownMetric(String),

    #[error("failed to subscribe to {source_name}: {reason}")]
    Subscribe { source_name: String, reason: String },

    #[error("invalid listen address '{addr}': {reason}")]
    InvalidAddress { addr: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DashError {
    /// Shorthand for a subscription failure tagged with the source name.
    pub fn subscribe(source_name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Subscribe {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}
