//! Error types for the notus-advisories crate.
//!
//! This module provides a comprehensive error type [`AdvisoryError`] that covers
//! all failure modes in the library, enabling proper error handling.

use std::io;
use std::path::PathBuf;

/// The main error type for all operations in this crate.
#[derive(Debug, thiserror::Error)]
pub enum AdvisoryError {
    /// Redis connection or operation failed.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A feed file could not be parsed as an advisory document.
    #[error("Malformed feed file '{path}': {message}")]
    MalformedFeed {
        /// Path of the offending file.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    /// Configuration error (missing or invalid values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error (feed directory scan, file reads).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Task join error (from spawned tasks).
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// A specialized Result type for advisory operations.
pub type Result<T> = std::result::Result<T, AdvisoryError>;

impl AdvisoryError {
    /// Create a new malformed-feed error.
    pub fn malformed_feed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedFeed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Redis(_))
    }
}
