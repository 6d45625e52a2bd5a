//! Error types for the gap finder.
//!
//! Per-entry problems are never errors here: they are counted as
//! [`MalformedReason`](crate::services::normalizer::MalformedReason)s by the
//! normalizer. The types below cover what can actually stop a run.

use std::path::PathBuf;

/// Result type for run-level operations.
pub type GapResult<T> = Result<T, GapError>;

/// Run-level failure.
#[derive(Debug, thiserror::Error)]
pub enum GapError {
    /// Invalid or missing configuration. Raised before any fetch.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The source reported total failure and produced no entries at all.
    #[error("Source failed after {attempts} attempt(s): {reason}")]
    SourceFailed { attempts: u32, reason: String },

    /// The report could not be written.
    #[error("Failed to write report to {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("No court-gaps.toml found in standard locations")]
    NotFound,

    #[error("Invalid value for `{field}`: {message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error produced while parsing a `HH:MM` time of day.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid time of day `{input}`: expected HH:MM between 00:00 and 24:00")]
pub struct TimeParseError {
    pub input: String,
}

/// Failure inside a raw entry source.
///
/// Sources retry on their own; [`SourceError::is_retryable`] tells the retry
/// loop whether another attempt can help.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Feed returned HTTP status {0}")]
    Status(u16),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid source data: {0}")]
    InvalidData(String),

    #[error("No feed configured for court {0}")]
    NoFeed(String),
}

impl SourceError {
    /// Transport failures and 5xx/429 responses are transient; bad data and
    /// missing configuration are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::Request(_) => true,
            SourceError::Status(code) => *code == 429 || *code >= 500,
            SourceError::Io { .. } | SourceError::InvalidData(_) | SourceError::NoFeed(_) => false,
        }
    }
}
