//! Error types shared across the crate.
//!
//! Only two kinds of failure ever leave a module boundary: a text service
//! misbehaving (always recovered by a deterministic fallback) and a dataset
//! that cannot be loaded or lacks the canonical columns.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure of an external text service (area resolution or summary).
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No endpoint or credential was configured.
    #[error("text service is not configured")]
    NotConfigured,

    #[error("request timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("failed to reach text service: {0}")]
    Transport(String),

    #[error("text service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The reply was not structured data of the expected shape.
    #[error("could not parse service reply: {0}")]
    Parse(String),

    #[error("text service returned an empty reply")]
    EmptyResponse,

    /// Nothing worth sending: no area had usable grouped data.
    #[error("no usable statistics to summarize")]
    NothingToSummarize,
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ServiceError::Parse(e.to_string())
        } else {
            ServiceError::Transport(e.to_string())
        }
    }
}

/// Failure to turn a file into a normalized [`crate::models::Dataset`].
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read spreadsheet: {0}")]
    Excel(String),

    #[error("spreadsheet contains no worksheet")]
    NoWorksheet,

    #[error("unsupported dataset format: {0}")]
    UnsupportedFormat(String),

    /// Schema check failed after header mapping.
    #[error(
        "missing required columns after header mapping: {} (available: {})",
        missing.join(", "),
        available.join(", ")
    )]
    MissingColumns {
        missing: Vec<String>,
        available: Vec<String>,
    },
}
