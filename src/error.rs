//! Error taxonomy for the fetch/score/persist pipeline.
//!
//! Only [`StoreError`] can escape a cycle; every other class is recovered
//! where it happens (empty source, dropped item, score of zero).

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure to obtain or parse one feed source.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("non-success status {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("invalid feed url: {0}")]
    InvalidUrl(String),
}

/// Failure to obtain a usable score for one item.
#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("scoring request failed: {0}")]
    Request(String),

    #[error("scoring request timed out after {0:?}")]
    Timeout(Duration),

    #[error("scorer returned non-integer output: {0:?}")]
    InvalidOutput(String),

    #[error("score {0} is outside 0-100")]
    OutOfRange(i64),
}

/// Failure at the persistence boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Anything that aborts a cycle. The database is untouched when this is returned.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("failed to load snapshot: {0}")]
    Load(#[source] StoreError),

    #[error("failed to persist snapshot: {0}")]
    Persist(#[source] StoreError),
}
