use std::path::PathBuf;

use thiserror::Error;

/// Failures of the conversation store. None of them are fatal to the process.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable at {path}: {reason}")]
    Unavailable { path: PathBuf, reason: String },

    #[error("store query failed: {0}")]
    Query(String),
}

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("failed to create history directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to append to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}
