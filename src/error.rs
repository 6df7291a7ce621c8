use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the engagement pipeline and its data loaders.
///
/// Only `InputUnavailable` and the loader parse errors are fatal; scoring
/// backend failures and malformed dates are absorbed at the stage boundary
/// and reported through the aggregate instead.
#[derive(Error, Debug)]
pub enum Error {
    /// The raw record source could not be opened or read.
    #[error("input source unavailable: {path}: {source}")]
    InputUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record is structurally unusable (missing or duplicate id).
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
