use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by index construction and query-time loading.
///
/// Build-time structural errors are fatal: nothing is persisted for a corpus
/// that fails to load. Query-time edge cases (unknown term, empty query,
/// zero-norm vector) are not errors and resolve to empty results instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("inverted index not found at {}; run `indexer index` first", path.display())]
    MissingIndex { path: PathBuf },

    #[error("statistics tables not found at {}; run `indexer stats` first", path.display())]
    MissingStats { path: PathBuf },

    #[error("cannot extract a document id from file name {name:?}")]
    MalformedFilename { name: String },

    #[error("{file}:{line}: malformed row: {reason}")]
    ParseRow {
        file: String,
        line: usize,
        reason: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
