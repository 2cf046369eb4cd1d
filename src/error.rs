use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("document host unavailable: {0}")]
    HostUnavailable(String),

    #[error("cannot open document {path:?}: {reason}")]
    DocumentOpen { path: PathBuf, reason: String },

    #[error("cannot read cell ({table}, {row}, {column}): {reason}")]
    CellRead {
        table: usize,
        row: usize,
        column: usize,
        reason: String,
    },

    #[error("document host query failed: {0}")]
    HostQuery(String),

    #[error("table artifact {path:?}: {source}")]
    StoreIo {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid indicator specification: {0}")]
    InvalidSpec(String),

    #[error("invalid period {0:?}, expected YYYY-MM")]
    InvalidDate(String),

    #[error("label {label:?} matches {matches} rows")]
    AmbiguousLabel { label: String, matches: usize },

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
