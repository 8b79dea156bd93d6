// Error taxonomy for the export pipeline
// Every stage reports a typed failure the caller can match on

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A transaction date the feed emitted in a shape we do not recognise
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognised transaction date {input:?}")]
pub struct DateParseError {
    pub input: String,
}

/// Why a single raw record could not become a canonical `Transaction`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error(transparent)]
    Date(#[from] DateParseError),

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid amount {0:?}")]
    Amount(String),
}

#[derive(Error, Debug)]
pub enum ExportError {
    /// Record `index` (position in the feed) could not be normalized.
    /// The whole run is aborted before the ledger is touched.
    #[error("malformed transaction at position {index}: {source}")]
    MalformedTransaction {
        index: usize,
        #[source]
        source: NormalizeError,
    },

    /// The dedup ledger could not be created or opened
    #[error("ledger unavailable at {}: {source}", path.display())]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A query against an already open ledger failed
    #[error("ledger query failed: {0}")]
    Store(#[from] rusqlite::Error),

    /// The export file could not be created or written
    #[error("could not write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ExportError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: impl Into<io::Error>) -> Self {
        ExportError::Write {
            path: path.into(),
            source: source.into(),
        }
    }
}
