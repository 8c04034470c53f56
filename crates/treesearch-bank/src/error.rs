//! Treebank-level errors: file I/O and fanout cancellation.

use std::path::PathBuf;

use thiserror::Error;
use treesearch_core::DecodeError;

pub type BankResult<T> = Result<T, BankError>;

#[derive(Error, Debug)]
pub enum BankError {
    #[error("failed to open treebank source {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid glob pattern {pattern:?}: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("unordered fanout cancelled after first error")]
    Cancelled,
}

impl BankError {
    pub fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    pub fn glob(pattern: impl Into<String>, source: glob::PatternError) -> Self {
        Self::Glob {
            pattern: pattern.into(),
            source,
        }
    }
}
