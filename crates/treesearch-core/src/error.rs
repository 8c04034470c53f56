//! Error handling for CoNLL-U decoding and tree construction.
//!
//! Follows the same shape the rest of the workspace uses: named
//! `thiserror` variants, an optional boxed `#[source]`, and small
//! constructor functions instead of bare tuple variants.

use thiserror::Error;

/// Result type for decode/tree-build operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors raised while turning bytes into sentences and trees.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// A file could not be opened or read.
    #[error("I/O error reading {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A token line did not have the expected ten tab-separated columns.
    #[error("malformed token line in sentence {sent_id}: {reason}")]
    MalformedSentence { sent_id: String, reason: String },

    /// The sentence failed a structural invariant (bad head, no root, cycle).
    #[error("structurally invalid sentence {sent_id}: {reason}")]
    InvalidStructure { sent_id: String, reason: String },
}

impl DecodeError {
    pub fn io<S: Into<String>>(path: S, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed<S: Into<String>, R: Into<String>>(sent_id: S, reason: R) -> Self {
        Self::MalformedSentence {
            sent_id: sent_id.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_structure<S: Into<String>, R: Into<String>>(sent_id: S, reason: R) -> Self {
        Self::InvalidStructure {
            sent_id: sent_id.into(),
            reason: reason.into(),
        }
    }
}
