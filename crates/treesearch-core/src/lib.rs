//! CoNLL-U parsing and indexed dependency trees.
//!
//! This crate turns raw CoNLL-U bytes into an indexed, immutable
//! [`Tree`] with O(1) word/children lookups.

pub mod decoder;
pub mod error;
pub mod tree;
pub mod word;

pub use decoder::Decoder;
pub use error::{DecodeError, DecodeResult};
pub use tree::Tree;
pub use word::{AttrMap, Word, WordRef};

/// Decode every sentence in `text` (already split by the caller into
/// whatever byte source it came from) into a sequence of trees.
/// Malformed sentences are quarantined individually; only I/O-shaped
/// failures from the line iterator abort the whole stream.
pub fn decode_str(text: &str) -> impl Iterator<Item = DecodeResult<Tree>> + '_ {
    let lines = text.lines().map(|l| Ok::<_, std::io::Error>(l.to_string()));
    Decoder::new(lines)
}
