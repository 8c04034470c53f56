//! Ordered and unordered treebank fanout over many CoNLL-U sources,
//! including transparent gzip decompression and glob path expansion.
//!
//! This crate owns the byte source, the ordered single-threaded walk,
//! and the bounded parallel worker pool for unordered mode.

pub mod error;
pub mod source;
pub mod treebank;

pub use error::{BankError, BankResult};
pub use treebank::{Options, Treebank};
