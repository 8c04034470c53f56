//! Query DSL lexer, parser, compiler, and dependency-tree matcher.
//!
//! This crate turns query text into a reusable [`Pattern`] and runs
//! that pattern against a [`treesearch_core::Tree`] to stream variable
//! bindings.

pub mod ast;
pub mod compiler;
pub mod error;
pub mod lexer;
pub mod matcher;
pub mod parser;
pub mod pattern;

pub use error::{QueryError, QueryResult};
pub use matcher::{find_matches, has_match};
pub use pattern::{Binding, Pattern};

/// Parses and compiles `text` into a reusable [`Pattern`], the single
/// entry point embedders use to go from query text to a runnable query.
pub fn compile_query(text: &str) -> QueryResult<Pattern> {
    let query = parser::parse(text)?;
    compiler::compile(&query)
}
