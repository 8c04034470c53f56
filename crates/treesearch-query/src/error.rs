//! Query compile-time errors: parse errors and semantic errors.

use thiserror::Error;

pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("query parse error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("unknown field `{0}`")]
    UnknownField(String),

    #[error("invalid regex `{pattern}`: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("MATCH block is required and must appear exactly once (found {0})")]
    MatchBlockCount(usize),
}

impl QueryError {
    pub fn syntax<S: Into<String>>(line: usize, column: usize, message: S) -> Self {
        Self::Syntax {
            line,
            column,
            message: message.into(),
        }
    }
}
