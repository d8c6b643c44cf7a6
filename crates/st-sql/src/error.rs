//! Error types for st-sql

use thiserror::Error;

/// DDL parsing errors
#[derive(Error, Debug)]
pub enum SqlError {
    /// SQL could not be tokenized (S001)
    #[error("[S001] SQL tokenize error at line {line}, column {column}: {message}")]
    Tokenize {
        message: String,
        line: usize,
        column: usize,
    },

    /// DDL grammar error (S002)
    #[error("[S002] DDL parse error in statement {statement}: {message}")]
    Parse { statement: usize, message: String },

    /// Empty SQL (S003)
    #[error("[S003] SQL is empty")]
    EmptySql,

    /// Statement kind outside the supported DDL subset (S004)
    #[error("[S004] Unsupported statement in statement {statement}: {found}")]
    UnsupportedStatement { statement: usize, found: String },

    /// Unknown dialect name (S005)
    #[error("[S005] Unknown SQL dialect: {0}")]
    UnknownDialect(String),

    /// Operation has no rendering on the target (S006)
    #[error("[S006] Cannot render '{operation}' for the target: {reason}")]
    Unrenderable { operation: String, reason: String },
}

/// Result type alias for SqlError
pub type SqlResult<T> = Result<T, SqlError>;
