//! Error types for st-db

use thiserror::Error;

/// Target database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// The tracking store could not be reached or queried (D001)
    #[error("[D001] Migration record store unavailable: {0}")]
    StoreUnavailable(String),

    /// A DDL statement failed on the target (D002)
    #[error("[D002] SQL execution failed: {message}: {sql}")]
    Execution { sql: String, message: String },

    /// A record for this identifier already exists (D003)
    #[error("[D003] Migration '{id}' is already recorded as applied")]
    DuplicateRecord { id: String },

    /// Another runner holds the migration lock (D004)
    #[error("[D004] Migration lock is held by '{holder}'")]
    LockHeld { holder: String },

    /// The unit of work was abandoned after a timeout and rolled back (D005)
    #[error("[D005] Unit of work abandoned after timeout; changes rolled back")]
    Abandoned,

    /// A tracking row could not be decoded (D006)
    #[error("[D006] Corrupt migration record '{id}': {message}")]
    CorruptRecord { id: String, message: String },

    /// The live schema could not be represented (D007)
    #[error("[D007] Failed to inspect table '{table}': {message}")]
    Inspection { table: String, message: String },

    /// An operation has no DuckDB rendering (D008)
    #[error("[D008] {0}")]
    Render(#[from] st_sql::SqlError),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    pub(crate) fn store(err: impl std::fmt::Display) -> Self {
        DbError::StoreUnavailable(err.to_string())
    }

    pub(crate) fn execution(sql: &str, err: impl std::fmt::Display) -> Self {
        DbError::Execution {
            sql: sql.to_string(),
            message: err.to_string(),
        }
    }
}
