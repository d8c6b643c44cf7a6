//! Error types for st-migrate

use st_core::MigrationId;
use st_db::DbError;
use std::time::Duration;
use thiserror::Error;

/// Migration loading errors
#[derive(Error, Debug)]
pub enum LoadError {
    /// A migration file cannot be turned into a definition (L001)
    #[error("[L001] Malformed migration '{id}': {reason}")]
    Malformed { id: String, reason: String },

    /// Two migrations share an identifier (L002)
    #[error("[L002] Duplicate migration identifier '{id}'")]
    DuplicateIdentifier { id: MigrationId },

    /// Migration source could not be read (L003)
    #[error("[L003] Failed to read migrations from '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Drift detection errors
#[derive(Error, Debug)]
pub enum DriftError {
    /// The table is not present on the target (F001)
    #[error("[F001] Table '{0}' does not exist on the target")]
    TableNotFound(String),

    /// The target could not be inspected (F002)
    #[error("[F002] Schema inspection failed: {0}")]
    Store(#[from] DbError),
}

/// Migration runner errors
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The migration set failed to load; nothing was run (R001)
    #[error("[R001] {0}")]
    Malformed(#[from] LoadError),

    /// A migration's DDL failed; its unit of work was rolled back (R002)
    #[error("[R002] Migration '{id}' failed: {source}")]
    Execution {
        id: MigrationId,
        #[source]
        source: DbError,
    },

    /// The record store was unreachable (R003)
    #[error("[R003] Migration record store unavailable{}: {source}", fmt_during(.id))]
    StoreUnavailable {
        id: Option<MigrationId>,
        #[source]
        source: DbError,
    },

    /// A migration exceeded the statement timeout and was rolled back (R004)
    #[error("[R004] Migration '{id}' timed out after {}s and was rolled back", .timeout.as_secs_f64())]
    Timeout { id: MigrationId, timeout: Duration },

    /// The migration was already recorded when its unit of work started (R005)
    #[error("[R005] Migration '{id}' is already recorded as applied")]
    DuplicateRecord { id: MigrationId },

    /// Another runner holds the migration lock (R006)
    #[error("[R006] Migration lock is held by '{holder}'; run `st unlock` if it is stale")]
    LockHeld { holder: String },

    /// The run was cancelled before starting `next` (R007)
    #[error("[R007] Run cancelled before migration '{next}'")]
    Cancelled { next: MigrationId },

    /// Applied history is not a prefix of the definitions (R008)
    #[error("[R008] Applied history diverges at position {position}: expected '{expected}', found '{found}'")]
    HistoryDiverged {
        position: usize,
        expected: String,
        found: MigrationId,
    },

    /// An applied migration's source changed since it was applied (R009)
    #[error("[R009] Migration '{id}' was modified after being applied (recorded checksum {recorded}, current {current})")]
    ChecksumMismatch {
        id: MigrationId,
        recorded: String,
        current: String,
    },

    /// The blocking worker panicked or was cancelled (R010)
    #[error("[R010] Migration worker failed: {0}")]
    Worker(String),

    /// A migration state change that the lifecycle does not allow (R011)
    #[error("[R011] {0}")]
    InvalidTransition(#[from] crate::state::InvalidTransition),
}

/// Result type alias for RunnerError
pub type RunnerResult<T> = Result<T, RunnerError>;

fn fmt_during(id: &Option<MigrationId>) -> String {
    match id {
        Some(id) => format!(" during '{id}'"),
        None => String::new(),
    }
}

impl RunnerError {
    /// Classify a target error raised while applying `id`.
    pub(crate) fn from_db(id: &MigrationId, err: DbError) -> Self {
        match err {
            DbError::StoreUnavailable(_) => RunnerError::StoreUnavailable {
                id: Some(id.clone()),
                source: err,
            },
            DbError::DuplicateRecord { .. } => RunnerError::DuplicateRecord { id: id.clone() },
            DbError::LockHeld { holder } => RunnerError::LockHeld { holder },
            err => RunnerError::Execution {
                id: id.clone(),
                source: err,
            },
        }
    }

    /// Classify a target error raised outside any migration.
    pub(crate) fn from_store(err: DbError) -> Self {
        match err {
            DbError::LockHeld { holder } => RunnerError::LockHeld { holder },
            err => RunnerError::StoreUnavailable {
                id: None,
                source: err,
            },
        }
    }

    /// The migration the run stopped at, if the error is tied to one.
    pub fn failed_migration(&self) -> Option<&MigrationId> {
        match self {
            RunnerError::Execution { id, .. }
            | RunnerError::Timeout { id, .. }
            | RunnerError::DuplicateRecord { id }
            | RunnerError::ChecksumMismatch { id, .. } => Some(id),
            RunnerError::StoreUnavailable { id, .. } => id.as_ref(),
            RunnerError::Cancelled { next } => Some(next),
            RunnerError::HistoryDiverged { found, .. } => Some(found),
            RunnerError::Malformed(_)
            | RunnerError::LockHeld { .. }
            | RunnerError::Worker(_)
            | RunnerError::InvalidTransition(_) => None,
        }
    }

    /// Whether re-running later may succeed without changing the migrations.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RunnerError::StoreUnavailable { .. }
                | RunnerError::Timeout { .. }
                | RunnerError::LockHeld { .. }
                | RunnerError::Cancelled { .. }
        )
    }
}
