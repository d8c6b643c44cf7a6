//! Per-migration lifecycle.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Where a migration is in its lifecycle.
///
/// ```text
/// Pending -> Applying -> Applied
///                     -> Failed
/// ```
///
/// `Applied` and `Failed` are terminal within a run. A failed migration is
/// `Pending` again on the next run because its unit of work was rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationState {
    Pending,
    Applying,
    Applied,
    Failed,
}

/// Rejected state change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid migration state transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: MigrationState,
    pub to: MigrationState,
}

impl MigrationState {
    /// Move to `to`, or reject the change.
    pub fn transition(self, to: MigrationState) -> Result<MigrationState, InvalidTransition> {
        use MigrationState::*;
        match (self, to) {
            (Pending, Applying) | (Applying, Applied) | (Applying, Failed) => Ok(to),
            (from, to) => Err(InvalidTransition { from, to }),
        }
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MigrationState::Pending => "pending",
            MigrationState::Applying => "applying",
            MigrationState::Applied => "applied",
            MigrationState::Failed => "failed",
        };
        f.write_str(s)
    }
}
