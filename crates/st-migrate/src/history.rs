//! Verification of the applied history against the definitions.

use crate::error::{RunnerError, RunnerResult};
use st_core::{MigrationDefinition, MigrationRecord};

/// Check that `applied` is a prefix of `definitions`, in order and with
/// unchanged checksums. Returns the number of applied definitions.
pub fn verify_history(
    definitions: &[MigrationDefinition],
    applied: &[MigrationRecord],
) -> RunnerResult<usize> {
    for (index, record) in applied.iter().enumerate() {
        let Some(definition) = definitions.get(index) else {
            return Err(RunnerError::HistoryDiverged {
                position: index + 1,
                expected: "no further migrations".to_string(),
                found: record.id.clone(),
            });
        };
        if definition.id != record.id {
            return Err(RunnerError::HistoryDiverged {
                position: index + 1,
                expected: definition.id.to_string(),
                found: record.id.clone(),
            });
        }
        if definition.checksum != record.checksum {
            return Err(RunnerError::ChecksumMismatch {
                id: record.id.clone(),
                recorded: record.checksum.clone(),
                current: definition.checksum.clone(),
            });
        }
    }
    Ok(applied.len())
}
