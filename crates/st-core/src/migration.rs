//! Migration definitions and applied-migration records.

use crate::checksum::compute_checksum;
use crate::migration_id::MigrationId;
use crate::operation::DdlOperation;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A loaded migration: its identifier, sort key, and parsed operations.
///
/// Built once by the loader and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationDefinition {
    /// Identifier (file stem)
    pub id: MigrationId,

    /// Stable sort key (numeric prefix of the identifier)
    pub sequence: u64,

    /// Operations in statement order
    pub operations: Vec<DdlOperation>,

    /// True when every operation carries `IF [NOT] EXISTS`
    pub is_idempotent: bool,

    /// SHA-256 of the source text
    pub checksum: String,

    /// Original source text
    #[serde(skip)]
    pub source: String,
}

impl MigrationDefinition {
    /// Build a definition, deriving the idempotency flag and checksum.
    pub fn new(
        id: MigrationId,
        sequence: u64,
        operations: Vec<DdlOperation>,
        source: impl Into<String>,
    ) -> Self {
        let source = source.into();
        let is_idempotent =
            !operations.is_empty() && operations.iter().all(|op| op.is_idempotent());
        Self {
            checksum: compute_checksum(&source),
            id,
            sequence,
            operations,
            is_idempotent,
            source,
        }
    }
}

/// A row of the migration tracking table. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationRecord {
    pub id: MigrationId,

    /// 1-based position in apply order
    pub sequence: u64,

    /// Checksum of the source that was applied
    pub checksum: String,

    pub applied_at: DateTime<Utc>,

    /// Wall-clock time spent applying the migration
    pub execution_ms: u64,
}

/// Values the runner supplies when recording an applied migration; the store
/// assigns the sequence and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub id: MigrationId,
    pub checksum: String,
    pub execution_ms: u64,
}

impl NewRecord {
    pub fn for_definition(definition: &MigrationDefinition, execution_ms: u64) -> Self {
        Self {
            id: definition.id.clone(),
            checksum: definition.checksum.clone(),
            execution_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{ColumnSpec, ColumnType};
    use crate::schema::TableSchema;

    fn add_column(table: &str, if_not_exists: bool) -> DdlOperation {
        DdlOperation::AddColumn {
            table: table.into(),
            column: ColumnSpec::new("c", ColumnType::Text),
            if_not_exists,
        }
    }

    #[test]
    fn test_idempotent_only_when_every_operation_is() {
        let all = MigrationDefinition::new(
            MigrationId::new("0001_a"),
            1,
            vec![add_column("t", true), add_column("u", true)],
            "",
        );
        assert!(all.is_idempotent);

        let mixed = MigrationDefinition::new(
            MigrationId::new("0002_b"),
            2,
            vec![add_column("t", true), add_column("u", false)],
            "",
        );
        assert!(!mixed.is_idempotent);
    }

    #[test]
    fn test_checksum_covers_source() {
        let table = TableSchema::new(
            "users",
            vec![ColumnSpec::new("id", ColumnType::Int).not_null()],
            vec!["id".into()],
        )
        .unwrap();
        let def = MigrationDefinition::new(
            MigrationId::new("0001_users"),
            1,
            vec![
                DdlOperation::CreateTable {
                    table,
                    if_not_exists: true,
                },
                add_column("users", true),
                add_column("audit", true),
            ],
            "-- source",
        );
        assert_eq!(def.checksum, compute_checksum("-- source"));
    }

    #[test]
    fn test_new_record_copies_checksum() {
        let def = MigrationDefinition::new(MigrationId::new("0001_a"), 1, vec![], "x");
        let record = NewRecord::for_definition(&def, 12);
        assert_eq!(record.id, def.id);
        assert_eq!(record.checksum, def.checksum);
        assert_eq!(record.execution_ms, 12);
    }
}
