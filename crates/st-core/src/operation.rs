//! Typed DDL operations a migration is made of.

use crate::column::ColumnSpec;
use crate::schema::TableSchema;
use serde::Serialize;
use std::fmt;

/// One schema change. A migration's statement is an ordered list of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DdlOperation {
    /// `CREATE TABLE [IF NOT EXISTS]`
    CreateTable {
        table: TableSchema,
        if_not_exists: bool,
    },
    /// `ALTER TABLE t ADD COLUMN [IF NOT EXISTS]`
    AddColumn {
        table: String,
        column: ColumnSpec,
        if_not_exists: bool,
    },
    /// `ALTER TABLE t DROP COLUMN [IF EXISTS]`
    DropColumn {
        table: String,
        column: String,
        if_exists: bool,
    },
    /// `DROP TABLE [IF EXISTS]`
    DropTable { table: String, if_exists: bool },
}

impl DdlOperation {
    /// Name of the table this operation touches.
    pub fn table_name(&self) -> &str {
        match self {
            DdlOperation::CreateTable { table, .. } => table.name(),
            DdlOperation::AddColumn { table, .. }
            | DdlOperation::DropColumn { table, .. }
            | DdlOperation::DropTable { table, .. } => table,
        }
    }

    /// Whether the operation carries its idempotency marker
    /// (`IF NOT EXISTS` / `IF EXISTS`).
    pub fn is_idempotent(&self) -> bool {
        match self {
            DdlOperation::CreateTable { if_not_exists, .. }
            | DdlOperation::AddColumn { if_not_exists, .. } => *if_not_exists,
            DdlOperation::DropColumn { if_exists, .. }
            | DdlOperation::DropTable { if_exists, .. } => *if_exists,
        }
    }
}

impl fmt::Display for DdlOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DdlOperation::CreateTable {
                table,
                if_not_exists,
            } => {
                let guard = if *if_not_exists { "IF NOT EXISTS " } else { "" };
                write!(
                    f,
                    "CREATE TABLE {guard}{} ({} columns)",
                    table.name(),
                    table.columns().len()
                )
            }
            DdlOperation::AddColumn {
                table,
                column,
                if_not_exists,
            } => {
                let guard = if *if_not_exists { "IF NOT EXISTS " } else { "" };
                write!(f, "ALTER TABLE {table} ADD COLUMN {guard}{column}")
            }
            DdlOperation::DropColumn {
                table,
                column,
                if_exists,
            } => {
                let guard = if *if_exists { "IF EXISTS " } else { "" };
                write!(f, "ALTER TABLE {table} DROP COLUMN {guard}{column}")
            }
            DdlOperation::DropTable { table, if_exists } => {
                let guard = if *if_exists { "IF EXISTS " } else { "" };
                write!(f, "DROP TABLE {guard}{table}")
            }
        }
    }
}
