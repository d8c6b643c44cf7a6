//! Live schema inspection through DuckDB's catalog.
//!
//! Columns come from `information_schema.columns`; primary key and unique
//! constraints from `duckdb_constraints()`. Type and default strings are
//! parsed back into the same [`ColumnType`] / [`DefaultValue`] model the
//! migration parser produces.
//!
//! [`ColumnType`]: st_core::ColumnType
//! [`DefaultValue`]: st_core::DefaultValue

use crate::error::{DbError, DbResult};
use duckdb::Connection;
use st_core::{ColumnSpec, TableSchema};
use st_sql::{parse_default_expr, parse_type_name, DefaultExpr};

/// Check if a table exists in the main schema. Names match
/// case-insensitively, as DuckDB resolves identifiers.
pub(crate) fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM information_schema.tables
             WHERE table_schema = 'main' AND lower(table_name) = lower(?)
               AND table_type = 'BASE TABLE'",
            duckdb::params![table],
            |row| row.get(0),
        )
        .map_err(DbError::store)?;
    Ok(count > 0)
}

pub(crate) fn list_tables(conn: &Connection) -> DbResult<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT table_name FROM information_schema.tables
             WHERE table_schema = 'main' AND table_type = 'BASE TABLE'
             ORDER BY table_name",
        )
        .map_err(DbError::store)?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(DbError::store)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DbError::store)?;
    Ok(names)
}

struct ColumnRow {
    name: String,
    data_type: String,
    is_nullable: String,
    default: Option<String>,
}

struct ConstraintRow {
    constraint_type: String,
    width: i64,
    column: String,
}

/// Read the live definition of `table`. `None` when the table does not exist.
pub(crate) fn inspect_table(conn: &Connection, table: &str) -> DbResult<Option<TableSchema>> {
    if !table_exists(conn, table)? {
        return Ok(None);
    }

    let mut stmt = conn
        .prepare(
            "SELECT column_name, data_type, is_nullable, column_default
             FROM information_schema.columns
             WHERE table_schema = 'main' AND lower(table_name) = lower(?)
             ORDER BY ordinal_position",
        )
        .map_err(DbError::store)?;
    let column_rows = stmt
        .query_map(duckdb::params![table], |row| {
            Ok(ColumnRow {
                name: row.get(0)?,
                data_type: row.get(1)?,
                is_nullable: row.get(2)?,
                default: row.get(3)?,
            })
        })
        .map_err(DbError::store)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DbError::store)?;

    // One row per constrained column; `width` tells single-column UNIQUE
    // constraints apart from composite ones.
    let mut stmt = conn
        .prepare(
            "SELECT constraint_type,
                    CAST(len(constraint_column_names) AS BIGINT) AS width,
                    unnest(constraint_column_names) AS column_name
             FROM duckdb_constraints()
             WHERE schema_name = 'main' AND lower(table_name) = lower(?)
               AND constraint_type IN ('PRIMARY KEY', 'UNIQUE')
             ORDER BY constraint_index",
        )
        .map_err(DbError::store)?;
    let constraint_rows = stmt
        .query_map(duckdb::params![table], |row| {
            Ok(ConstraintRow {
                constraint_type: row.get(0)?,
                width: row.get(1)?,
                column: row.get(2)?,
            })
        })
        .map_err(DbError::store)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DbError::store)?;

    let mut columns: Vec<ColumnSpec> = column_rows.into_iter().map(column_from_row).collect();

    let mut primary_key = Vec::new();
    for row in constraint_rows {
        match row.constraint_type.as_str() {
            "PRIMARY KEY" => {
                if !primary_key.contains(&row.column) {
                    primary_key.push(row.column);
                }
            }
            "UNIQUE" if row.width == 1 => {
                if let Some(col) = columns.iter_mut().find(|c| c.name == row.column) {
                    col.unique = true;
                }
            }
            _ => log::debug!(
                "Ignoring {}-column {} constraint on {table}",
                row.width,
                row.constraint_type
            ),
        }
    }

    TableSchema::new(table, columns, primary_key)
        .map(Some)
        .map_err(|e| DbError::Inspection {
            table: table.to_string(),
            message: e.to_string(),
        })
}

fn column_from_row(row: ColumnRow) -> ColumnSpec {
    let mut column = ColumnSpec::new(row.name, parse_type_name(&row.data_type));
    column.nullable = row.is_nullable.eq_ignore_ascii_case("YES");
    match parse_default_expr(row.default.as_deref()) {
        DefaultExpr::None => {}
        DefaultExpr::Value(value) => column.default = Some(value),
        DefaultExpr::Sequence(sequence) => {
            log::debug!("Column {} draws from sequence {sequence}", column.name);
            column.auto_increment = true;
        }
    }
    column
}

#[cfg(test)]
#[path = "inspect_test.rs"]
mod tests;
