//! Convergent application of one migration inside a unit of work.

use crate::drift::{diff, SchemaDelta};
use st_core::{DdlOperation, MigrationDefinition, MigrationRecord, NewRecord};
use st_db::{DbError, DbResult, RecordStore, Session};
use st_sql::DuckDbRenderer;
use std::collections::HashSet;
use std::time::Instant;

/// What applying one migration did.
#[derive(Debug)]
pub(crate) struct ApplyOutcome {
    pub(crate) record: MigrationRecord,
    /// Drift found while reconciling existing tables, left unchanged
    pub(crate) warnings: Vec<String>,
}

/// Apply `definition` through `session` and record it.
///
/// The caller owns the transaction: any error returned here is rolled back
/// together with everything executed before it.
pub(crate) fn apply_definition(
    session: &Session<'_>,
    definition: &MigrationDefinition,
    started: Instant,
) -> DbResult<ApplyOutcome> {
    if session.has_applied(&definition.id)? {
        return Err(DbError::DuplicateRecord {
            id: definition.id.to_string(),
        });
    }
    if !definition.is_idempotent {
        preflight(session, definition)?;
    }

    let renderer = DuckDbRenderer::new();
    let mut warnings = Vec::new();
    for op in &definition.operations {
        apply_operation(session, &renderer, op, &mut warnings)?;
    }

    let execution_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let record = session.record_applied(&NewRecord::for_definition(definition, execution_ms))?;
    Ok(ApplyOutcome { record, warnings })
}

/// Refuse to start a non-idempotent migration whose unguarded creates would
/// collide with what already exists.
///
/// Only tables the migration has not touched earlier are checked, so a
/// migration may still drop and re-create a table.
fn preflight(session: &Session<'_>, definition: &MigrationDefinition) -> DbResult<()> {
    let mut touched: HashSet<&str> = HashSet::new();
    for op in &definition.operations {
        let table = op.table_name();
        if !touched.contains(table) {
            match op {
                DdlOperation::CreateTable {
                    if_not_exists: false,
                    ..
                } if session.table_exists(table)? => {
                    return Err(preflight_error(op, format!("table '{table}' already exists")));
                }
                DdlOperation::AddColumn {
                    column,
                    if_not_exists: false,
                    ..
                } => {
                    let exists = session
                        .inspect(table)?
                        .is_some_and(|t| t.has_column(&column.name));
                    if exists {
                        return Err(preflight_error(
                            op,
                            format!("column '{table}.{}' already exists", column.name),
                        ));
                    }
                }
                _ => {}
            }
        }
        touched.insert(table);
    }
    Ok(())
}

fn preflight_error(op: &DdlOperation, message: String) -> DbError {
    DbError::Execution {
        sql: op.to_string(),
        message: format!("preflight failed: {message}"),
    }
}

fn apply_operation(
    session: &Session<'_>,
    renderer: &DuckDbRenderer,
    op: &DdlOperation,
    warnings: &mut Vec<String>,
) -> DbResult<()> {
    let table = op.table_name();
    match op {
        DdlOperation::CreateTable {
            table: declared,
            if_not_exists: true,
        } => {
            if let Some(observed) = session.inspect(table)? {
                log::debug!("Table {table} exists; reconciling declared columns");
                for delta in diff(declared, &observed) {
                    match delta {
                        SchemaDelta::ColumnAdded(column) => {
                            let add = DdlOperation::AddColumn {
                                table: table.to_string(),
                                column,
                                if_not_exists: true,
                            };
                            execute(session, renderer, &add)?;
                        }
                        other => {
                            log::warn!("Drift on {table} left unchanged: {other}");
                            warnings.push(format!("{table}: {other}"));
                        }
                    }
                }
                return Ok(());
            }
        }
        DdlOperation::AddColumn {
            column,
            if_not_exists: true,
            ..
        } => {
            let present = session
                .inspect(table)?
                .is_some_and(|t| t.has_column(&column.name));
            if present {
                log::debug!("Skipping {op}: column exists");
                return Ok(());
            }
        }
        DdlOperation::DropColumn {
            column,
            if_exists: true,
            ..
        } => {
            let present = session
                .inspect(table)?
                .is_some_and(|t| t.has_column(column));
            if !present {
                log::debug!("Skipping {op}: column absent");
                return Ok(());
            }
        }
        DdlOperation::DropTable { if_exists: true, .. } => {
            if !session.table_exists(table)? {
                log::debug!("Skipping {op}: table absent");
                return Ok(());
            }
        }
        _ => {}
    }
    execute(session, renderer, op)
}

fn execute(session: &Session<'_>, renderer: &DuckDbRenderer, op: &DdlOperation) -> DbResult<()> {
    log::debug!("Applying {op}");
    for sql in renderer.render_operation(op)? {
        session.execute(&sql)?;
    }
    Ok(())
}
