//! Migration record store backed by the tracking table.

use crate::error::{DbError, DbResult};
use crate::inspect::table_exists;
use crate::session::Session;
use crate::target::TargetDb;
use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::Connection;
use st_core::{MigrationId, MigrationRecord, NewRecord};
use st_sql::{DuckDbDialect, SqlDialect};

/// Write format for `applied_at`; DuckDB casts it to TIMESTAMP.
const WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// `strftime` pattern used to read `applied_at` back.
const DUCKDB_READ_FORMAT: &str = "%Y-%m-%d %H:%M:%S.%f";

/// chrono pattern matching [`DUCKDB_READ_FORMAT`] output.
const PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Durable log of applied migrations.
///
/// Records are append-only: a record is never updated or deleted, and an
/// identifier is recorded at most once.
pub trait RecordStore {
    /// Whether `id` has a record
    fn has_applied(&self, id: &MigrationId) -> DbResult<bool>;

    /// Insert the record for a successfully applied migration.
    ///
    /// Fails with [`DbError::DuplicateRecord`] if `id` is already recorded,
    /// leaving the store unchanged.
    fn record_applied(&self, record: &NewRecord) -> DbResult<MigrationRecord>;

    /// All records, in apply order
    fn list_applied(&self) -> DbResult<Vec<MigrationRecord>>;
}

impl RecordStore for Session<'_> {
    fn has_applied(&self, id: &MigrationId) -> DbResult<bool> {
        has_applied(self.conn(), self.tracking_table(), id)
    }

    fn record_applied(&self, record: &NewRecord) -> DbResult<MigrationRecord> {
        record_applied(self.conn(), self.tracking_table(), record)
    }

    fn list_applied(&self) -> DbResult<Vec<MigrationRecord>> {
        list_applied(self.conn(), self.tracking_table())
    }
}

impl RecordStore for TargetDb {
    fn has_applied(&self, id: &MigrationId) -> DbResult<bool> {
        let conn = self.lock_conn()?;
        has_applied(&conn, &self.tables().tracking, id)
    }

    fn record_applied(&self, record: &NewRecord) -> DbResult<MigrationRecord> {
        let conn = self.lock_conn()?;
        record_applied(&conn, &self.tables().tracking, record)
    }

    fn list_applied(&self) -> DbResult<Vec<MigrationRecord>> {
        let conn = self.lock_conn()?;
        list_applied(&conn, &self.tables().tracking)
    }
}

fn quoted(table: &str) -> String {
    DuckDbDialect::new().quote_ident(table)
}

pub(crate) fn ensure_tracking_table(conn: &Connection, table: &str) -> DbResult<()> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {} (
             identifier   VARCHAR PRIMARY KEY,
             sequence     INTEGER NOT NULL,
             checksum     VARCHAR NOT NULL,
             applied_at   TIMESTAMP NOT NULL,
             execution_ms BIGINT NOT NULL
         )",
        quoted(table)
    ))
    .map_err(|e| DbError::StoreUnavailable(format!("failed to create tracking table: {e}")))
}

pub(crate) fn has_applied(conn: &Connection, table: &str, id: &MigrationId) -> DbResult<bool> {
    if !table_exists(conn, table)? {
        return Ok(false);
    }
    let count: i64 = conn
        .query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE identifier = ?", quoted(table)),
            duckdb::params![id.as_str()],
            |row| row.get(0),
        )
        .map_err(DbError::store)?;
    Ok(count > 0)
}

pub(crate) fn record_applied(
    conn: &Connection,
    table: &str,
    record: &NewRecord,
) -> DbResult<MigrationRecord> {
    ensure_tracking_table(conn, table)?;
    if has_applied(conn, table, &record.id)? {
        return Err(DbError::DuplicateRecord {
            id: record.id.to_string(),
        });
    }

    let next_sequence = format!(
        "SELECT CAST(COALESCE(MAX(sequence), 0) + 1 AS BIGINT) FROM {}",
        quoted(table)
    );
    let sequence: i64 = conn
        .query_row(&next_sequence, [], |row| row.get(0))
        .map_err(DbError::store)?;
    let stamp = Utc::now().format(WRITE_FORMAT).to_string();
    let execution_ms = i64::try_from(record.execution_ms).unwrap_or(i64::MAX);

    conn.execute(
        &format!(
            "INSERT INTO {} (identifier, sequence, checksum, applied_at, execution_ms)
             VALUES (?, ?, ?, CAST(? AS TIMESTAMP), ?)",
            quoted(table)
        ),
        duckdb::params![
            record.id.as_str(),
            sequence,
            record.checksum.as_str(),
            stamp.as_str(),
            execution_ms
        ],
    )
    .map_err(|e| {
        let msg = e.to_string();
        if is_duplicate_key(&msg) {
            DbError::DuplicateRecord {
                id: record.id.to_string(),
            }
        } else {
            DbError::StoreUnavailable(msg)
        }
    })?;

    log::debug!("Recorded migration {} at position {sequence}", record.id);
    Ok(MigrationRecord {
        id: record.id.clone(),
        sequence: sequence as u64,
        checksum: record.checksum.clone(),
        applied_at: parse_timestamp(record.id.as_str(), &stamp)?,
        execution_ms: record.execution_ms,
    })
}

/// Whether an insert failed on the tracking table's primary key.
///
/// duckdb-rs reports constraint failures without a distinct error code, so
/// this matches DuckDB's message text ("Duplicate key ... violates primary
/// key constraint"). `test_duplicate_key_message_is_recognised` pins the
/// wording of the bundled DuckDB.
fn is_duplicate_key(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("duplicate key") || message.contains("violates primary key")
}

pub(crate) fn list_applied(conn: &Connection, table: &str) -> DbResult<Vec<MigrationRecord>> {
    if !table_exists(conn, table)? {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT identifier, CAST(sequence AS BIGINT), checksum,
                strftime(applied_at, '{DUCKDB_READ_FORMAT}'), execution_ms
         FROM {}
         ORDER BY sequence",
        quoted(table)
    );
    let mut stmt = conn.prepare(&sql).map_err(DbError::store)?;
    let rows: Vec<(String, i64, String, String, i64)> = stmt
        .query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
        })
        .map_err(DbError::store)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DbError::store)?;

    rows.into_iter()
        .map(|(identifier, sequence, checksum, applied_at, execution_ms)| {
            let corrupt = |message: String| DbError::CorruptRecord {
                id: identifier.clone(),
                message,
            };
            let id = MigrationId::try_new(identifier.clone())
                .ok_or_else(|| corrupt("invalid identifier".to_string()))?;
            let sequence = u64::try_from(sequence)
                .map_err(|_| corrupt(format!("negative sequence {sequence}")))?;
            let execution_ms = u64::try_from(execution_ms)
                .map_err(|_| corrupt(format!("negative execution time {execution_ms}")))?;
            Ok(MigrationRecord {
                applied_at: parse_timestamp(&identifier, &applied_at)?,
                id,
                sequence,
                checksum,
                execution_ms,
            })
        })
        .collect()
}

fn parse_timestamp(id: &str, value: &str) -> DbResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, PARSE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| DbError::CorruptRecord {
            id: id.to_string(),
            message: format!("unreadable applied_at '{value}': {e}"),
        })
}

#[cfg(test)]
#[path = "record_store_test.rs"]
mod tests;
