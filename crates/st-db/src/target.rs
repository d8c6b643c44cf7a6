//! DuckDB target handle

use crate::error::{DbError, DbResult};
use crate::gate::CommitGate;
use crate::inspect;
use crate::record_store;
use crate::session::Session;
use duckdb::Connection;
use st_core::config::{DEFAULT_LOCK_TABLE, DEFAULT_TRACKING_TABLE, MEMORY_DB};
use st_core::{Config, TableSchema};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Names of the bookkeeping tables Stratum owns on the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TableNames {
    pub(crate) tracking: String,
    pub(crate) lock: String,
}

/// Handle to the database being migrated.
///
/// Cheap to clone; clones share one connection. All access is serialised
/// through a mutex, so a unit of work running on a blocking worker holds the
/// connection for its whole transaction.
#[derive(Clone)]
pub struct TargetDb {
    conn: Arc<Mutex<Connection>>,
    tables: Arc<TableNames>,
}

impl TargetDb {
    /// Wrap an already-open connection
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            tables: Arc::new(TableNames {
                tracking: DEFAULT_TRACKING_TABLE.to_string(),
                lock: DEFAULT_LOCK_TABLE.to_string(),
            }),
        }
    }

    /// Create a new in-memory DuckDB target
    pub fn in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory().map_err(DbError::store)?;
        Ok(Self::from_connection(conn))
    }

    /// Open a target from a path string (handles :memory: special case)
    pub fn open(path: &str) -> DbResult<Self> {
        if path == MEMORY_DB {
            return Self::in_memory();
        }
        let conn = Connection::open(Path::new(path))
            .map_err(|e| DbError::StoreUnavailable(format!("{e}: {path}")))?;
        Ok(Self::from_connection(conn))
    }

    /// Open the target a project config points at, using its table names.
    pub fn from_config(config: &Config, root: &Path) -> DbResult<Self> {
        let db = Self::open(&config.database_path(root))?;
        Ok(db.with_tables(&config.tracking_table, &config.lock_table))
    }

    /// Override the tracking and lock table names.
    pub fn with_tables(mut self, tracking: &str, lock: &str) -> Self {
        self.tables = Arc::new(TableNames {
            tracking: tracking.to_string(),
            lock: lock.to_string(),
        });
        self
    }

    pub fn tracking_table(&self) -> &str {
        &self.tables.tracking
    }

    pub fn lock_table(&self) -> &str {
        &self.tables.lock
    }

    pub(crate) fn tables(&self) -> &TableNames {
        &self.tables
    }

    pub(crate) fn lock_conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::StoreUnavailable(format!("connection mutex poisoned: {e}")))
    }

    /// Execute SQL outside any unit of work (auto-commit)
    pub fn execute_batch(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock_conn()?;
        conn.execute_batch(sql)
            .map_err(|e| DbError::execution(sql, e))
    }

    /// Create the tracking table if it does not exist yet
    pub fn ensure_tracking_table(&self) -> DbResult<()> {
        let conn = self.lock_conn()?;
        record_store::ensure_tracking_table(&conn, &self.tables.tracking)
    }

    /// Check whether a table exists in the main schema
    pub fn table_exists(&self, table: &str) -> DbResult<bool> {
        let conn = self.lock_conn()?;
        inspect::table_exists(&conn, table)
    }

    /// Read the live definition of `table`, or `None` if it does not exist
    pub fn inspect(&self, table: &str) -> DbResult<Option<TableSchema>> {
        let conn = self.lock_conn()?;
        inspect::inspect_table(&conn, table)
    }

    /// Names of all user tables in the main schema, excluding the
    /// bookkeeping tables.
    pub fn list_tables(&self) -> DbResult<Vec<String>> {
        let conn = self.lock_conn()?;
        let tables = inspect::list_tables(&conn)?;
        Ok(tables
            .into_iter()
            .filter(|t| {
                !t.eq_ignore_ascii_case(&self.tables.tracking)
                    && !t.eq_ignore_ascii_case(&self.tables.lock)
            })
            .collect())
    }

    /// Run `body` inside a `BEGIN` / `COMMIT` transaction.
    ///
    /// Errors from `body` roll the transaction back. A successful body only
    /// commits if it wins the [`CommitGate`]; if the waiter abandoned the
    /// unit of work first, it is rolled back and [`DbError::Abandoned`] is
    /// returned instead.
    pub fn unit_of_work<F, T>(&self, gate: &CommitGate, body: F) -> DbResult<T>
    where
        F: FnOnce(&Session<'_>) -> DbResult<T>,
    {
        let conn = self.lock_conn()?;
        // The waiter may have given up while this worker queued for the
        // connection.
        if gate.is_abandoned() {
            return Err(DbError::Abandoned);
        }
        conn.execute_batch("BEGIN TRANSACTION")
            .map_err(|e| DbError::StoreUnavailable(format!("BEGIN failed: {e}")))?;

        let session = Session::new(&conn, &self.tables);
        let result = body(&session);

        match result {
            Ok(value) => {
                if !gate.try_commit() {
                    rollback(&conn);
                    return Err(DbError::Abandoned);
                }
                if let Err(commit_err) = conn.execute_batch("COMMIT") {
                    rollback(&conn);
                    return Err(DbError::StoreUnavailable(format!(
                        "COMMIT failed: {commit_err}"
                    )));
                }
                Ok(value)
            }
            Err(err) => {
                rollback(&conn);
                Err(err)
            }
        }
    }
}

fn rollback(conn: &Connection) {
    if let Err(e) = conn.execute_batch("ROLLBACK") {
        log::warn!("ROLLBACK failed: {e}");
    }
}

#[cfg(test)]
#[path = "target_test.rs"]
mod tests;
