//! Connection view inside a unit of work.

use crate::error::{DbError, DbResult};
use crate::inspect;
use crate::target::TableNames;
use duckdb::Connection;
use st_core::TableSchema;

/// The open transaction of a unit of work.
///
/// Everything done through a session commits or rolls back together,
/// including the tracking row written through its [`RecordStore`] impl.
///
/// [`RecordStore`]: crate::RecordStore
pub struct Session<'c> {
    conn: &'c Connection,
    tables: &'c TableNames,
}

impl<'c> Session<'c> {
    pub(crate) fn new(conn: &'c Connection, tables: &'c TableNames) -> Self {
        Self { conn, tables }
    }

    pub(crate) fn conn(&self) -> &Connection {
        self.conn
    }

    pub(crate) fn tracking_table(&self) -> &str {
        &self.tables.tracking
    }

    /// Execute one or more DDL statements
    pub fn execute(&self, sql: &str) -> DbResult<()> {
        log::debug!("Executing: {sql}");
        self.conn
            .execute_batch(sql)
            .map_err(|e| DbError::execution(sql, e))
    }

    pub fn table_exists(&self, table: &str) -> DbResult<bool> {
        inspect::table_exists(self.conn, table)
    }

    /// Live definition of `table` as this transaction sees it
    pub fn inspect(&self, table: &str) -> DbResult<Option<TableSchema>> {
        inspect::inspect_table(self.conn, table)
    }
}
