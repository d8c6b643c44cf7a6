//! Advisory migration lock.
//!
//! A single row (`lock_id = 1`) in the lock table marks the target as being
//! migrated. The row is inserted on acquire and deleted on release; a runner
//! that finds it already present fails with [`DbError::LockHeld`].

use crate::error::{DbError, DbResult};
use crate::target::TargetDb;
use chrono::Utc;
use duckdb::Connection;
use st_sql::{DuckDbDialect, SqlDialect};
use uuid::Uuid;

const LOCK_ID: i64 = 1;

/// Held migration lock. Released on [`MigrationLock::release`] or drop.
pub struct MigrationLock {
    db: TargetDb,
    holder: String,
    released: bool,
}

impl std::fmt::Debug for MigrationLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationLock")
            .field("holder", &self.holder)
            .field("released", &self.released)
            .finish()
    }
}

impl MigrationLock {
    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// Release the lock, reporting failure.
    pub fn release(mut self) -> DbResult<()> {
        self.released = true;
        self.db.release_lock(&self.holder)
    }
}

impl Drop for MigrationLock {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.db.release_lock(&self.holder) {
            log::warn!("Failed to release migration lock {}: {e}", self.holder);
        }
    }
}

fn ensure_lock_table(conn: &Connection, table: &str) -> DbResult<()> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {table} (
             lock_id     INTEGER PRIMARY KEY,
             holder      VARCHAR NOT NULL,
             acquired_at TIMESTAMP NOT NULL
         )"
    ))
    .map_err(|e| DbError::StoreUnavailable(format!("failed to create lock table: {e}")))
}

fn current_holder(conn: &Connection, table: &str) -> DbResult<Option<String>> {
    let mut stmt = conn
        .prepare(&format!("SELECT holder FROM {table} WHERE lock_id = ?"))
        .map_err(DbError::store)?;
    let holders = stmt
        .query_map(duckdb::params![LOCK_ID], |row| row.get::<_, String>(0))
        .map_err(DbError::store)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DbError::store)?;
    Ok(holders.into_iter().next())
}

impl TargetDb {
    fn quoted_lock_table(&self) -> String {
        DuckDbDialect::new().quote_ident(self.lock_table())
    }

    /// Take the migration lock under a fresh holder id.
    pub fn acquire_lock(&self) -> DbResult<MigrationLock> {
        let holder = format!("{}-{}", std::process::id(), Uuid::new_v4());
        let table = self.quoted_lock_table();
        let conn = self.lock_conn()?;
        ensure_lock_table(&conn, &table)?;

        if let Some(existing) = current_holder(&conn, &table)? {
            return Err(DbError::LockHeld { holder: existing });
        }
        let stamp = Utc::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string();
        let inserted = conn.execute(
            &format!(
                "INSERT INTO {table} (lock_id, holder, acquired_at)
                 VALUES (?, ?, CAST(? AS TIMESTAMP))"
            ),
            duckdb::params![LOCK_ID, holder.as_str(), stamp.as_str()],
        );
        if let Err(e) = inserted {
            // Lost a race with another connection to the same file.
            return match current_holder(&conn, &table)? {
                Some(existing) => Err(DbError::LockHeld { holder: existing }),
                None => Err(DbError::store(e)),
            };
        }

        log::debug!("Acquired migration lock as {holder}");
        Ok(MigrationLock {
            db: self.clone(),
            holder,
            released: false,
        })
    }

    /// Current lock holder, if any.
    pub fn lock_holder(&self) -> DbResult<Option<String>> {
        let table = self.quoted_lock_table();
        let conn = self.lock_conn()?;
        if !crate::inspect::table_exists(&conn, self.lock_table())? {
            return Ok(None);
        }
        current_holder(&conn, &table)
    }

    /// Remove the lock regardless of holder, returning who held it.
    pub fn force_unlock(&self) -> DbResult<Option<String>> {
        let table = self.quoted_lock_table();
        let conn = self.lock_conn()?;
        if !crate::inspect::table_exists(&conn, self.lock_table())? {
            return Ok(None);
        }
        let previous = current_holder(&conn, &table)?;
        conn.execute(
            &format!("DELETE FROM {table} WHERE lock_id = ?"),
            duckdb::params![LOCK_ID],
        )
        .map_err(DbError::store)?;
        if let Some(holder) = &previous {
            log::warn!("Force-released migration lock held by {holder}");
        }
        Ok(previous)
    }

    fn release_lock(&self, holder: &str) -> DbResult<()> {
        let table = self.quoted_lock_table();
        let conn = self.lock_conn()?;
        conn.execute(
            &format!("DELETE FROM {table} WHERE lock_id = ? AND holder = ?"),
            duckdb::params![LOCK_ID, holder],
        )
        .map_err(DbError::store)?;
        log::debug!("Released migration lock {holder}");
        Ok(())
    }
}

#[cfg(test)]
#[path = "lock_test.rs"]
mod tests;
