//! Migration runner.
//!
//! Applies the pending suffix of a migration set, one unit of work per
//! migration, fail-fast. The applied set stays a prefix of the definitions:
//! a migration is only attempted once every earlier one is recorded, and its
//! record commits atomically with its DDL.

use crate::apply::{apply_definition, ApplyOutcome};
use crate::cancel::CancelToken;
use crate::error::{RunnerError, RunnerResult};
use crate::history::verify_history;
use crate::state::MigrationState;
use serde::Serialize;
use st_core::{MigrationDefinition, MigrationId, MigrationRecord};
use st_db::{CommitGate, MigrationLock, RecordStore, TargetDb};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default per-migration timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A migration applied by a run.
#[derive(Debug, Clone, Serialize)]
pub struct AppliedMigration {
    pub record: MigrationRecord,

    /// Drift left unchanged while reconciling existing tables
    pub warnings: Vec<String>,
}

/// Result of a successful run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Migrations that were already applied before the run
    pub already_applied: usize,

    /// Migrations applied by this run, in order
    pub applied: Vec<AppliedMigration>,
}

impl RunReport {
    pub fn applied_ids(&self) -> Vec<MigrationId> {
        self.applied.iter().map(|a| a.record.id.clone()).collect()
    }

    /// True when nothing was pending.
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.applied
            .iter()
            .flat_map(|a| a.warnings.iter().map(String::as_str))
    }
}

/// Status of one defined migration.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    pub id: MigrationId,
    pub state: MigrationState,
    pub is_idempotent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<MigrationRecord>,
}

/// Applies migrations to a target.
pub struct Runner {
    db: TargetDb,
    definitions: Arc<[MigrationDefinition]>,
    timeout: Duration,
    cancel: CancelToken,
}

impl Runner {
    /// Runner over `definitions`, which must already be in sequence order
    /// (as returned by [`Loader::load_all`]).
    ///
    /// [`Loader::load_all`]: crate::Loader::load_all
    pub fn new(db: TargetDb, definitions: Vec<MigrationDefinition>) -> Self {
        Self {
            db,
            definitions: definitions.into(),
            timeout: DEFAULT_TIMEOUT,
            cancel: CancelToken::new(),
        }
    }

    /// Per-migration timeout; a migration exceeding it is rolled back.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn definitions(&self) -> &[MigrationDefinition] {
        &self.definitions
    }

    /// Apply every pending migration and return the identifiers applied.
    pub async fn run_pending(&self) -> RunnerResult<Vec<MigrationId>> {
        Ok(self.run().await?.applied_ids())
    }

    /// Apply every pending migration.
    ///
    /// Stops at the first failure; migrations applied before it stay
    /// committed and recorded.
    pub async fn run(&self) -> RunnerResult<RunReport> {
        let lock = self.db.acquire_lock().map_err(RunnerError::from_store)?;
        log::debug!("Holding migration lock {}", lock.holder());

        match self.run_locked().await {
            Err(err @ RunnerError::Timeout { .. }) => {
                // The abandoned worker still holds the connection until its
                // rollback finishes; release the lock after it, off this task.
                tokio::task::spawn_blocking(move || release(lock));
                Err(err)
            }
            result => {
                release(lock);
                result
            }
        }
    }

    async fn run_locked(&self) -> RunnerResult<RunReport> {
        self.db
            .ensure_tracking_table()
            .map_err(RunnerError::from_store)?;
        let applied = self.db.list_applied().map_err(RunnerError::from_store)?;
        let already_applied = verify_history(&self.definitions, &applied)?;

        let pending = &self.definitions[already_applied..];
        if pending.is_empty() {
            log::info!("Schema is up to date ({already_applied} migrations applied)");
        } else {
            log::info!(
                "{} pending migrations ({already_applied} already applied)",
                pending.len()
            );
        }

        let mut report = RunReport {
            already_applied,
            applied: Vec::with_capacity(pending.len()),
        };
        for index in already_applied..self.definitions.len() {
            let id = &self.definitions[index].id;
            if self.cancel.is_cancelled() {
                log::warn!("Run cancelled before {id}");
                return Err(RunnerError::Cancelled { next: id.clone() });
            }

            let state = MigrationState::Pending.transition(MigrationState::Applying)?;
            log::info!("Applying {id}");
            let started = Instant::now();
            match self.apply_one(index).await {
                Ok(outcome) => {
                    let state = state.transition(MigrationState::Applied)?;
                    log::info!(
                        "{id} {state} in {}ms",
                        started.elapsed().as_millis()
                    );
                    report.applied.push(AppliedMigration {
                        record: outcome.record,
                        warnings: outcome.warnings,
                    });
                }
                Err(err) => {
                    let state = state.transition(MigrationState::Failed)?;
                    log::error!("{id} {state}: {err}");
                    return Err(err);
                }
            }
        }
        Ok(report)
    }

    /// Run one migration's unit of work on a blocking worker under the
    /// timeout.
    async fn apply_one(&self, index: usize) -> RunnerResult<ApplyOutcome> {
        let id = self.definitions[index].id.clone();
        let gate = CommitGate::new();
        let worker_gate = gate.clone();
        let db = self.db.clone();
        let definitions = Arc::clone(&self.definitions);
        let started = Instant::now();

        let mut handle = tokio::task::spawn_blocking(move || {
            db.unit_of_work(&worker_gate, |session| {
                apply_definition(session, &definitions[index], started)
            })
        });

        let joined = match tokio::time::timeout(self.timeout, &mut handle).await {
            Ok(joined) => joined,
            Err(_) if gate.abandon() => {
                return Err(RunnerError::Timeout {
                    id,
                    timeout: self.timeout,
                });
            }
            // Already committing: the outcome is decided, wait for it.
            Err(_) => handle.await,
        };
        joined
            .map_err(|e| RunnerError::Worker(e.to_string()))?
            .map_err(|e| RunnerError::from_db(&id, e))
    }

    /// Pending migrations, in order, without applying anything.
    pub fn plan(&self) -> RunnerResult<Vec<&MigrationDefinition>> {
        let applied = self.db.list_applied().map_err(RunnerError::from_store)?;
        let already_applied = verify_history(&self.definitions, &applied)?;
        Ok(self.definitions[already_applied..].iter().collect())
    }

    /// Every defined migration with its state and record.
    pub fn status(&self) -> RunnerResult<Vec<MigrationStatus>> {
        let applied = self.db.list_applied().map_err(RunnerError::from_store)?;
        verify_history(&self.definitions, &applied)?;
        let mut records = applied.into_iter();
        Ok(self
            .definitions
            .iter()
            .map(|def| {
                let record = records.next();
                MigrationStatus {
                    id: def.id.clone(),
                    state: if record.is_some() {
                        MigrationState::Applied
                    } else {
                        MigrationState::Pending
                    },
                    is_idempotent: def.is_idempotent,
                    record,
                }
            })
            .collect())
    }
}

fn release(lock: MigrationLock) {
    let holder = lock.holder().to_string();
    if let Err(e) = lock.release() {
        log::warn!("Failed to release migration lock {holder}: {e}");
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
