//! st-db - DuckDB target for Stratum
//!
//! [`TargetDb`] owns the connection to the database being migrated. On top of
//! it this crate provides the migration record store (the tracking table),
//! live schema inspection, the transactional unit of work the runner applies
//! each migration in, and the advisory lock row that keeps runners exclusive.

pub mod error;
pub mod gate;
pub mod inspect;
pub mod lock;
pub mod record_store;
pub mod session;
pub mod target;

pub use error::{DbError, DbResult};
pub use gate::CommitGate;
pub use lock::MigrationLock;
pub use record_store::RecordStore;
pub use session::Session;
pub use target::TargetDb;
