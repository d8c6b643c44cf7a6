//! st-migrate - Migration loading, drift detection, and application
//!
//! The [`Loader`] turns a directory (or any [`MigrationSource`]) of numbered
//! DDL files into ordered [`MigrationDefinition`]s. The [`Runner`] applies
//! the pending suffix of those definitions to a [`TargetDb`], each inside its
//! own transaction together with its tracking record. The
//! [`DriftDetector`] compares the schema the migrations imply against the
//! live target without changing it.
//!
//! [`MigrationDefinition`]: st_core::MigrationDefinition
//! [`TargetDb`]: st_db::TargetDb

pub(crate) mod apply;
pub mod cancel;
pub mod drift;
pub mod error;
pub mod expected;
pub mod history;
pub mod loader;
pub mod runner;
pub mod state;

pub use cancel::CancelToken;
pub use drift::{diff, ConstraintKind, DriftDetector, DriftReport, SchemaDelta};
pub use error::{DriftError, LoadError, RunnerError, RunnerResult};
pub use expected::{expected_schemas, SchemaModel};
pub use history::verify_history;
pub use loader::{DirectorySource, Loader, MigrationSource, SourceEntry, StaticSource};
pub use runner::{AppliedMigration, MigrationStatus, RunReport, Runner};
pub use state::{InvalidTransition, MigrationState};
