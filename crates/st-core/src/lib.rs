//! st-core - Core library for Stratum
//!
//! This crate provides the shared vocabulary used across all Stratum
//! components: column and table schema types, DDL operations, migration
//! definitions and records, checksums, and `stratum.yml` configuration.

pub mod checksum;
pub mod column;
pub mod config;
pub mod error;
pub mod migration;
pub mod migration_id;
pub mod operation;
pub mod schema;

pub use checksum::compute_checksum;
pub use column::{ColumnSpec, ColumnType, DefaultValue, TypeFamily};
pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use migration::{MigrationDefinition, MigrationRecord, NewRecord};
pub use migration_id::MigrationId;
pub use operation::DdlOperation;
pub use schema::TableSchema;
