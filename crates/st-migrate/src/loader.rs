//! Migration source loading.
//!
//! A [`MigrationSource`] yields raw `(name, sql)` entries; the [`Loader`]
//! validates identifiers, parses each entry into DDL operations, and returns
//! the definitions ordered by their numeric sequence prefix.

use crate::error::LoadError;
use st_core::{MigrationDefinition, MigrationId};
use st_sql::DdlParser;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// One raw migration as read from a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Migration name, which becomes its identifier (file stem for files)
    pub name: String,

    /// DDL text
    pub sql: String,
}

/// Somewhere migrations come from.
pub trait MigrationSource {
    /// All entries, in no particular order.
    fn entries(&self) -> Result<Vec<SourceEntry>, LoadError>;
}

/// `*.sql` files in one directory (not recursive).
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl MigrationSource for DirectorySource {
    fn entries(&self) -> Result<Vec<SourceEntry>, LoadError> {
        let io_err = |path: &Path, source: std::io::Error| LoadError::Io {
            path: path.display().to_string(),
            source,
        };

        let mut entries = Vec::new();
        let read_dir = std::fs::read_dir(&self.dir).map_err(|e| io_err(&self.dir, e))?;
        for entry in read_dir {
            let path = entry.map_err(|e| io_err(&self.dir, e))?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("sql") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            let sql = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
            entries.push(SourceEntry {
                name: name.to_string(),
                sql,
            });
        }
        log::debug!(
            "Found {} migration files in {}",
            entries.len(),
            self.dir.display()
        );
        Ok(entries)
    }
}

/// Migrations held in memory, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    entries: Vec<SourceEntry>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a migration named `name` (a file stem such as `0001_create_users`).
    pub fn with(mut self, name: &str, sql: &str) -> Self {
        self.entries.push(SourceEntry {
            name: name.to_string(),
            sql: sql.to_string(),
        });
        self
    }
}

impl MigrationSource for StaticSource {
    fn entries(&self) -> Result<Vec<SourceEntry>, LoadError> {
        Ok(self.entries.clone())
    }
}

/// Builds ordered [`MigrationDefinition`]s from a source.
pub struct Loader<S> {
    source: S,
    parser: DdlParser,
}

impl<S: MigrationSource> Loader<S> {
    /// Loader that parses migrations as MySQL-flavoured DDL
    pub fn new(source: S) -> Self {
        Self {
            source,
            parser: DdlParser::mysql(),
        }
    }

    /// Load, parse and order every migration.
    ///
    /// Ordering is by the identifier's numeric prefix, never by listing
    /// order. Fails on the first malformed entry, so a run never starts with
    /// a partially understood migration set.
    pub fn load_all(&self) -> Result<Vec<MigrationDefinition>, LoadError> {
        let mut entries = self.source.entries()?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        let mut ids: HashSet<MigrationId> = HashSet::new();
        let mut sequences: HashMap<u64, MigrationId> = HashMap::new();
        let mut definitions = Vec::with_capacity(entries.len());

        for entry in entries {
            let id = MigrationId::try_new(entry.name.as_str()).ok_or_else(|| {
                LoadError::Malformed {
                    id: entry.name.clone(),
                    reason: "identifier must be non-empty and contain no whitespace".to_string(),
                }
            })?;
            let sequence = id.sequence_prefix().ok_or_else(|| LoadError::Malformed {
                id: id.to_string(),
                reason: "identifier must start with a numeric sequence, e.g. 0001_create_users"
                    .to_string(),
            })?;
            if !ids.insert(id.clone()) {
                return Err(LoadError::DuplicateIdentifier { id });
            }
            if let Some(other) = sequences.insert(sequence, id.clone()) {
                return Err(LoadError::Malformed {
                    id: id.to_string(),
                    reason: format!("sequence {sequence} is already used by '{other}'"),
                });
            }

            let operations = self
                .parser
                .parse(&entry.sql)
                .map_err(|e| LoadError::Malformed {
                    id: id.to_string(),
                    reason: e.to_string(),
                })?;
            let definition = MigrationDefinition::new(id, sequence, operations, entry.sql);
            log::debug!(
                "Loaded migration {} ({} operations, idempotent: {})",
                definition.id,
                definition.operations.len(),
                definition.is_idempotent
            );
            definitions.push(definition);
        }

        definitions.sort_by_key(|d| d.sequence);
        Ok(definitions)
    }
}

impl Loader<DirectorySource> {
    /// Loader over a migrations directory
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(DirectorySource::new(dir))
    }
}

#[cfg(test)]
#[path = "loader_test.rs"]
mod tests;
