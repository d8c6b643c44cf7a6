//! Configuration types and parsing for stratum.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Path used for an in-memory DuckDB database.
pub const MEMORY_DB: &str = ":memory:";

/// Default name of the migration tracking table.
pub const DEFAULT_TRACKING_TABLE: &str = "stratum_migrations";

/// Default name of the advisory lock table.
pub const DEFAULT_LOCK_TABLE: &str = "stratum_migration_lock";

/// Main project configuration from stratum.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Directory holding `<sequence>_<name>.sql` migration files,
    /// relative to the project directory
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: String,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Table recording applied migrations
    #[serde(default = "default_tracking_table")]
    pub tracking_table: String,

    /// Table holding the single-writer advisory lock row
    #[serde(default = "default_lock_table")]
    pub lock_table: String,

    /// Upper bound on applying a single migration
    #[serde(default = "default_statement_timeout_secs")]
    pub statement_timeout_secs: u64,

    /// Tables checked for drift when none are named on the command line
    #[serde(default)]
    pub tables: Vec<String>,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// DuckDB file path, or `:memory:`
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_migrations_dir() -> String {
    "migrations".to_string()
}

fn default_db_path() -> String {
    MEMORY_DB.to_string()
}

fn default_tracking_table() -> String {
    DEFAULT_TRACKING_TABLE.to_string()
}

fn default_lock_table() -> String {
    DEFAULT_LOCK_TABLE.to_string()
}

fn default_statement_timeout_secs() -> u64 {
    30
}

impl Config {
    /// A configuration with every field at its default.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            migrations_dir: default_migrations_dir(),
            database: DatabaseConfig::default(),
            tracking_table: default_tracking_table(),
            lock_table: default_lock_table(),
            statement_timeout_secs: default_statement_timeout_secs(),
            tables: Vec::new(),
        }
    }

    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        log::debug!("Loaded config '{}' from {}", config.name, path.display());
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for stratum.yml or stratum.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("stratum.yml");
        let yaml_path = dir.join("stratum.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }
        if self.migrations_dir.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "migrations_dir cannot be empty".to_string(),
            });
        }
        if self.statement_timeout_secs == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "statement_timeout_secs must be greater than zero".to_string(),
            });
        }
        for (field, value) in [
            ("tracking_table", &self.tracking_table),
            ("lock_table", &self.lock_table),
        ] {
            if !is_plain_identifier(value) {
                return Err(CoreError::ConfigInvalid {
                    message: format!(
                        "{field} '{value}' must be a plain identifier (letters, digits, underscore)"
                    ),
                });
            }
        }
        if self.tracking_table == self.lock_table {
            return Err(CoreError::ConfigInvalid {
                message: "tracking_table and lock_table must differ".to_string(),
            });
        }
        Ok(())
    }

    /// Absolute path of the migrations directory
    pub fn migrations_dir_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.migrations_dir)
    }

    /// Database path resolved against the project directory
    pub fn database_path(&self, root: &Path) -> String {
        if self.database.path == MEMORY_DB || Path::new(&self.database.path).is_absolute() {
            self.database.path.clone()
        } else {
            root.join(&self.database.path).display().to_string()
        }
    }

    pub fn statement_timeout(&self) -> Duration {
        Duration::from_secs(self.statement_timeout_secs)
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_plain_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
