//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use serde::Serialize;
use st_core::{Config, MigrationDefinition};
use st_db::TargetDb;
use st_migrate::{CancelToken, Loader};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors (such as the migration lock) run first.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; never shown to the user.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// A loaded project: its directory and configuration.
#[derive(Debug)]
pub(crate) struct Project {
    pub(crate) root: PathBuf,
    pub(crate) config: Config,
}

impl Project {
    /// Database path with `--database` already applied.
    pub(crate) fn database_path(&self) -> String {
        self.config.database_path(&self.root)
    }

    pub(crate) fn migrations_dir(&self) -> PathBuf {
        self.config.migrations_dir_absolute(&self.root)
    }
}

/// Load the project configuration, applying global overrides.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let root = PathBuf::from(&global.project_dir);
    let config = match &global.config {
        Some(path) => Config::load(Path::new(path)),
        None => Config::load_from_dir(&root),
    }
    .context("Failed to load project config")?;
    Ok(Project {
        root,
        config: apply_overrides(config, global),
    })
}

fn apply_overrides(mut config: Config, global: &GlobalArgs) -> Config {
    if let Some(database) = &global.database {
        log::debug!("Database path overridden to {database}");
        config.database.path = database.clone();
    }
    config
}

/// Load and order every migration in the project's migrations directory.
pub(crate) fn load_migrations(project: &Project) -> Result<Vec<MigrationDefinition>> {
    let dir = project.migrations_dir();
    let definitions = Loader::from_dir(&dir)
        .load_all()
        .with_context(|| format!("Failed to load migrations from {}", dir.display()))?;
    log::debug!(
        "Loaded {} migration(s) from {}",
        definitions.len(),
        dir.display()
    );
    Ok(definitions)
}

/// Open the project's target database.
pub(crate) fn open_target(project: &Project) -> Result<TargetDb> {
    TargetDb::from_config(&project.config, &project.root)
        .with_context(|| format!("Failed to open database {}", project.database_path()))
}

/// Cancel `token` when Ctrl-C is received. Abort the handle once the work
/// it guards is finished.
pub(crate) fn cancel_on_ctrl_c(token: CancelToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted; stopping after the current migration");
            token.cancel();
        }
    })
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
    println!("{json}");
    Ok(())
}

/// Shorten a checksum for display.
pub(crate) fn short_checksum(checksum: &str) -> &str {
    checksum.get(..12).unwrap_or(checksum)
}

/// `1 migration` / `2 migrations`
pub(crate) fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
