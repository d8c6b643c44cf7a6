//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Stratum - idempotent schema migrations for DuckDB
#[derive(Parser, Debug)]
#[command(name = "st")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override the database path from the config
    #[arg(short, long, global = true, env = "STRATUM_DATABASE")]
    pub database: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending migrations
    Migrate(MigrateArgs),

    /// Show every migration and whether it is applied
    Status(StatusArgs),

    /// List applied migrations from the tracking table
    History(HistoryArgs),

    /// Compare the schema the migrations imply with the live database
    Diff(DiffArgs),

    /// Check that every migration loads and renders, without a database
    Validate(ValidateArgs),

    /// Force-release a stale migration lock
    Unlock(UnlockArgs),
}

/// Output formats shared by the reporting commands
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Show pending migrations without applying them
    #[arg(long)]
    pub dry_run: bool,

    /// Per-migration timeout in seconds (default: statement_timeout_secs)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the history command
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the diff command
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Tables to check (comma-separated, default: config `tables`, then all)
    #[arg(short, long)]
    pub tables: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Also verify applied history and checksums against the database
    #[arg(long)]
    pub history: bool,
}

/// Arguments for the unlock command
#[derive(Args, Debug)]
pub struct UnlockArgs {}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
