//! Status command implementation

use anyhow::{Context, Result};
use st_migrate::{MigrationState, MigrationStatus, Runner};

use crate::cli::{GlobalArgs, OutputFormat, StatusArgs};
use crate::commands::common::{load_migrations, load_project, open_target, plural, print_json};

/// Execute the status command
pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let definitions = load_migrations(&project)?;
    let db = open_target(&project)?;

    let statuses = Runner::new(db, definitions)
        .status()
        .context("Failed to read migration status")?;

    match args.output {
        OutputFormat::Json => print_json(&statuses),
        OutputFormat::Text => {
            print_statuses(&statuses);
            Ok(())
        }
    }
}

fn print_statuses(statuses: &[MigrationStatus]) {
    if statuses.is_empty() {
        println!("No migrations found");
        return;
    }

    let width = statuses
        .iter()
        .map(|s| s.id.as_str().len())
        .max()
        .unwrap_or(0);
    for status in statuses {
        let applied_at = status
            .record
            .as_ref()
            .map(|r| r.applied_at.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        let marker = if status.is_idempotent { "" } else { "  (not idempotent)" };
        println!(
            "  {:<8} {:<width$}  {}{}",
            status.state.to_string(),
            status.id.as_str(),
            applied_at,
            marker,
        );
    }

    let pending = statuses
        .iter()
        .filter(|s| s.state == MigrationState::Pending)
        .count();
    println!();
    println!(
        "{} applied, {} pending",
        statuses.len() - pending,
        plural(pending, "migration")
    );
}
