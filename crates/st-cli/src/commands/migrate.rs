//! Migrate command implementation

use anyhow::{Context, Result};
use st_migrate::{CancelToken, RunReport, Runner};
use std::time::Duration;

use crate::cli::{GlobalArgs, MigrateArgs, OutputFormat};
use crate::commands::common::{
    cancel_on_ctrl_c, load_migrations, load_project, open_target, plural, print_json,
};

/// Execute the migrate command
pub async fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let definitions = load_migrations(&project)?;
    let db = open_target(&project)?;

    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| project.config.statement_timeout());
    let cancel = CancelToken::new();
    let runner = Runner::new(db, definitions)
        .with_timeout(timeout)
        .with_cancel_token(cancel.clone());

    if args.dry_run {
        let plan = runner.plan().context("Failed to plan migrations")?;
        if args.output == OutputFormat::Json {
            let ids: Vec<&str> = plan.iter().map(|d| d.id.as_str()).collect();
            return print_json(&ids);
        }
        if plan.is_empty() {
            println!("Nothing to migrate: database is up to date");
        } else {
            println!("Would apply {}:", plural(plan.len(), "migration"));
            for definition in plan {
                println!("  {}", definition.id);
            }
        }
        return Ok(());
    }

    if args.output == OutputFormat::Text {
        println!(
            "Migrating {} ({})",
            project.config.name,
            project.database_path()
        );
    }

    let watcher = cancel_on_ctrl_c(cancel);
    let result = runner.run().await;
    watcher.abort();

    let report = match result {
        Ok(report) => report,
        Err(err) => {
            if err.is_retryable() {
                log::info!("The failure is transient; re-running `st migrate` may succeed");
            }
            let context = match err.failed_migration() {
                Some(id) => format!("Migration run stopped at '{id}'"),
                None => "Migration run failed".to_string(),
            };
            return Err(err).context(context);
        }
    };

    match args.output {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            print_report(&report);
            Ok(())
        }
    }
}

fn print_report(report: &RunReport) {
    if report.is_noop() {
        println!(
            "Nothing to migrate: {} already applied",
            plural(report.already_applied, "migration")
        );
        return;
    }

    for applied in &report.applied {
        println!(
            "  applied {} ({} ms)",
            applied.record.id, applied.record.execution_ms
        );
        for warning in &applied.warnings {
            println!("    warning: {warning}");
        }
    }
    println!();
    println!(
        "Applied {}; {} already applied",
        plural(report.applied.len(), "migration"),
        report.already_applied
    );
}
