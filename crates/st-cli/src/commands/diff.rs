//! Diff command implementation

use anyhow::{bail, Context, Result};
use st_migrate::{expected_schemas, DriftDetector, DriftReport, SchemaModel};

use crate::cli::{DiffArgs, GlobalArgs, OutputFormat};
use crate::commands::common::{
    load_migrations, load_project, open_target, plural, print_json, ExitCode, Project,
};

/// Execute the diff command
///
/// Exits with code 1 when any table has drift the migrations cannot
/// reconcile (a changed type or a removed column).
pub async fn execute(args: &DiffArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let definitions = load_migrations(&project)?;
    let model = expected_schemas(&definitions);
    let tables = select_tables(args, &project, &model)?;

    let detector = DriftDetector::new(open_target(&project)?);
    let mut reports = Vec::with_capacity(tables.len());
    for table in &tables {
        let Some(expected) = model.table(table) else {
            bail!("Table '{table}' is not created by any migration");
        };
        let report = detector
            .check(expected)
            .with_context(|| format!("Failed to check table '{table}'"))?;
        reports.push(report);
    }

    match args.output {
        OutputFormat::Json => print_json(&reports)?,
        OutputFormat::Text => print_reports(&reports),
    }

    if reports.iter().any(|r| r.conflicts().next().is_some()) {
        return Err(ExitCode(1).into());
    }
    Ok(())
}

/// `--tables`, else the config's `tables`, else every table the migrations
/// create.
fn select_tables(args: &DiffArgs, project: &Project, model: &SchemaModel) -> Result<Vec<String>> {
    if let Some(tables) = &args.tables {
        let selected: Vec<String> = tables
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();
        if selected.is_empty() {
            bail!("--tables names no tables");
        }
        return Ok(selected);
    }
    if !project.config.tables.is_empty() {
        return Ok(project.config.tables.clone());
    }
    Ok(model.table_names().into_iter().map(String::from).collect())
}

fn print_reports(reports: &[DriftReport]) {
    if reports.is_empty() {
        println!("No tables to check");
        return;
    }

    for report in reports {
        if !report.exists {
            println!("{}: missing (created by a pending migration)", report.table);
            continue;
        }
        if report.is_clean() {
            println!("{}: in sync", report.table);
            continue;
        }
        println!("{}: {}", report.table, plural(report.deltas.len(), "difference"));
        for delta in report.pending() {
            println!("  pending   {delta}");
        }
        for delta in report.warnings() {
            println!("  warning   {delta}");
        }
        for delta in report.conflicts() {
            println!("  conflict  {delta}");
        }
    }
}
