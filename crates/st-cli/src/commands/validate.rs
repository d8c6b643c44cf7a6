//! Validate command implementation

use anyhow::{Context, Result};
use st_core::MigrationDefinition;
use st_migrate::{expected_schemas, Runner};
use st_sql::DuckDbRenderer;

use crate::cli::{GlobalArgs, ValidateArgs};
use crate::commands::common::{load_migrations, load_project, open_target, plural, ExitCode};

/// Validation result severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// A single validation issue
#[derive(Debug)]
struct ValidationIssue {
    severity: Severity,
    migration: String,
    message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.migration, self.message)
    }
}

/// Execute the validate command
///
/// Loading already rejects malformed files, so a project that gets this far
/// parses cleanly; what remains is checking that every operation renders for
/// the target and, with `--history`, that applied history still matches.
pub async fn execute(args: &ValidateArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let definitions = load_migrations(&project)?;

    let issues = check_definitions(&definitions);
    for issue in &issues {
        println!("{issue}");
    }

    let model = expected_schemas(&definitions);
    println!(
        "{} define {}",
        plural(definitions.len(), "migration"),
        plural(model.tables().len(), "table")
    );

    if args.history {
        let db = open_target(&project)?;
        let runner = Runner::new(db, definitions);
        let pending = runner
            .plan()
            .context("Applied history does not match the migrations")?;
        println!("History matches; {} pending", plural(pending.len(), "migration"));
    }

    if issues.iter().any(|i| i.severity == Severity::Error) {
        return Err(ExitCode(1).into());
    }
    Ok(())
}

fn check_definitions(definitions: &[MigrationDefinition]) -> Vec<ValidationIssue> {
    let renderer = DuckDbRenderer::new();
    let mut issues = Vec::new();
    for definition in definitions {
        for op in &definition.operations {
            if let Err(e) = renderer.render_operation(op) {
                issues.push(ValidationIssue {
                    severity: Severity::Error,
                    migration: definition.id.to_string(),
                    message: e.to_string(),
                });
            }
        }
        if !definition.is_idempotent {
            issues.push(ValidationIssue {
                severity: Severity::Warning,
                migration: definition.id.to_string(),
                message: "contains unguarded operations and cannot safely be re-run by hand"
                    .to_string(),
            });
        }
    }
    issues
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;
