//! History command implementation

use anyhow::{Context, Result};
use st_db::RecordStore;

use crate::cli::{GlobalArgs, HistoryArgs, OutputFormat};
use crate::commands::common::{load_project, open_target, print_json, short_checksum};

/// Execute the history command
pub async fn execute(args: &HistoryArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let db = open_target(&project)?;
    let records = db
        .list_applied()
        .context("Failed to read the migration tracking table")?;

    if args.output == OutputFormat::Json {
        return print_json(&records);
    }

    if records.is_empty() {
        println!("No migrations have been applied");
        return Ok(());
    }
    for record in &records {
        println!(
            "  {:>4}  {}  {}  {}  {} ms",
            record.sequence,
            record.applied_at.format("%Y-%m-%d %H:%M:%S"),
            short_checksum(&record.checksum),
            record.id,
            record.execution_ms,
        );
    }
    Ok(())
}
