//! Unlock command implementation

use anyhow::{Context, Result};

use crate::cli::{GlobalArgs, UnlockArgs};
use crate::commands::common::{load_project, open_target};

/// Execute the unlock command
pub async fn execute(_args: &UnlockArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let db = open_target(&project)?;

    match db
        .force_unlock()
        .context("Failed to release the migration lock")?
    {
        Some(holder) => println!("Released migration lock held by {holder}"),
        None => println!("No migration lock is held"),
    }
    Ok(())
}
