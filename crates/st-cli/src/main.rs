//! Stratum CLI - idempotent schema migrations for DuckDB

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::Cli;
use commands::common::ExitCode;
use commands::{diff, history, migrate, status, unlock, validate};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let result = match &cli.command {
        cli::Commands::Migrate(args) => migrate::execute(args, &cli.global).await,
        cli::Commands::Status(args) => status::execute(args, &cli.global).await,
        cli::Commands::History(args) => history::execute(args, &cli.global).await,
        cli::Commands::Diff(args) => diff::execute(args, &cli.global).await,
        cli::Commands::Validate(args) => validate::execute(args, &cli.global).await,
        cli::Commands::Unlock(args) => unlock::execute(args, &cli.global).await,
    };

    match result {
        Err(err) => match err.downcast_ref::<ExitCode>() {
            Some(ExitCode(code)) => std::process::exit(*code),
            None => Err(err),
        },
        ok => ok,
    }
}

/// Route `log` records from the library crates to stderr.
fn init_logging(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .without_time()
        .try_init();
}

fn log_filter(verbose: bool) -> EnvFilter {
    EnvFilter::new(if verbose { "debug" } else { "info" })
}
