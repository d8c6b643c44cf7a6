use super::*;
use clap::CommandFactory;

#[test]
fn test_cli_definition_is_valid() {
    Cli::command().debug_assert();
}

#[test]
fn test_global_args_defaults() {
    let cli = Cli::try_parse_from(["st", "status"]).unwrap();
    assert_eq!(cli.global.project_dir, ".");
    assert!(!cli.global.verbose);
    assert!(cli.global.config.is_none());
    assert!(matches!(
        cli.command,
        Commands::Status(StatusArgs {
            output: OutputFormat::Text
        })
    ));
}

#[test]
fn test_global_args_after_subcommand() {
    let cli = Cli::try_parse_from([
        "st",
        "migrate",
        "-p",
        "project",
        "--database",
        "target.duckdb",
        "-v",
    ])
    .unwrap();
    assert_eq!(cli.global.project_dir, "project");
    assert_eq!(cli.global.database.as_deref(), Some("target.duckdb"));
    assert!(cli.global.verbose);
}

#[test]
fn test_migrate_args() {
    let cli = Cli::try_parse_from([
        "st",
        "migrate",
        "--dry-run",
        "--timeout",
        "5",
        "-o",
        "json",
    ])
    .unwrap();
    match cli.command {
        Commands::Migrate(args) => {
            assert!(args.dry_run);
            assert_eq!(args.timeout, Some(5));
            assert_eq!(args.output, OutputFormat::Json);
        }
        other => panic!("expected migrate, got {other:?}"),
    }
}

#[test]
fn test_migrate_rejects_zero_timeout() {
    let err = Cli::try_parse_from(["st", "migrate", "--timeout", "0"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    assert!(Cli::try_parse_from(["st", "migrate", "--timeout", "1"]).is_ok());
}

#[test]
fn test_diff_tables() {
    let cli = Cli::try_parse_from(["st", "diff", "--tables", "users,orders"]).unwrap();
    match cli.command {
        Commands::Diff(args) => assert_eq!(args.tables.as_deref(), Some("users,orders")),
        other => panic!("expected diff, got {other:?}"),
    }
}

#[test]
fn test_unknown_subcommand_rejected() {
    assert!(Cli::try_parse_from(["st", "rollback"]).is_err());
}
