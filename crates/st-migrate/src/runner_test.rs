use super::*;
use crate::drift::diff;
use crate::expected::expected_schemas;
use crate::loader::{Loader, StaticSource};
use st_core::TableSchema;

const USERS_V1: &str = "CREATE TABLE IF NOT EXISTS users (
    id INT NOT NULL AUTO_INCREMENT,
    email VARCHAR(255) NOT NULL UNIQUE,
    name VARCHAR(255),
    PRIMARY KEY (id)
);";

const USERS_V2: &str = "CREATE TABLE IF NOT EXISTS users (
    id INT NOT NULL AUTO_INCREMENT,
    email VARCHAR(255) NOT NULL UNIQUE,
    name VARCHAR(255),
    country ENUM('US','CO','TN') DEFAULT 'US',
    PRIMARY KEY (id)
);";

fn load(source: StaticSource) -> Vec<MigrationDefinition> {
    Loader::new(source).load_all().unwrap()
}

fn users_migrations() -> Vec<MigrationDefinition> {
    load(
        StaticSource::new()
            .with("0001_create_users", USERS_V1)
            .with("0002_users_country", USERS_V2),
    )
}

fn ids(ids: &[MigrationId]) -> Vec<&str> {
    ids.iter().map(|id| id.as_str()).collect()
}

fn live_users(db: &TargetDb) -> TableSchema {
    db.inspect("users").unwrap().expect("users table exists")
}

#[tokio::test]
async fn test_applies_in_order_and_records() {
    let db = TargetDb::in_memory().unwrap();
    let runner = Runner::new(db.clone(), users_migrations());

    let applied = runner.run_pending().await.unwrap();
    assert_eq!(ids(&applied), vec!["0001_create_users", "0002_users_country"]);

    let records = db.list_applied().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].sequence, 1);
    assert_eq!(records[1].id.as_str(), "0002_users_country");
    assert_eq!(records[1].checksum, runner.definitions()[1].checksum);
    assert!(live_users(&db).has_column("country"));
    assert_eq!(db.lock_holder().unwrap(), None);
}

#[tokio::test]
async fn test_second_run_is_noop() {
    let db = TargetDb::in_memory().unwrap();
    let runner = Runner::new(db.clone(), users_migrations());
    runner.run_pending().await.unwrap();
    let schema_after_first = live_users(&db);
    let records_after_first = db.list_applied().unwrap();

    let report = runner.run().await.unwrap();
    assert!(report.is_noop());
    assert_eq!(report.already_applied, 2);
    assert_eq!(live_users(&db), schema_after_first);
    assert_eq!(db.list_applied().unwrap(), records_after_first);
}

#[tokio::test]
async fn test_sequential_and_direct_paths_converge() {
    let sequential = TargetDb::in_memory().unwrap();
    let all = users_migrations();
    Runner::new(sequential.clone(), all[..1].to_vec())
        .run_pending()
        .await
        .unwrap();
    let report = Runner::new(sequential.clone(), all.clone()).run().await.unwrap();
    assert_eq!(ids(&report.applied_ids()), vec!["0002_users_country"]);
    assert_eq!(report.warnings().count(), 0);

    let direct = TargetDb::in_memory().unwrap();
    let extended_only = load(StaticSource::new().with("0001_users", USERS_V2));
    Runner::new(direct.clone(), extended_only.clone())
        .run_pending()
        .await
        .unwrap();

    assert_eq!(live_users(&sequential), live_users(&direct));

    let model = expected_schemas(&extended_only);
    let expected = model.table("users").unwrap();
    assert!(diff(expected, &live_users(&sequential)).is_empty());
    assert!(diff(expected, &live_users(&direct)).is_empty());
}

#[tokio::test]
async fn test_reconciliation_reports_unfixable_drift() {
    let db = TargetDb::in_memory().unwrap();
    Runner::new(db.clone(), load(StaticSource::new().with("0001_users", USERS_V2)))
        .run_pending()
        .await
        .unwrap();

    // A later migration re-declares the table without `country`.
    let defs = load(
        StaticSource::new()
            .with("0001_users", USERS_V2)
            .with("0002_users_again", USERS_V1),
    );
    let report = Runner::new(db.clone(), defs).run().await.unwrap();
    let warnings: Vec<&str> = report.warnings().collect();
    assert_eq!(warnings, vec!["users: - country"]);
    assert!(live_users(&db).has_column("country"));
}

#[tokio::test]
async fn test_failure_keeps_prefix() {
    let db = TargetDb::in_memory().unwrap();
    let defs = load(
        StaticSource::new()
            .with("0001_users", USERS_V1)
            .with(
                "0002_broken",
                "CREATE TABLE audit (id INT); ALTER TABLE missing ADD COLUMN x INT;",
            )
            .with("0003_orders", "CREATE TABLE orders (id INT PRIMARY KEY)"),
    );
    let runner = Runner::new(db.clone(), defs);

    let err = runner.run_pending().await.unwrap_err();
    assert!(matches!(err, RunnerError::Execution { .. }), "{err}");
    assert_eq!(err.failed_migration().map(|id| id.as_str()), Some("0002_broken"));

    let recorded: Vec<MigrationId> = db.list_applied().unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids(&recorded), vec!["0001_users"]);
    assert!(!db.table_exists("audit").unwrap());
    assert!(!db.table_exists("orders").unwrap());
    assert_eq!(db.lock_holder().unwrap(), None);

    let status = runner.status().unwrap();
    let states: Vec<MigrationState> = status.iter().map(|s| s.state).collect();
    assert_eq!(
        states,
        vec![
            MigrationState::Applied,
            MigrationState::Pending,
            MigrationState::Pending
        ]
    );
}

#[tokio::test]
async fn test_preflight_rejects_existing_table() {
    let db = TargetDb::in_memory().unwrap();
    db.execute_batch("CREATE TABLE orders (id INTEGER)").unwrap();
    let runner = Runner::new(
        db.clone(),
        load(StaticSource::new().with("0001_orders", "CREATE TABLE orders (id INT, total INT)")),
    );

    let err = runner.run_pending().await.unwrap_err();
    assert!(err.to_string().contains("preflight failed"), "{err}");
    assert!(db.list_applied().unwrap().is_empty());
}

#[tokio::test]
async fn test_lock_held_blocks_run() {
    let db = TargetDb::in_memory().unwrap();
    let held = db.acquire_lock().unwrap();

    let err = Runner::new(db.clone(), users_migrations())
        .run_pending()
        .await
        .unwrap_err();
    match &err {
        RunnerError::LockHeld { holder } => assert_eq!(holder, held.holder()),
        other => panic!("expected LockHeld, got {other}"),
    }
    assert!(err.is_retryable());
    assert!(!db.table_exists("users").unwrap());
    assert!(db.list_applied().unwrap().is_empty());
}

#[tokio::test]
async fn test_modified_applied_migration_is_rejected() {
    let db = TargetDb::in_memory().unwrap();
    Runner::new(db.clone(), load(StaticSource::new().with("0001_users", USERS_V1)))
        .run_pending()
        .await
        .unwrap();

    let edited = load(StaticSource::new().with("0001_users", USERS_V2));
    let err = Runner::new(db.clone(), edited).run_pending().await.unwrap_err();
    assert!(matches!(err, RunnerError::ChecksumMismatch { .. }), "{err}");
    assert!(!live_users(&db).has_column("country"));
}

#[tokio::test]
async fn test_removed_migration_diverges() {
    let db = TargetDb::in_memory().unwrap();
    Runner::new(db.clone(), users_migrations())
        .run_pending()
        .await
        .unwrap();

    let fewer = load(StaticSource::new().with("0002_users_country", USERS_V2));
    let err = Runner::new(db, fewer).plan().unwrap_err();
    assert!(matches!(err, RunnerError::HistoryDiverged { position: 1, .. }));
}

#[tokio::test]
async fn test_plan_lists_pending_without_applying() {
    let db = TargetDb::in_memory().unwrap();
    let runner = Runner::new(db.clone(), users_migrations());
    let plan: Vec<&str> = runner.plan().unwrap().iter().map(|d| d.id.as_str()).collect();
    assert_eq!(plan, vec!["0001_create_users", "0002_users_country"]);
    assert!(!db.table_exists("users").unwrap());
}

#[tokio::test]
async fn test_cancelled_before_first_migration() {
    let db = TargetDb::in_memory().unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = Runner::new(db.clone(), users_migrations())
        .with_cancel_token(cancel)
        .run_pending()
        .await
        .unwrap_err();
    assert!(
        matches!(err, RunnerError::Cancelled { ref next } if next.as_str() == "0001_create_users")
    );
    assert!(db.list_applied().unwrap().is_empty());
    assert_eq!(db.lock_holder().unwrap(), None);
}

#[tokio::test]
async fn test_timeout_rolls_back() {
    let db = TargetDb::in_memory().unwrap();
    let sql: String = (0..200)
        .map(|i| format!("CREATE TABLE IF NOT EXISTS t{i} (id INT, v TEXT);\n"))
        .collect();
    let runner = Runner::new(db.clone(), load(StaticSource::new().with("0001_many", &sql)))
        .with_timeout(Duration::from_millis(1));

    let err = runner.run_pending().await.unwrap_err();
    assert!(matches!(err, RunnerError::Timeout { .. }), "{err}");

    // Waits on the abandoned worker's connection use, so it sees the rollback.
    assert!(db.list_applied().unwrap().is_empty());
    assert!(!db.table_exists("t0").unwrap());

    let mut released = false;
    for _ in 0..100 {
        if db.lock_holder().unwrap().is_none() {
            released = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(released, "lock released after the abandoned worker finished");
}

#[tokio::test]
async fn test_record_store_guard_runs_before_execution() {
    let db = TargetDb::in_memory().unwrap();
    let defs = load(StaticSource::new().with("0001_orders", "CREATE TABLE orders (id INT)"));
    db.ensure_tracking_table().unwrap();

    // Simulate a record written by a concurrent runner after history was read.
    let gate = CommitGate::new();
    let err = db
        .unit_of_work(&gate, |session| {
            session.record_applied(&st_core::NewRecord::for_definition(&defs[0], 1))?;
            apply_definition(session, &defs[0], Instant::now()).map(|_| ())
        })
        .unwrap_err();
    assert!(matches!(err, st_db::DbError::DuplicateRecord { .. }));
    assert!(!db.table_exists("orders").unwrap());
}
