//! End-to-end migration of the `users` table from a migrations directory
//! into an on-disk DuckDB database.

use st_core::{ColumnType, DefaultValue};
use st_db::{RecordStore, TargetDb};
use st_migrate::{expected_schemas, DriftDetector, Loader, Runner, SchemaDelta};
use std::path::Path;

const USERS_V1: &str = "-- base users table
CREATE TABLE IF NOT EXISTS users (
    id INT NOT NULL AUTO_INCREMENT,
    email VARCHAR(255) NOT NULL UNIQUE,
    name VARCHAR(255),
    PRIMARY KEY (id)
);
";

const USERS_V2: &str = "-- users with country
CREATE TABLE IF NOT EXISTS users (
    id INT NOT NULL AUTO_INCREMENT,
    email VARCHAR(255) NOT NULL UNIQUE,
    name VARCHAR(255),
    country ENUM('US','CO','TN') DEFAULT 'US',
    PRIMARY KEY (id)
);
";

fn write_migrations(dir: &Path, files: &[(&str, &str)]) {
    std::fs::create_dir_all(dir).unwrap();
    for (name, sql) in files {
        std::fs::write(dir.join(name), sql).unwrap();
    }
}

#[tokio::test]
async fn test_migrate_directory_across_reopens() {
    let tmp = tempfile::tempdir().unwrap();
    let migrations = tmp.path().join("migrations");
    let db_path = tmp.path().join("app.duckdb");
    let db_path = db_path.to_str().unwrap();

    write_migrations(&migrations, &[("0001_create_users.sql", USERS_V1)]);
    {
        let db = TargetDb::open(db_path).unwrap();
        let defs = Loader::from_dir(&migrations).load_all().unwrap();
        let applied = Runner::new(db, defs).run_pending().await.unwrap();
        assert_eq!(applied.len(), 1);
    }

    // The extended definition ships later as a second migration.
    write_migrations(&migrations, &[("0002_users_country.sql", USERS_V2)]);
    let db = TargetDb::open(db_path).unwrap();
    let defs = Loader::from_dir(&migrations).load_all().unwrap();

    let detector = DriftDetector::new(db.clone());
    let model = expected_schemas(&defs);
    let before = detector.check(model.table("users").unwrap()).unwrap();
    assert_eq!(before.deltas.len(), 1);
    assert!(matches!(&before.deltas[0], SchemaDelta::ColumnAdded(c) if c.name == "country"));

    let runner = Runner::new(db.clone(), defs);
    let applied = runner.run_pending().await.unwrap();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].as_str(), "0002_users_country");
    assert!(runner.run_pending().await.unwrap().is_empty());

    let after = detector.check(model.table("users").unwrap()).unwrap();
    assert!(after.is_clean(), "{:?}", after.deltas);

    let users = detector.inspect("users").unwrap();
    let country = users.column("country").unwrap();
    assert_eq!(
        country.column_type,
        ColumnType::Enum(vec!["US".into(), "CO".into(), "TN".into()])
    );
    assert_eq!(country.default, Some(DefaultValue::Str("US".into())));
    assert_eq!(db.list_applied().unwrap().len(), 2);
}

#[tokio::test]
async fn test_auto_increment_and_default_behave() {
    let tmp = tempfile::tempdir().unwrap();
    write_migrations(tmp.path(), &[("0001_users.sql", USERS_V2)]);
    let db = TargetDb::in_memory().unwrap();
    let defs = Loader::from_dir(tmp.path()).load_all().unwrap();
    Runner::new(db.clone(), defs).run_pending().await.unwrap();

    // `id` is filled from its sequence, `country` from its default.
    db.execute_batch(
        "INSERT INTO users (email, name) VALUES ('a@example.com', 'A');
         INSERT INTO users (email) VALUES ('b@example.com');",
    )
    .unwrap();
    // Unique email is enforced.
    assert!(db
        .execute_batch("INSERT INTO users (email) VALUES ('a@example.com')")
        .is_err());
    // Values outside the enum are rejected.
    assert!(db
        .execute_batch("INSERT INTO users (email, country) VALUES ('c@example.com', 'FR')")
        .is_err());
}

#[tokio::test]
async fn test_demo_project_migrations_converge() {
    let demo = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/migrations");
    let defs = Loader::from_dir(&demo).load_all().unwrap();
    assert_eq!(defs.len(), 2);
    assert!(defs.iter().all(|d| d.is_idempotent));

    let db = TargetDb::in_memory().unwrap();
    let model = expected_schemas(&defs);
    let runner = Runner::new(db.clone(), defs);
    let report = runner.run().await.unwrap();
    assert_eq!(report.applied.len(), 2);
    assert_eq!(report.warnings().count(), 0);

    let drift = DriftDetector::new(db)
        .check(model.table("users").unwrap())
        .unwrap();
    assert!(drift.is_clean(), "{:?}", drift.deltas);
}
