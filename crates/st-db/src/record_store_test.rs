use super::*;

fn new_record(id: &str, checksum: &str) -> NewRecord {
    NewRecord {
        id: MigrationId::new(id),
        checksum: checksum.to_string(),
        execution_ms: 42,
    }
}

#[test]
fn test_empty_store_without_table() {
    let db = TargetDb::in_memory().unwrap();
    assert!(db.list_applied().unwrap().is_empty());
    assert!(!db.has_applied(&MigrationId::new("0001_a")).unwrap());
}

#[test]
fn test_record_and_list_in_order() {
    let db = TargetDb::in_memory().unwrap();
    let before = Utc::now() - chrono::Duration::seconds(1);
    let first = db.record_applied(&new_record("0002_b", "x")).unwrap();
    let second = db.record_applied(&new_record("0001_a", "y")).unwrap();
    assert_eq!(first.sequence, 1);
    assert_eq!(second.sequence, 2);
    assert!(first.applied_at >= before);

    let listed = db.list_applied().unwrap();
    assert_eq!(listed, vec![first, second]);
    assert_eq!(listed[0].execution_ms, 42);
    assert!(db.has_applied(&MigrationId::new("0001_a")).unwrap());
}

#[test]
fn test_duplicate_record_rejected() {
    let db = TargetDb::in_memory().unwrap();
    db.record_applied(&new_record("0001_a", "x")).unwrap();

    let err = db.record_applied(&new_record("0001_a", "x")).unwrap_err();
    assert!(matches!(err, DbError::DuplicateRecord { ref id } if id == "0001_a"));
    assert_eq!(db.list_applied().unwrap().len(), 1);
}

#[test]
fn test_duplicate_key_message_is_recognised() {
    let db = TargetDb::in_memory().unwrap();
    db.ensure_tracking_table().unwrap();
    let conn = db.lock_conn().unwrap();
    let insert = "INSERT INTO stratum_migrations \
                  VALUES ('0001_a', 1, 'x', TIMESTAMP '2026-01-01 00:00:00', 1)";
    conn.execute_batch(insert).unwrap();
    let err = conn.execute_batch(insert).unwrap_err();
    assert!(is_duplicate_key(&err.to_string()), "{err}");
    assert!(!is_duplicate_key("Catalog Error: Table with name t does not exist"));
}

#[test]
fn test_corrupt_row_reported() {
    let db = TargetDb::in_memory().unwrap();
    db.ensure_tracking_table().unwrap();
    db.execute_batch(
        "INSERT INTO stratum_migrations \
         VALUES ('0001_a', 1, 'x', TIMESTAMP '2026-01-01 00:00:00', -5)",
    )
    .unwrap();
    assert!(matches!(
        db.list_applied(),
        Err(DbError::CorruptRecord { .. })
    ));
}

#[test]
fn test_timestamp_roundtrip_through_duckdb() {
    let db = TargetDb::in_memory().unwrap();
    db.ensure_tracking_table().unwrap();
    db.execute_batch(
        "INSERT INTO stratum_migrations \
         VALUES ('0001_a', 1, 'x', TIMESTAMP '2026-03-04 05:06:07.250', 9)",
    )
    .unwrap();
    let record = &db.list_applied().unwrap()[0];
    assert_eq!(
        record.applied_at.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        "2026-03-04 05:06:07.250"
    );
}
