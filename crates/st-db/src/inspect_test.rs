use super::*;
use st_core::{ColumnType, DefaultValue};

fn conn_with(sql: &str) -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(sql).unwrap();
    conn
}

#[test]
fn test_missing_table() {
    let conn = conn_with("SELECT 1");
    assert!(!table_exists(&conn, "users").unwrap());
    assert!(inspect_table(&conn, "users").unwrap().is_none());
}

#[test]
fn test_table_name_matches_case_insensitively() {
    let conn = conn_with("CREATE TABLE Users (id INTEGER PRIMARY KEY, email VARCHAR UNIQUE)");
    assert!(table_exists(&conn, "users").unwrap());
    assert!(table_exists(&conn, "USERS").unwrap());

    let table = inspect_table(&conn, "users").unwrap().unwrap();
    assert_eq!(table.column_names(), vec!["id", "email"]);
    assert_eq!(table.primary_key(), ["id".to_string()]);
    assert!(table.column("email").unwrap().unique);
}

#[test]
fn test_inspect_users_table() {
    let conn = conn_with(
        "CREATE SEQUENCE users_id_seq;
         CREATE TABLE users (
             id INTEGER DEFAULT nextval('users_id_seq') NOT NULL,
             email VARCHAR(255) NOT NULL UNIQUE,
             name VARCHAR(255),
             country ENUM('US', 'CO', 'TN') DEFAULT 'US',
             PRIMARY KEY (id)
         );",
    );
    let table = inspect_table(&conn, "users").unwrap().unwrap();
    assert_eq!(table.column_names(), vec!["id", "email", "name", "country"]);
    assert_eq!(table.primary_key(), ["id".to_string()]);

    let id = table.column("id").unwrap();
    assert_eq!(id.column_type, ColumnType::Int);
    assert!(!id.nullable);
    assert!(id.auto_increment);
    assert_eq!(id.default, None);

    let email = table.column("email").unwrap();
    assert_eq!(email.column_type, ColumnType::Varchar(None));
    assert!(!email.nullable);
    assert!(email.unique);

    let name = table.column("name").unwrap();
    assert!(name.nullable);
    assert!(!name.unique);

    let country = table.column("country").unwrap();
    assert_eq!(
        country.column_type,
        ColumnType::Enum(vec!["US".into(), "CO".into(), "TN".into()])
    );
    assert_eq!(country.default, Some(DefaultValue::Str("US".into())));
}

#[test]
fn test_composite_unique_not_attributed_to_columns() {
    let conn = conn_with("CREATE TABLE t (a INTEGER, b INTEGER, UNIQUE (a, b))");
    let table = inspect_table(&conn, "t").unwrap().unwrap();
    assert!(table.columns().iter().all(|c| !c.unique));
    assert!(table.primary_key().is_empty());
}

#[test]
fn test_unmodelled_types_are_kept() {
    let conn = conn_with("CREATE TABLE m (amount DOUBLE, created TIMESTAMP DEFAULT now())");
    let table = inspect_table(&conn, "m").unwrap().unwrap();
    assert_eq!(
        table.column("amount").unwrap().column_type,
        ColumnType::Other("DOUBLE".to_string())
    );
    assert_eq!(
        table.column("created").unwrap().default,
        Some(DefaultValue::CurrentTimestamp)
    );
}

#[test]
fn test_list_tables_sorted() {
    let conn = conn_with("CREATE TABLE b (x INTEGER); CREATE TABLE a (x INTEGER);");
    assert_eq!(list_tables(&conn).unwrap(), vec!["a", "b"]);
}
