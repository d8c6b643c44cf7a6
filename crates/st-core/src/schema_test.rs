use super::*;
use crate::column::{ColumnType, DefaultValue};

fn base_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("id", ColumnType::Int).not_null().auto_increment(),
        ColumnSpec::new("email", ColumnType::Varchar(Some(255)))
            .not_null()
            .unique(),
        ColumnSpec::new("name", ColumnType::Varchar(Some(255))),
    ]
}

#[test]
fn test_valid_schema() {
    let schema = TableSchema::new("users", base_columns(), vec!["id".into()]).unwrap();
    assert_eq!(schema.name(), "users");
    assert_eq!(schema.column_names(), vec!["id", "email", "name"]);
    assert!(schema.is_primary_key("id"));
    assert!(!schema.is_primary_key("email"));
}

#[test]
fn test_primary_key_must_exist() {
    let err = TableSchema::new("users", base_columns(), vec!["user_id".into()]).unwrap_err();
    assert!(matches!(err, CoreError::InvalidSchema { .. }));
    assert!(err.to_string().contains("user_id"));
}

#[test]
fn test_primary_key_must_be_not_null() {
    let cols = vec![ColumnSpec::new("id", ColumnType::Int)];
    let err = TableSchema::new("t", cols, vec!["id".into()]).unwrap_err();
    assert!(err.to_string().contains("NOT NULL"));
}

#[test]
fn test_primary_key_listed_once() {
    let err = TableSchema::new("users", base_columns(), vec!["id".into(), "id".into()])
        .unwrap_err();
    assert!(err.to_string().contains("twice"));
}

#[test]
fn test_duplicate_column_rejected() {
    let mut cols = base_columns();
    cols.push(ColumnSpec::new("email", ColumnType::Text));
    assert!(TableSchema::new("users", cols, vec![]).is_err());
}

#[test]
fn test_table_without_primary_key_is_allowed() {
    let schema = TableSchema::new("log", vec![ColumnSpec::new("msg", ColumnType::Text)], vec![])
        .unwrap();
    assert!(schema.primary_key().is_empty());
}

#[test]
fn test_add_and_drop_column() {
    let mut schema = TableSchema::new("users", base_columns(), vec!["id".into()]).unwrap();
    let country = ColumnSpec::new(
        "country",
        ColumnType::Enum(vec!["US".into(), "CO".into(), "TN".into()]),
    )
    .with_default(DefaultValue::Str("US".into()));
    schema.add_column(country.clone()).unwrap();
    assert_eq!(schema.columns().last(), Some(&country));
    assert!(schema.add_column(country).is_err());

    let dropped = schema.drop_column("name").unwrap();
    assert_eq!(dropped.name, "name");
    assert_eq!(schema.column_names(), vec!["id", "email", "country"]);
}

#[test]
fn test_cannot_drop_primary_key_or_missing_column() {
    let mut schema = TableSchema::new("users", base_columns(), vec!["id".into()]).unwrap();
    assert!(schema.drop_column("id").is_err());
    assert!(schema.drop_column("missing").is_err());
    assert_eq!(schema.columns().len(), 3);
}
