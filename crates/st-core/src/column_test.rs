use super::*;

#[test]
fn test_type_display() {
    assert_eq!(ColumnType::Int.to_string(), "INT");
    assert_eq!(ColumnType::Varchar(Some(255)).to_string(), "VARCHAR(255)");
    assert_eq!(ColumnType::Varchar(None).to_string(), "VARCHAR");
    assert_eq!(
        ColumnType::Enum(vec!["US".into(), "CO".into(), "TN".into()]).to_string(),
        "ENUM('US', 'CO', 'TN')"
    );
}

#[test]
fn test_enum_literal_escaping() {
    let ty = ColumnType::Enum(vec!["it's".into()]);
    assert_eq!(ty.to_string(), "ENUM('it''s')");
}

#[test]
fn test_families() {
    assert_eq!(ColumnType::Varchar(Some(10)).family(), TypeFamily::String);
    assert_eq!(ColumnType::Enum(vec!["a".into()]).family(), TypeFamily::String);
    assert_eq!(ColumnType::Text.family(), TypeFamily::String);
    assert_eq!(ColumnType::Int.family(), TypeFamily::Integer);
    assert_ne!(ColumnType::Int.family(), ColumnType::BigInt.family());
}

#[test]
fn test_varchar_length_unknown_is_satisfied() {
    let expected = ColumnType::Varchar(Some(255));
    assert!(expected.is_satisfied_by(&ColumnType::Varchar(None)));
    assert!(expected.is_satisfied_by(&ColumnType::Varchar(Some(255))));
    assert!(!expected.is_satisfied_by(&ColumnType::Varchar(Some(64))));
    assert!(!expected.is_satisfied_by(&ColumnType::Text));
}

#[test]
fn test_text_matches_unbounded_varchar() {
    assert!(ColumnType::Text.is_satisfied_by(&ColumnType::Varchar(None)));
    assert!(ColumnType::Varchar(None).is_satisfied_by(&ColumnType::Text));
}

#[test]
fn test_enum_values_must_match_in_order() {
    let expected = ColumnType::Enum(vec!["US".into(), "CO".into()]);
    assert!(expected.is_satisfied_by(&ColumnType::Enum(vec!["US".into(), "CO".into()])));
    assert!(!expected.is_satisfied_by(&ColumnType::Enum(vec!["CO".into(), "US".into()])));
    assert!(!expected.is_satisfied_by(&ColumnType::Varchar(None)));
}

#[test]
fn test_column_builder_and_display() {
    let id = ColumnSpec::new("id", ColumnType::Int).not_null().auto_increment();
    assert!(!id.nullable);
    assert!(id.auto_increment);
    assert_eq!(id.to_string(), "id INT NOT NULL AUTO_INCREMENT");

    let country = ColumnSpec::new(
        "country",
        ColumnType::Enum(vec!["US".into(), "CO".into(), "TN".into()]),
    )
    .with_default(DefaultValue::Str("US".into()));
    assert_eq!(
        country.to_string(),
        "country ENUM('US', 'CO', 'TN') DEFAULT 'US'"
    );
}

#[test]
fn test_default_display() {
    assert_eq!(DefaultValue::Number("42".into()).to_string(), "42");
    assert_eq!(DefaultValue::Boolean(false).to_string(), "FALSE");
    assert_eq!(DefaultValue::CurrentTimestamp.to_string(), "CURRENT_TIMESTAMP");
}

#[test]
fn test_column_serializes_to_json() {
    let col = ColumnSpec::new("email", ColumnType::Varchar(Some(255)))
        .not_null()
        .unique();
    let json = serde_json::to_value(&col).unwrap();
    assert_eq!(json["name"], "email");
    assert_eq!(json["column_type"]["kind"], "varchar");
    assert_eq!(json["column_type"]["args"], 255);
    assert_eq!(json["unique"], true);
    assert!(json.get("default").is_none());
}
