//! Column types and column specifications.
//!
//! [`ColumnSpec`] is the unit both the parser (expected schema) and the
//! DuckDB inspector (observed schema) produce, so drift detection can compare
//! the two directly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical column type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "args", rename_all = "snake_case")]
pub enum ColumnType {
    /// 32-bit integer (`INT`, `INTEGER`)
    Int,
    /// 64-bit integer (`BIGINT`)
    BigInt,
    /// Variable-length string with an optional declared maximum length.
    ///
    /// Targets that do not retain the length report `Varchar(None)`.
    Varchar(Option<u32>),
    /// Unbounded string (`TEXT`)
    Text,
    /// `BOOLEAN`
    Boolean,
    /// `TIMESTAMP` / `DATETIME`
    Timestamp,
    /// String restricted to a fixed set of values, in declaration order.
    Enum(Vec<String>),
    /// A target type Stratum does not model, kept by name (e.g. `DOUBLE`).
    ///
    /// Only produced by inspection; migrations cannot declare it.
    Other(String),
}

/// Broad type family used to tell a type change apart from a constraint change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeFamily {
    Integer,
    BigInteger,
    String,
    Boolean,
    Timestamp,
    Other,
}

impl ColumnType {
    /// The family this type belongs to. `VARCHAR`, `TEXT` and `ENUM` are all
    /// strings; an enum is a string with a value constraint.
    pub fn family(&self) -> TypeFamily {
        match self {
            ColumnType::Int => TypeFamily::Integer,
            ColumnType::BigInt => TypeFamily::BigInteger,
            ColumnType::Varchar(_) | ColumnType::Text | ColumnType::Enum(_) => TypeFamily::String,
            ColumnType::Boolean => TypeFamily::Boolean,
            ColumnType::Timestamp => TypeFamily::Timestamp,
            ColumnType::Other(_) => TypeFamily::Other,
        }
    }

    /// Whether an observed type satisfies this expected type.
    ///
    /// An unknown `VARCHAR` length on either side matches any length, and
    /// `TEXT` is interchangeable with an unbounded `VARCHAR`.
    pub fn is_satisfied_by(&self, observed: &ColumnType) -> bool {
        match (self, observed) {
            (ColumnType::Varchar(a), ColumnType::Varchar(b)) => {
                a.is_none() || b.is_none() || a == b
            }
            (ColumnType::Text, ColumnType::Varchar(None))
            | (ColumnType::Varchar(None), ColumnType::Text) => true,
            (ColumnType::Text, ColumnType::Varchar(Some(_)))
            | (ColumnType::Varchar(Some(_)), ColumnType::Text) => false,
            (a, b) => a == b,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, ColumnType::Int | ColumnType::BigInt)
    }

    /// Enum members, if this is an enum type.
    pub fn enum_values(&self) -> Option<&[String]> {
        match self {
            ColumnType::Enum(values) => Some(values),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Int => f.write_str("INT"),
            ColumnType::BigInt => f.write_str("BIGINT"),
            ColumnType::Varchar(Some(n)) => write!(f, "VARCHAR({n})"),
            ColumnType::Varchar(None) => f.write_str("VARCHAR"),
            ColumnType::Text => f.write_str("TEXT"),
            ColumnType::Boolean => f.write_str("BOOLEAN"),
            ColumnType::Timestamp => f.write_str("TIMESTAMP"),
            ColumnType::Other(name) => f.write_str(name),
            ColumnType::Enum(values) => {
                f.write_str("ENUM(")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", quote_literal(v))?;
                }
                f.write_str(")")
            }
        }
    }
}

/// A column default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DefaultValue {
    /// String literal (stored unquoted)
    Str(String),
    /// Numeric literal, kept in its source spelling
    Number(String),
    Boolean(bool),
    CurrentTimestamp,
    /// Any other default expression, kept verbatim
    Expression(String),
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Str(s) => f.write_str(&quote_literal(s)),
            DefaultValue::Number(n) => f.write_str(n),
            DefaultValue::Boolean(true) => f.write_str("TRUE"),
            DefaultValue::Boolean(false) => f.write_str("FALSE"),
            DefaultValue::CurrentTimestamp => f.write_str("CURRENT_TIMESTAMP"),
            DefaultValue::Expression(expr) => f.write_str(expr),
        }
    }
}

/// Quote a string as a single-quoted SQL literal.
pub fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// A single column of a table, as declared or as observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub auto_increment: bool,
}

impl ColumnSpec {
    /// A nullable column with no default or constraints.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            default: None,
            unique: false,
            auto_increment: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }
}

impl fmt::Display for ColumnSpec {
    /// Renders the column in the DDL form migrations are written in.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.column_type)?;
        if !self.nullable {
            f.write_str(" NOT NULL")?;
        }
        if self.auto_increment {
            f.write_str(" AUTO_INCREMENT")?;
        }
        if let Some(default) = &self.default {
            write!(f, " DEFAULT {default}")?;
        }
        if self.unique {
            f.write_str(" UNIQUE")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "column_test.rs"]
mod tests;
