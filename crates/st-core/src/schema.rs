//! Table schemas.

use crate::column::ColumnSpec;
use crate::error::{CoreError, CoreResult};
use serde::Serialize;

/// Ordered columns of a table plus its primary key.
///
/// Invariants, enforced by every constructor and mutator:
/// - column names are unique;
/// - every primary-key column appears exactly once in `columns`;
/// - every primary-key column is NOT NULL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    name: String,
    columns: Vec<ColumnSpec>,
    primary_key: Vec<String>,
}

impl TableSchema {
    /// Build a schema, validating its invariants.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<ColumnSpec>,
        primary_key: Vec<String>,
    ) -> CoreResult<Self> {
        let schema = Self {
            name: name.into(),
            columns,
            primary_key,
        };
        schema.validate()?;
        Ok(schema)
    }

    fn validate(&self) -> CoreResult<()> {
        for (i, col) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|c| c.name == col.name) {
                return Err(self.invalid(format!("duplicate column '{}'", col.name)));
            }
        }
        for (i, key) in self.primary_key.iter().enumerate() {
            if self.primary_key[..i].contains(key) {
                return Err(self.invalid(format!("column '{key}' listed twice in primary key")));
            }
            match self.column(key) {
                None => {
                    return Err(self.invalid(format!(
                        "primary key column '{key}' is not a column of the table"
                    )))
                }
                Some(col) if col.nullable => {
                    return Err(self.invalid(format!("primary key column '{key}' must be NOT NULL")))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn invalid(&self, message: String) -> CoreError {
        CoreError::InvalidSchema {
            table: self.name.clone(),
            message,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn is_primary_key(&self, column: &str) -> bool {
        self.primary_key.iter().any(|k| k == column)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Append a column at the end of the table.
    pub fn add_column(&mut self, column: ColumnSpec) -> CoreResult<()> {
        if self.has_column(&column.name) {
            return Err(self.invalid(format!("column '{}' already exists", column.name)));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Remove a column. Primary-key columns cannot be dropped.
    pub fn drop_column(&mut self, name: &str) -> CoreResult<ColumnSpec> {
        if self.is_primary_key(name) {
            return Err(self.invalid(format!("cannot drop primary key column '{name}'")));
        }
        let Some(pos) = self.columns.iter().position(|c| c.name == name) else {
            return Err(self.invalid(format!("column '{name}' does not exist")));
        };
        Ok(self.columns.remove(pos))
    }
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;
