//! Drift detection between expected and live table definitions.
//!
//! Nothing here writes to the target. Deltas are classified by how the runner
//! treats them:
//!
//! | Delta | Class | Runner behaviour |
//! |---|---|---|
//! | `ColumnAdded` | pending | added by `CREATE TABLE IF NOT EXISTS` reconciliation |
//! | `ConstraintChanged` | warning | reported, never changed |
//! | `ColumnTypeChanged`, `ColumnRemoved` | conflict | reported, never changed |

use crate::error::DriftError;
use crate::expected::SchemaModel;
use serde::Serialize;
use st_core::{ColumnSpec, ColumnType, DefaultValue, TableSchema};
use st_db::TargetDb;
use std::fmt;

/// Which column constraint differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Nullability,
    Unique,
    Default,
    PrimaryKey,
    AutoIncrement,
    EnumValues,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConstraintKind::Nullability => "nullability",
            ConstraintKind::Unique => "unique",
            ConstraintKind::Default => "default",
            ConstraintKind::PrimaryKey => "primary key",
            ConstraintKind::AutoIncrement => "auto increment",
            ConstraintKind::EnumValues => "enum values",
        };
        f.write_str(s)
    }
}

/// One difference between an expected and an observed table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SchemaDelta {
    /// Expected column missing from the live table
    ColumnAdded(ColumnSpec),

    /// Live column the migrations do not declare
    ColumnRemoved(String),

    /// Base type differs
    ColumnTypeChanged {
        column: String,
        expected: ColumnType,
        observed: ColumnType,
    },

    /// Same type family, different constraint
    ConstraintChanged {
        column: String,
        constraint: ConstraintKind,
        expected: String,
        observed: String,
    },
}

impl SchemaDelta {
    pub fn column(&self) -> &str {
        match self {
            SchemaDelta::ColumnAdded(spec) => &spec.name,
            SchemaDelta::ColumnRemoved(name) => name,
            SchemaDelta::ColumnTypeChanged { column, .. }
            | SchemaDelta::ConstraintChanged { column, .. } => column,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, SchemaDelta::ColumnAdded(_))
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, SchemaDelta::ConstraintChanged { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            SchemaDelta::ColumnTypeChanged { .. } | SchemaDelta::ColumnRemoved(_)
        )
    }
}

impl fmt::Display for SchemaDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaDelta::ColumnAdded(spec) => write!(f, "+ {spec}"),
            SchemaDelta::ColumnRemoved(name) => write!(f, "- {name}"),
            SchemaDelta::ColumnTypeChanged {
                column,
                expected,
                observed,
            } => write!(f, "~ {column}: type {observed}, expected {expected}"),
            SchemaDelta::ConstraintChanged {
                column,
                constraint,
                expected,
                observed,
            } => write!(f, "~ {column}: {constraint} {observed}, expected {expected}"),
        }
    }
}

/// Compare an expected table definition with an observed one.
///
/// Deltas come in expected-column order, followed by removed columns in
/// observed order.
pub fn diff(expected: &TableSchema, observed: &TableSchema) -> Vec<SchemaDelta> {
    let mut deltas = Vec::new();

    for want in expected.columns() {
        let Some(have) = observed.column(&want.name) else {
            deltas.push(SchemaDelta::ColumnAdded(want.clone()));
            continue;
        };
        if let Some(delta) = type_delta(want, have) {
            deltas.push(delta);
            continue;
        }
        let changed = |constraint, expected: String, observed: String| {
            SchemaDelta::ConstraintChanged {
                column: want.name.clone(),
                constraint,
                expected,
                observed,
            }
        };

        if want.nullable != have.nullable {
            deltas.push(changed(
                ConstraintKind::Nullability,
                nullability(want.nullable),
                nullability(have.nullable),
            ));
        }
        let want_pk = expected.is_primary_key(&want.name);
        let have_pk = observed.is_primary_key(&have.name);
        if want_pk != have_pk {
            deltas.push(changed(
                ConstraintKind::PrimaryKey,
                flag(want_pk, "primary key"),
                flag(have_pk, "primary key"),
            ));
        }
        // A primary key is already unique; only standalone UNIQUE counts.
        let want_unique = want.unique && !want_pk;
        let have_unique = have.unique && !have_pk;
        if want_unique != have_unique {
            deltas.push(changed(
                ConstraintKind::Unique,
                flag(want_unique, "unique"),
                flag(have_unique, "unique"),
            ));
        }
        if want.auto_increment != have.auto_increment {
            deltas.push(changed(
                ConstraintKind::AutoIncrement,
                flag(want.auto_increment, "auto increment"),
                flag(have.auto_increment, "auto increment"),
            ));
        } else if !want.auto_increment && !same_default(&want.default, &have.default) {
            deltas.push(changed(
                ConstraintKind::Default,
                default_text(&want.default),
                default_text(&have.default),
            ));
        }
    }

    for have in observed.columns() {
        if !expected.has_column(&have.name) {
            deltas.push(SchemaDelta::ColumnRemoved(have.name.clone()));
        }
    }
    deltas
}

fn type_delta(want: &ColumnSpec, have: &ColumnSpec) -> Option<SchemaDelta> {
    let (expected, observed) = (&want.column_type, &have.column_type);
    if expected.is_satisfied_by(observed) {
        return None;
    }
    let enum_involved = expected.enum_values().is_some() || observed.enum_values().is_some();
    if expected.family() == observed.family() && enum_involved {
        return Some(SchemaDelta::ConstraintChanged {
            column: want.name.clone(),
            constraint: ConstraintKind::EnumValues,
            expected: expected.to_string(),
            observed: observed.to_string(),
        });
    }
    Some(SchemaDelta::ColumnTypeChanged {
        column: want.name.clone(),
        expected: expected.clone(),
        observed: observed.clone(),
    })
}

fn same_default(expected: &Option<DefaultValue>, observed: &Option<DefaultValue>) -> bool {
    match (expected, observed) {
        (None, None) => true,
        (Some(a), Some(b)) => a == b || a.to_string().eq_ignore_ascii_case(&b.to_string()),
        _ => false,
    }
}

fn nullability(nullable: bool) -> String {
    if nullable { "NULL" } else { "NOT NULL" }.to_string()
}

fn flag(set: bool, name: &str) -> String {
    if set {
        name.to_string()
    } else {
        format!("not {name}")
    }
}

fn default_text(default: &Option<DefaultValue>) -> String {
    match default {
        Some(value) => format!("DEFAULT {value}"),
        None => "no default".to_string(),
    }
}

/// Drift of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftReport {
    pub table: String,

    /// Whether the table exists on the target at all
    pub exists: bool,

    pub deltas: Vec<SchemaDelta>,
}

impl DriftReport {
    pub fn is_clean(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Columns the migrations would still add
    pub fn pending(&self) -> impl Iterator<Item = &SchemaDelta> {
        self.deltas.iter().filter(|d| d.is_pending())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &SchemaDelta> {
        self.deltas.iter().filter(|d| d.is_warning())
    }

    pub fn conflicts(&self) -> impl Iterator<Item = &SchemaDelta> {
        self.deltas.iter().filter(|d| d.is_conflict())
    }
}

/// Read-only comparison of expected schemas against the live target.
pub struct DriftDetector {
    db: TargetDb,
}

impl DriftDetector {
    pub fn new(db: TargetDb) -> Self {
        Self { db }
    }

    /// Live definition of `table`.
    pub fn inspect(&self, table: &str) -> Result<TableSchema, DriftError> {
        self.db
            .inspect(table)?
            .ok_or_else(|| DriftError::TableNotFound(table.to_string()))
    }

    /// Drift of one expected table. A missing table reports every expected
    /// column as added.
    pub fn check(&self, expected: &TableSchema) -> Result<DriftReport, DriftError> {
        let (exists, deltas) = match self.db.inspect(expected.name())? {
            Some(observed) => (true, diff(expected, &observed)),
            None => (
                false,
                expected
                    .columns()
                    .iter()
                    .cloned()
                    .map(SchemaDelta::ColumnAdded)
                    .collect(),
            ),
        };
        for delta in deltas.iter().filter(|d| !d.is_pending()) {
            log::warn!("Drift on {}: {delta}", expected.name());
        }
        Ok(DriftReport {
            table: expected.name().to_string(),
            exists,
            deltas,
        })
    }

    /// Drift of every table in `model`, in model order.
    pub fn check_all(&self, model: &SchemaModel) -> Result<Vec<DriftReport>, DriftError> {
        model.tables().iter().map(|t| self.check(t)).collect()
    }
}

#[cfg(test)]
#[path = "drift_test.rs"]
mod tests;
