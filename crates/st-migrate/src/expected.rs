//! The schema a migration set implies.

use st_core::{DdlOperation, MigrationDefinition, TableSchema};

/// Tables as the migrations leave them, in creation order.
///
/// Folding follows the runner's convergent semantics: a repeated
/// `CREATE TABLE IF NOT EXISTS` contributes only the columns the table does
/// not have yet, and guarded operations that are already satisfied are
/// no-ops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaModel {
    tables: Vec<TableSchema>,
}

impl SchemaModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    /// Look up a table by name. DuckDB identifiers are case-insensitive.
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name().eq_ignore_ascii_case(name))
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name()).collect()
    }

    fn table_mut(&mut self, name: &str) -> Option<&mut TableSchema> {
        self.tables
            .iter_mut()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }

    /// Fold one operation into the model.
    pub fn apply(&mut self, op: &DdlOperation) {
        match op {
            DdlOperation::CreateTable {
                table,
                if_not_exists,
            } => match self.table_mut(table.name()) {
                None => self.tables.push(table.clone()),
                Some(existing) if *if_not_exists => {
                    for column in table.columns() {
                        if !existing.has_column(&column.name) {
                            if let Err(e) = existing.add_column(column.clone()) {
                                log::warn!("{e}");
                            }
                        }
                    }
                }
                Some(existing) => {
                    log::warn!(
                        "Table '{}' is created twice without IF NOT EXISTS; keeping the later definition",
                        table.name()
                    );
                    *existing = table.clone();
                }
            },
            DdlOperation::AddColumn { table, column, .. } => {
                let Some(existing) = self.table_mut(table) else {
                    log::debug!("Ignoring ADD COLUMN on unmanaged table '{table}'");
                    return;
                };
                if !existing.has_column(&column.name) {
                    if let Err(e) = existing.add_column(column.clone()) {
                        log::warn!("{e}");
                    }
                }
            }
            DdlOperation::DropColumn { table, column, .. } => {
                if let Some(existing) = self.table_mut(table) {
                    if existing.has_column(column) {
                        if let Err(e) = existing.drop_column(column) {
                            log::warn!("{e}");
                        }
                    }
                }
            }
            DdlOperation::DropTable { table, .. } => {
                self.tables.retain(|t| !t.name().eq_ignore_ascii_case(table));
            }
        }
    }
}

/// Fold every operation of `definitions`, in order, into a [`SchemaModel`].
pub fn expected_schemas(definitions: &[MigrationDefinition]) -> SchemaModel {
    let mut model = SchemaModel::new();
    for op in definitions.iter().flat_map(|d| &d.operations) {
        model.apply(op);
    }
    model
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{Loader, StaticSource};

    fn model(source: StaticSource) -> SchemaModel {
        expected_schemas(&Loader::new(source).load_all().unwrap())
    }

    #[test]
    fn test_sequential_create_if_not_exists_converges() {
        let sequential = model(
            StaticSource::new()
                .with(
                    "0001_users",
                    "CREATE TABLE IF NOT EXISTS users (id INT PRIMARY KEY, email TEXT)",
                )
                .with(
                    "0002_users",
                    "CREATE TABLE IF NOT EXISTS users (id INT PRIMARY KEY, email TEXT, country ENUM('US','CO'))",
                ),
        );
        let direct = model(StaticSource::new().with(
            "0002_users",
            "CREATE TABLE IF NOT EXISTS users (id INT PRIMARY KEY, email TEXT, country ENUM('US','CO'))",
        ));
        assert_eq!(sequential, direct);
        assert_eq!(
            sequential.table("users").unwrap().column_names(),
            vec!["id", "email", "country"]
        );
    }

    #[test]
    fn test_alter_and_drop() {
        let model = model(
            StaticSource::new()
                .with("0001_a", "CREATE TABLE a (id INT PRIMARY KEY, legacy TEXT)")
                .with("0002_b", "CREATE TABLE b (id INT)")
                .with(
                    "0003_alter",
                    "ALTER TABLE a ADD COLUMN note TEXT, DROP COLUMN legacy; DROP TABLE IF EXISTS b",
                )
                .with("0004_other", "ALTER TABLE external ADD COLUMN x INT"),
        );
        assert_eq!(model.table_names(), vec!["a"]);
        assert_eq!(model.table("a").unwrap().column_names(), vec!["id", "note"]);
    }

    #[test]
    fn test_table_names_match_case_insensitively() {
        let model = model(
            StaticSource::new()
                .with("0001_users", "CREATE TABLE Users (id INT PRIMARY KEY)")
                .with("0002_users", "ALTER TABLE users ADD COLUMN IF NOT EXISTS email TEXT")
                .with("0003_tmp", "CREATE TABLE Tmp (id INT); DROP TABLE IF EXISTS TMP"),
        );
        assert_eq!(model.table_names(), vec!["Users"]);
        assert_eq!(model.table("USERS").unwrap().column_names(), vec!["id", "email"]);
    }
}
