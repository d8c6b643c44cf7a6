//! Rendering of DDL operations as DuckDB SQL.

use st_core::column::quote_literal;
use st_core::{ColumnSpec, ColumnType, DdlOperation, TableSchema};

use crate::dialect::{DuckDbDialect, SqlDialect};
use crate::error::{SqlError, SqlResult};

/// Renders [`DdlOperation`]s as DuckDB statements.
///
/// `AUTO_INCREMENT` has no DuckDB equivalent; it becomes a sequence named by
/// [`DuckDbRenderer::sequence_name`] plus a `nextval` column default.
pub struct DuckDbRenderer {
    dialect: DuckDbDialect,
}

impl DuckDbRenderer {
    pub fn new() -> Self {
        Self {
            dialect: DuckDbDialect::new(),
        }
    }

    /// Name of the sequence backing an auto-increment column.
    pub fn sequence_name(table: &str, column: &str) -> String {
        format!("{table}_{column}_seq")
    }

    /// Render one operation as the statements that perform it, in order.
    pub fn render_operation(&self, op: &DdlOperation) -> SqlResult<Vec<String>> {
        match op {
            DdlOperation::CreateTable {
                table,
                if_not_exists,
            } => Ok(self.render_create_table(table, *if_not_exists)),
            DdlOperation::AddColumn {
                table,
                column,
                if_not_exists,
            } => self.render_add_column(op, table, column, *if_not_exists),
            DdlOperation::DropColumn {
                table,
                column,
                if_exists,
            } => {
                let guard = if *if_exists { "IF EXISTS " } else { "" };
                Ok(vec![format!(
                    "ALTER TABLE {} DROP COLUMN {guard}{}",
                    self.quote(table),
                    self.quote(column)
                )])
            }
            DdlOperation::DropTable { table, if_exists } => {
                let guard = if *if_exists { "IF EXISTS " } else { "" };
                Ok(vec![format!("DROP TABLE {guard}{}", self.quote(table))])
            }
        }
    }

    fn render_create_table(&self, table: &TableSchema, if_not_exists: bool) -> Vec<String> {
        let mut statements: Vec<String> = table
            .columns()
            .iter()
            .filter(|c| c.auto_increment)
            .map(|c| {
                format!(
                    "CREATE SEQUENCE IF NOT EXISTS {}",
                    self.quote(&Self::sequence_name(table.name(), &c.name))
                )
            })
            .collect();

        let mut elements: Vec<String> = table
            .columns()
            .iter()
            .map(|c| {
                let mut def = self.render_column_base(table.name(), c);
                if !c.nullable {
                    def.push_str(" NOT NULL");
                }
                if c.unique && !table.is_primary_key(&c.name) {
                    def.push_str(" UNIQUE");
                }
                def
            })
            .collect();
        if !table.primary_key().is_empty() {
            let keys: Vec<String> = table.primary_key().iter().map(|k| self.quote(k)).collect();
            elements.push(format!("PRIMARY KEY ({})", keys.join(", ")));
        }

        let guard = if if_not_exists { "IF NOT EXISTS " } else { "" };
        statements.push(format!(
            "CREATE TABLE {guard}{} ({})",
            self.quote(table.name()),
            elements.join(", ")
        ));
        statements
    }

    fn render_add_column(
        &self,
        op: &DdlOperation,
        table: &str,
        column: &ColumnSpec,
        if_not_exists: bool,
    ) -> SqlResult<Vec<String>> {
        let unrenderable = |reason: &str| SqlError::Unrenderable {
            operation: op.to_string(),
            reason: reason.to_string(),
        };
        if column.unique {
            return Err(unrenderable("DuckDB cannot add a UNIQUE column to an existing table"));
        }
        if column.auto_increment {
            return Err(unrenderable(
                "DuckDB cannot add an auto-increment column to an existing table",
            ));
        }

        let guard = if if_not_exists { "IF NOT EXISTS " } else { "" };
        let mut statements = vec![format!(
            "ALTER TABLE {} ADD COLUMN {guard}{}",
            self.quote(table),
            self.render_column_base(table, column)
        )];
        // ADD COLUMN takes no constraints; nullability is tightened afterwards.
        if !column.nullable {
            statements.push(format!(
                "ALTER TABLE {} ALTER COLUMN {} SET NOT NULL",
                self.quote(table),
                self.quote(&column.name)
            ));
        }
        Ok(statements)
    }

    /// Name, type and default of a column.
    fn render_column_base(&self, table: &str, column: &ColumnSpec) -> String {
        let mut def = format!(
            "{} {}",
            self.quote(&column.name),
            render_type(&column.column_type)
        );
        if column.auto_increment {
            def.push_str(&format!(
                " DEFAULT nextval({})",
                quote_literal(&Self::sequence_name(table, &column.name))
            ));
        } else if let Some(default) = &column.default {
            def.push_str(&format!(" DEFAULT {default}"));
        }
        def
    }

    fn quote(&self, ident: &str) -> String {
        self.dialect.quote_ident(ident)
    }
}

impl Default for DuckDbRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// DuckDB spelling of a column type.
pub fn render_type(ty: &ColumnType) -> String {
    match ty {
        ColumnType::Int => "INTEGER".to_string(),
        ColumnType::BigInt => "BIGINT".to_string(),
        ColumnType::Varchar(Some(n)) => format!("VARCHAR({n})"),
        ColumnType::Varchar(None) | ColumnType::Text => "VARCHAR".to_string(),
        ColumnType::Boolean => "BOOLEAN".to_string(),
        ColumnType::Timestamp => "TIMESTAMP".to_string(),
        ColumnType::Enum(_) => ty.to_string(),
        ColumnType::Other(name) => name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::DdlParser;

    fn render(sql: &str) -> Vec<String> {
        let renderer = DuckDbRenderer::new();
        DdlParser::mysql()
            .parse(sql)
            .unwrap()
            .iter()
            .flat_map(|op| renderer.render_operation(op).unwrap())
            .collect()
    }

    #[test]
    fn test_render_users_table() {
        let statements = render(
            "CREATE TABLE IF NOT EXISTS users (id INT NOT NULL AUTO_INCREMENT, \
             email VARCHAR(255) NOT NULL UNIQUE, name VARCHAR(255), \
             country ENUM('US','CO','TN') DEFAULT 'US', PRIMARY KEY (id))",
        );
        assert_eq!(
            statements,
            vec![
                r#"CREATE SEQUENCE IF NOT EXISTS "users_id_seq""#.to_string(),
                concat!(
                    r#"CREATE TABLE IF NOT EXISTS "users" ("#,
                    r#""id" INTEGER DEFAULT nextval('users_id_seq') NOT NULL, "#,
                    r#""email" VARCHAR(255) NOT NULL UNIQUE, "#,
                    r#""name" VARCHAR(255), "#,
                    r#""country" ENUM('US', 'CO', 'TN') DEFAULT 'US', "#,
                    r#"PRIMARY KEY ("id"))"#
                )
                .to_string(),
            ]
        );
    }

    #[test]
    fn test_render_add_not_null_column() {
        let statements =
            render("ALTER TABLE users ADD COLUMN IF NOT EXISTS age INT NOT NULL DEFAULT 0");
        assert_eq!(
            statements,
            vec![
                r#"ALTER TABLE "users" ADD COLUMN IF NOT EXISTS "age" INTEGER DEFAULT 0"#
                    .to_string(),
                r#"ALTER TABLE "users" ALTER COLUMN "age" SET NOT NULL"#.to_string(),
            ]
        );
    }

    #[test]
    fn test_render_drops() {
        assert_eq!(
            render("ALTER TABLE users DROP COLUMN IF EXISTS name; DROP TABLE users"),
            vec![
                r#"ALTER TABLE "users" DROP COLUMN IF EXISTS "name""#.to_string(),
                r#"DROP TABLE "users""#.to_string(),
            ]
        );
    }

    #[test]
    fn test_add_unique_column_is_unrenderable() {
        let ops = DdlParser::mysql()
            .parse("ALTER TABLE users ADD handle VARCHAR(40) UNIQUE")
            .unwrap();
        let result = DuckDbRenderer::new().render_operation(&ops[0]);
        assert!(matches!(result, Err(SqlError::Unrenderable { .. })));
    }

    #[test]
    fn test_render_type() {
        assert_eq!(render_type(&ColumnType::Text), "VARCHAR");
        assert_eq!(render_type(&ColumnType::Varchar(None)), "VARCHAR");
        assert_eq!(render_type(&ColumnType::Timestamp), "TIMESTAMP");
        assert_eq!(DuckDbRenderer::sequence_name("users", "id"), "users_id_seq");
    }
}
