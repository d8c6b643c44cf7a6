//! DDL parser wrapper

use sqlparser::tokenizer::Token;
use st_core::DdlOperation;

use crate::dialect::{DuckDbDialect, MySqlDialect, SqlDialect};
use crate::error::{SqlError, SqlResult};
use crate::grammar::{self, GrammarError};
use crate::tokens::TokenCursor;

/// Parser for migration DDL that wraps the sqlparser-rs tokenizer with dialect support
pub struct DdlParser {
    dialect: Box<dyn SqlDialect>,
}

impl DdlParser {
    /// Create a new parser with the MySQL dialect
    pub fn mysql() -> Self {
        Self {
            dialect: Box::new(MySqlDialect::new()),
        }
    }

    /// Create a new parser with the DuckDB dialect
    pub fn duckdb() -> Self {
        Self {
            dialect: Box::new(DuckDbDialect::new()),
        }
    }

    /// Create a parser from dialect name
    pub fn from_dialect_name(name: &str) -> SqlResult<Self> {
        match name.to_lowercase().as_str() {
            "mysql" => Ok(Self::mysql()),
            "duckdb" => Ok(Self::duckdb()),
            _ => Err(SqlError::UnknownDialect(name.to_string())),
        }
    }

    /// Parse a script of `;`-separated DDL statements into operations, in
    /// source order.
    ///
    /// Statement numbers in errors are 1-based.
    pub fn parse(&self, sql: &str) -> SqlResult<Vec<DdlOperation>> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(SqlError::EmptySql);
        }

        let mut cur = TokenCursor::new(self.dialect.tokenize(sql)?);
        let mut operations = Vec::new();
        let mut statement = 0;
        loop {
            while cur.eat_token(&Token::SemiColon) {}
            if cur.is_done() {
                break;
            }
            statement += 1;
            let ops = grammar::parse_statement(&mut cur).map_err(|e| match e {
                GrammarError::Syntax(message) => SqlError::Parse { statement, message },
                GrammarError::Unsupported(found) => {
                    SqlError::UnsupportedStatement { statement, found }
                }
            })?;
            operations.extend(ops);
        }

        if operations.is_empty() {
            return Err(SqlError::EmptySql);
        }
        Ok(operations)
    }

    /// Get the dialect name
    pub fn dialect_name(&self) -> &'static str {
        self.dialect.name()
    }

    /// Quote an identifier for the current dialect
    pub fn quote_ident(&self, ident: &str) -> String {
        self.dialect.quote_ident(ident)
    }
}

impl Default for DdlParser {
    fn default() -> Self {
        Self::mysql()
    }
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
