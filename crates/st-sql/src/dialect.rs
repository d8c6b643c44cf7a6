//! SQL dialect abstraction

use sqlparser::dialect::{
    Dialect, DuckDbDialect as SqlParserDuckDb, MySqlDialect as SqlParserMySql,
};
use sqlparser::tokenizer::{Token, Tokenizer};

use crate::error::{SqlError, SqlResult};

/// Trait for SQL dialect implementations
pub trait SqlDialect: Send + Sync {
    /// Get the underlying sqlparser dialect
    fn parser_dialect(&self) -> &dyn Dialect;

    /// Tokenize SQL, dropping whitespace and comments
    fn tokenize(&self, sql: &str) -> SqlResult<Vec<Token>> {
        let tokens = Tokenizer::new(self.parser_dialect(), sql)
            .tokenize()
            .map_err(|e| {
                let msg = e.to_string();
                let (line, column) = parse_location_from_error(&msg);
                SqlError::Tokenize {
                    message: msg,
                    line,
                    column,
                }
            })?;
        Ok(tokens
            .into_iter()
            .filter(|t| !matches!(t, Token::Whitespace(_)))
            .collect())
    }

    /// Quote an identifier for this dialect
    fn quote_ident(&self, ident: &str) -> String;

    /// Get the dialect name
    fn name(&self) -> &'static str;
}

/// Parse line and column from a sqlparser tokenizer error message.
///
/// `TokenizerError`'s Display output ends in "at Line: N, Column: M"; the
/// location is pulled from that text.
fn parse_location_from_error(msg: &str) -> (usize, usize) {
    let Some(line_idx) = msg.find("Line: ") else {
        return (0, 0);
    };
    let line_start = line_idx + 6;
    let Some(comma_idx) = msg[line_start..].find(',') else {
        return (0, 0);
    };
    let Ok(line) = msg[line_start..line_start + comma_idx]
        .trim()
        .parse::<usize>()
    else {
        return (0, 0);
    };
    let Some(col_idx) = msg.find("Column: ") else {
        return (line, 0);
    };
    let col_start = col_idx + 8;
    let col_end = msg[col_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map(|i| col_start + i)
        .unwrap_or(msg.len());
    let column = msg[col_start..col_end].trim().parse::<usize>().unwrap_or(0);
    (line, column)
}

/// MySQL dialect, the dialect migration files are written in
pub struct MySqlDialect {
    dialect: SqlParserMySql,
}

impl MySqlDialect {
    /// Create a new MySQL dialect
    pub fn new() -> Self {
        Self {
            dialect: SqlParserMySql {},
        }
    }
}

impl Default for MySqlDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for MySqlDialect {
    fn parser_dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    fn name(&self) -> &'static str {
        "mysql"
    }
}

/// DuckDB SQL dialect, the dialect of the migration target
pub struct DuckDbDialect {
    dialect: SqlParserDuckDb,
}

impl DuckDbDialect {
    /// Create a new DuckDB dialect
    pub fn new() -> Self {
        Self {
            dialect: SqlParserDuckDb {},
        }
    }
}

impl Default for DuckDbDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for DuckDbDialect {
    fn parser_dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn name(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_whitespace_and_comments() {
        let tokens = MySqlDialect::new()
            .tokenize("CREATE -- trailing\n TABLE /* block */ t")
            .unwrap();
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_tokenize_unterminated_string() {
        let err = MySqlDialect::new().tokenize("DEFAULT 'US").unwrap_err();
        assert!(matches!(err, SqlError::Tokenize { .. }));
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(MySqlDialect::new().quote_ident("a`b"), "`a``b`");
        assert_eq!(DuckDbDialect::new().quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_parse_location_from_error() {
        assert_eq!(
            parse_location_from_error("Unterminated string literal at Line: 3, Column: 14"),
            (3, 14)
        );
        assert_eq!(parse_location_from_error("no location"), (0, 0));
    }
}
