//! Recursive-descent grammar for the supported DDL subset.
//!
//! ```text
//! statement   := create_table | alter_table | drop_table
//! create_table:= CREATE TABLE [IF NOT EXISTS] ident '(' element {',' element} ')' [options]
//! element     := column_def
//!              | [CONSTRAINT ident] PRIMARY KEY '(' ident {',' ident} ')'
//!              | [CONSTRAINT ident] UNIQUE [KEY | INDEX] [ident] '(' ident ')'
//! column_def  := ident type {column_option}
//! alter_table := ALTER TABLE ident alter_op {',' alter_op}
//! alter_op    := ADD [COLUMN] [IF NOT EXISTS] column_def
//!              | DROP [COLUMN] [IF EXISTS] ident
//! drop_table  := DROP TABLE [IF EXISTS] ident {',' ident}
//! ```

use sqlparser::tokenizer::Token;
use st_core::{ColumnSpec, ColumnType, DdlOperation, DefaultValue, TableSchema};

use crate::tokens::{is_keyword, TokenCursor};

/// Grammar failure, before the statement index is attached.
#[derive(Debug)]
pub(crate) enum GrammarError {
    /// Malformed input within a supported statement
    Syntax(String),
    /// A statement or clause outside the supported subset
    Unsupported(String),
}

pub(crate) type GrammarResult<T> = Result<T, GrammarError>;

fn syntax<T>(message: impl Into<String>) -> GrammarResult<T> {
    Err(GrammarError::Syntax(message.into()))
}

fn unsupported<T>(message: impl Into<String>) -> GrammarResult<T> {
    Err(GrammarError::Unsupported(message.into()))
}

/// Parse one statement, leaving the cursor at its terminating `;` or end.
pub(crate) fn parse_statement(cur: &mut TokenCursor) -> GrammarResult<Vec<DdlOperation>> {
    let ops = if cur.eat_keyword("CREATE") {
        if !cur.eat_keyword("TABLE") {
            return unsupported(format!("CREATE {}", cur.found()));
        }
        vec![parse_create_table(cur)?]
    } else if cur.eat_keyword("ALTER") {
        if !cur.eat_keyword("TABLE") {
            return unsupported(format!("ALTER {}", cur.found()));
        }
        parse_alter_table(cur)?
    } else if cur.eat_keyword("DROP") {
        if !cur.eat_keyword("TABLE") {
            return unsupported(format!("DROP {}", cur.found()));
        }
        parse_drop_table(cur)?
    } else {
        return unsupported(cur.found());
    };

    if !cur.at_statement_end() {
        return syntax(format!("expected ';' or end of input, found {}", cur.found()));
    }
    Ok(ops)
}

fn parse_create_table(cur: &mut TokenCursor) -> GrammarResult<DdlOperation> {
    let if_not_exists = cur.eat_keywords(&["IF", "NOT", "EXISTS"]);
    let name = identifier(cur, "table name")?;
    expect(cur, &Token::LParen, "'(' after table name")?;

    let mut columns: Vec<ColumnSpec> = Vec::new();
    let mut primary_key: Option<Vec<String>> = None;
    let mut unique_columns: Vec<String> = Vec::new();

    loop {
        let constraint_name = if cur.eat_keyword("CONSTRAINT") {
            Some(identifier(cur, "constraint name")?)
        } else {
            None
        };

        if cur.eat_keywords(&["PRIMARY", "KEY"]) {
            let keys = identifier_list(cur)?;
            set_primary_key(&mut primary_key, keys)?;
        } else if cur.eat_keyword("UNIQUE") {
            let _ = cur.eat_keyword("KEY") || cur.eat_keyword("INDEX");
            if !matches!(cur.peek(), Some(Token::LParen)) {
                identifier(cur, "index name")?;
            }
            let cols = identifier_list(cur)?;
            if cols.len() != 1 {
                return unsupported(format!(
                    "multi-column UNIQUE ({}) on table '{name}'",
                    cols.join(", ")
                ));
            }
            unique_columns.extend(cols);
        } else if let Some(constraint) = constraint_name {
            return syntax(format!(
                "expected PRIMARY KEY or UNIQUE after CONSTRAINT {constraint}, found {}",
                cur.found()
            ));
        } else if cur.peek_keyword("KEY")
            || cur.peek_keyword("INDEX")
            || cur.peek_keyword("FOREIGN")
            || cur.peek_keyword("CHECK")
        {
            return unsupported(format!("table constraint {} on table '{name}'", cur.found()));
        } else {
            let (column, inline_pk) = parse_column_def(cur)?;
            if inline_pk {
                set_primary_key(&mut primary_key, vec![column.name.clone()])?;
            }
            columns.push(column);
        }

        if cur.eat_token(&Token::Comma) {
            continue;
        }
        expect(cur, &Token::RParen, "',' or ')' in column list")?;
        break;
    }

    skip_table_options(cur)?;

    if columns.is_empty() {
        return syntax(format!("table '{name}' declares no columns"));
    }
    for col_name in &unique_columns {
        match columns.iter_mut().find(|c| &c.name == col_name) {
            Some(col) => col.unique = true,
            None => return syntax(format!("UNIQUE references unknown column '{col_name}'")),
        }
    }
    let primary_key = primary_key.unwrap_or_default();
    for key in &primary_key {
        if let Some(col) = columns.iter_mut().find(|c| &c.name == key) {
            col.nullable = false;
        }
    }

    let table = TableSchema::new(name, columns, primary_key)
        .map_err(|e| GrammarError::Syntax(e.to_string()))?;
    Ok(DdlOperation::CreateTable {
        table,
        if_not_exists,
    })
}

fn set_primary_key(slot: &mut Option<Vec<String>>, keys: Vec<String>) -> GrammarResult<()> {
    if slot.is_some() {
        return syntax("multiple PRIMARY KEY definitions");
    }
    *slot = Some(keys);
    Ok(())
}

/// Parse a column definition. Returns the column and whether it declared an
/// inline `PRIMARY KEY`.
fn parse_column_def(cur: &mut TokenCursor) -> GrammarResult<(ColumnSpec, bool)> {
    let name = identifier(cur, "column name")?;
    let column_type = parse_type(cur)?;
    let mut column = ColumnSpec::new(name, column_type);
    let mut primary_key = false;

    loop {
        if cur.eat_keywords(&["NOT", "NULL"]) {
            column.nullable = false;
        } else if cur.eat_keyword("NULL") {
            column.nullable = true;
        } else if cur.eat_keyword("DEFAULT") {
            column.default = parse_default(cur)?;
        } else if cur.eat_keyword("UNIQUE") {
            cur.eat_keyword("KEY");
            column.unique = true;
        } else if cur.eat_keywords(&["PRIMARY", "KEY"]) || cur.eat_keyword("KEY") {
            primary_key = true;
        } else if cur.eat_keyword("AUTO_INCREMENT") || cur.eat_keyword("AUTOINCREMENT") {
            column.auto_increment = true;
        } else if cur.eat_keyword("COMMENT") {
            match cur.advance() {
                Some(Token::SingleQuotedString(_)) => {}
                _ => return syntax("expected string literal after COMMENT"),
            }
        } else {
            break;
        }
    }

    match cur.peek() {
        None | Some(Token::Comma) | Some(Token::RParen) | Some(Token::SemiColon) => {}
        Some(_) => {
            return syntax(format!(
                "unexpected {} in definition of column '{}'",
                cur.found(),
                column.name
            ))
        }
    }
    if column.auto_increment && !column.column_type.is_integer() {
        return syntax(format!(
            "AUTO_INCREMENT column '{}' must be an integer",
            column.name
        ));
    }
    Ok((column, primary_key))
}

/// Parse a column type.
pub(crate) fn parse_type(cur: &mut TokenCursor) -> GrammarResult<ColumnType> {
    let Some(Token::Word(word)) = cur.advance() else {
        return syntax(format!("expected column type, found {}", cur.found()));
    };
    let ty = match word.value.to_ascii_uppercase().as_str() {
        "INT" | "INTEGER" | "INT4" | "SIGNED" => {
            optional_length(cur)?;
            ColumnType::Int
        }
        "BIGINT" | "INT8" => {
            optional_length(cur)?;
            ColumnType::BigInt
        }
        "VARCHAR" => ColumnType::Varchar(optional_length(cur)?),
        "TEXT" | "STRING" => ColumnType::Text,
        "BOOLEAN" | "BOOL" => ColumnType::Boolean,
        "TIMESTAMP" | "DATETIME" => ColumnType::Timestamp,
        "ENUM" => ColumnType::Enum(parse_enum_values(cur)?),
        other => return unsupported(format!("column type {other}")),
    };
    // MySQL integer modifier; signedness is not modelled.
    cur.eat_keyword("UNSIGNED");
    Ok(ty)
}

fn optional_length(cur: &mut TokenCursor) -> GrammarResult<Option<u32>> {
    if !cur.eat_token(&Token::LParen) {
        return Ok(None);
    }
    let length = match cur.advance() {
        Some(Token::Number(n, _)) => n
            .parse::<u32>()
            .map_err(|_| GrammarError::Syntax(format!("invalid type length '{n}'")))?,
        _ => return syntax("expected type length"),
    };
    expect(cur, &Token::RParen, "')' after type length")?;
    Ok(Some(length))
}

fn parse_enum_values(cur: &mut TokenCursor) -> GrammarResult<Vec<String>> {
    expect(cur, &Token::LParen, "'(' after ENUM")?;
    let mut values: Vec<String> = Vec::new();
    loop {
        match cur.advance() {
            Some(Token::SingleQuotedString(v)) => {
                if values.contains(&v) {
                    return syntax(format!("duplicate ENUM value '{v}'"));
                }
                values.push(v);
            }
            _ => return syntax("expected string literal in ENUM value list"),
        }
        if cur.eat_token(&Token::Comma) {
            continue;
        }
        expect(cur, &Token::RParen, "',' or ')' in ENUM value list")?;
        return Ok(values);
    }
}

/// Parse a `DEFAULT` literal. `DEFAULT NULL` yields `None`.
pub(crate) fn parse_default(cur: &mut TokenCursor) -> GrammarResult<Option<DefaultValue>> {
    let value = match cur.advance() {
        Some(Token::SingleQuotedString(s)) | Some(Token::DoubleQuotedString(s)) => {
            DefaultValue::Str(s)
        }
        Some(Token::Number(n, _)) => DefaultValue::Number(n),
        Some(Token::Minus) => match cur.advance() {
            Some(Token::Number(n, _)) => DefaultValue::Number(format!("-{n}")),
            _ => return syntax("expected number after '-' in DEFAULT"),
        },
        Some(token) if is_keyword(&token, "NULL") => return Ok(None),
        Some(token) if is_keyword(&token, "TRUE") => DefaultValue::Boolean(true),
        Some(token) if is_keyword(&token, "FALSE") => DefaultValue::Boolean(false),
        Some(token) if is_keyword(&token, "CURRENT_TIMESTAMP") || is_keyword(&token, "NOW") => {
            if cur.eat_token(&Token::LParen) {
                expect(cur, &Token::RParen, "')' after CURRENT_TIMESTAMP(")?;
            }
            DefaultValue::CurrentTimestamp
        }
        Some(token) => return unsupported(format!("DEFAULT expression '{token}'")),
        None => return syntax("expected value after DEFAULT"),
    };
    Ok(Some(value))
}

/// MySQL table options (`ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 ...`) carry
/// no schema meaning here and are skipped.
fn skip_table_options(cur: &mut TokenCursor) -> GrammarResult<()> {
    let mut skipped = Vec::new();
    while !cur.at_statement_end() {
        match cur.advance() {
            Some(token) if is_table_option_token(&token) => skipped.push(token.to_string()),
            Some(token) => return syntax(format!("unexpected '{token}' after column list")),
            None => break,
        }
    }
    if !skipped.is_empty() {
        log::debug!("Ignoring table options: {}", skipped.join(" "));
    }
    Ok(())
}

fn is_table_option_token(token: &Token) -> bool {
    matches!(
        token,
        Token::Word(_) | Token::Eq | Token::Number(_, _) | Token::SingleQuotedString(_)
    )
}

fn parse_alter_table(cur: &mut TokenCursor) -> GrammarResult<Vec<DdlOperation>> {
    let table = identifier(cur, "table name")?;
    let mut ops = Vec::new();
    loop {
        if cur.eat_keyword("ADD") {
            if cur.peek_keyword("CONSTRAINT")
                || cur.peek_keyword("PRIMARY")
                || cur.peek_keyword("UNIQUE")
                || cur.peek_keyword("INDEX")
                || cur.peek_keyword("KEY")
            {
                return unsupported(format!("ALTER TABLE {table} ADD {}", cur.found()));
            }
            cur.eat_keyword("COLUMN");
            let if_not_exists = cur.eat_keywords(&["IF", "NOT", "EXISTS"]);
            let (column, primary_key) = parse_column_def(cur)?;
            if primary_key {
                return unsupported(format!(
                    "adding primary key column '{}' to '{table}'",
                    column.name
                ));
            }
            ops.push(DdlOperation::AddColumn {
                table: table.clone(),
                column,
                if_not_exists,
            });
        } else if cur.eat_keyword("DROP") {
            cur.eat_keyword("COLUMN");
            let if_exists = cur.eat_keywords(&["IF", "EXISTS"]);
            let column = identifier(cur, "column name")?;
            ops.push(DdlOperation::DropColumn {
                table: table.clone(),
                column,
                if_exists,
            });
        } else {
            return unsupported(format!("ALTER TABLE {table} {}", cur.found()));
        }

        if !cur.eat_token(&Token::Comma) {
            return Ok(ops);
        }
    }
}

fn parse_drop_table(cur: &mut TokenCursor) -> GrammarResult<Vec<DdlOperation>> {
    let if_exists = cur.eat_keywords(&["IF", "EXISTS"]);
    let mut ops = Vec::new();
    loop {
        let table = identifier(cur, "table name")?;
        ops.push(DdlOperation::DropTable { table, if_exists });
        if !cur.eat_token(&Token::Comma) {
            return Ok(ops);
        }
    }
}

fn identifier(cur: &mut TokenCursor, what: &str) -> GrammarResult<String> {
    match cur.peek() {
        Some(Token::Word(w)) => {
            let value = w.value.clone();
            cur.advance();
            if matches!(cur.peek(), Some(Token::Period)) {
                return unsupported(format!("qualified name '{value}.…' for {what}"));
            }
            Ok(value)
        }
        _ => syntax(format!("expected {what}, found {}", cur.found())),
    }
}

fn identifier_list(cur: &mut TokenCursor) -> GrammarResult<Vec<String>> {
    expect(cur, &Token::LParen, "'(' before column list")?;
    let mut names = vec![identifier(cur, "column name")?];
    while cur.eat_token(&Token::Comma) {
        names.push(identifier(cur, "column name")?);
    }
    expect(cur, &Token::RParen, "')' after column list")?;
    Ok(names)
}

fn expect(cur: &mut TokenCursor, token: &Token, what: &str) -> GrammarResult<()> {
    if cur.eat_token(token) {
        Ok(())
    } else {
        syntax(format!("expected {what}, found {}", cur.found()))
    }
}
