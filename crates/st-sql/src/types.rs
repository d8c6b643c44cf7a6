//! Parsing of the type and default strings a target database reports.

use sqlparser::tokenizer::Token;
use st_core::{ColumnType, DefaultValue};

use crate::dialect::{DuckDbDialect, SqlDialect};
use crate::grammar;
use crate::tokens::TokenCursor;

/// A column default as reported by the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultExpr {
    /// No default, or an explicit `NULL`
    None,
    /// A literal or recognised expression
    Value(DefaultValue),
    /// `nextval('<sequence>')`, the target's rendering of an auto-increment column
    Sequence(String),
}

/// Parse a reported type name such as `INTEGER` or `ENUM('a', 'b')`.
///
/// Types outside the modelled set come back as [`ColumnType::Other`] with the
/// name upper-cased, so inspection never fails on an unfamiliar column.
pub fn parse_type_name(raw: &str) -> ColumnType {
    let raw = raw.trim();
    let parsed = DuckDbDialect::new().tokenize(raw).ok().and_then(|tokens| {
        let mut cur = TokenCursor::new(tokens);
        let ty = grammar::parse_type(&mut cur).ok()?;
        cur.is_done().then_some(ty)
    });
    parsed.unwrap_or_else(|| ColumnType::Other(raw.to_ascii_uppercase()))
}

/// Parse a reported column default.
///
/// Casts wrapped around a literal (`CAST('US' AS VARCHAR)`, `'US'::VARCHAR`)
/// are stripped. Anything unrecognised is kept verbatim as
/// [`DefaultValue::Expression`].
pub fn parse_default_expr(raw: Option<&str>) -> DefaultExpr {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return DefaultExpr::None;
    };
    DuckDbDialect::new()
        .tokenize(raw)
        .ok()
        .and_then(|tokens| default_from_tokens(TokenCursor::new(tokens)))
        .unwrap_or_else(|| DefaultExpr::Value(DefaultValue::Expression(raw.to_string())))
}

fn default_from_tokens(mut cur: TokenCursor) -> Option<DefaultExpr> {
    if cur.eat_keyword("NEXTVAL") {
        if !cur.eat_token(&Token::LParen) {
            return None;
        }
        let Some(Token::SingleQuotedString(sequence)) = cur.advance() else {
            return None;
        };
        let closed = cur.eat_token(&Token::RParen) && cur.is_done();
        return closed.then_some(DefaultExpr::Sequence(sequence));
    }

    if cur.eat_keyword("GET_CURRENT_TIMESTAMP") {
        let called = cur.eat_token(&Token::LParen) && cur.eat_token(&Token::RParen);
        return (called && cur.is_done())
            .then_some(DefaultExpr::Value(DefaultValue::CurrentTimestamp));
    }

    let cast = cur.eat_keyword("CAST");
    if cast && !cur.eat_token(&Token::LParen) {
        return None;
    }
    let value = grammar::parse_default(&mut cur).ok()?;

    if cast {
        if !cur.eat_keyword("AS") {
            return None;
        }
        // The target type runs up to the closing paren of the CAST.
        let mut depth = 0usize;
        loop {
            match cur.advance()? {
                Token::LParen => depth += 1,
                Token::RParen if depth == 0 => break,
                Token::RParen => depth -= 1,
                _ => {}
            }
        }
    } else if cur.eat_token(&Token::DoubleColon) {
        while cur.advance().is_some() {}
    }

    if !cur.is_done() {
        return None;
    }
    Some(match value {
        Some(v) => DefaultExpr::Value(v),
        None => DefaultExpr::None,
    })
}
