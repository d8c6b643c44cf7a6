//! Cursor over a whitespace-free token stream.

use sqlparser::tokenizer::Token;

/// Forward-only cursor used by the DDL grammar.
///
/// Keyword comparisons are case-insensitive and only match unquoted words, so
/// a quoted identifier such as `` `key` `` is never mistaken for a keyword.
pub(crate) struct TokenCursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenCursor {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        let tokens = tokens
            .into_iter()
            .filter(|t| !matches!(t, Token::Whitespace(_) | Token::EOF))
            .collect();
        Self { tokens, pos: 0 }
    }

    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    pub(crate) fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    pub(crate) fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn is_done(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// True at end of input or at a statement separator.
    pub(crate) fn at_statement_end(&self) -> bool {
        matches!(self.peek(), None | Some(Token::SemiColon))
    }

    pub(crate) fn peek_keyword(&self, keyword: &str) -> bool {
        self.peek().is_some_and(|t| is_keyword(t, keyword))
    }

    pub(crate) fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume a keyword sequence only if all of it is present.
    pub(crate) fn eat_keywords(&mut self, keywords: &[&str]) -> bool {
        let matches = keywords
            .iter()
            .enumerate()
            .all(|(i, kw)| self.peek_nth(i).is_some_and(|t| is_keyword(t, kw)));
        if matches {
            self.pos += keywords.len();
        }
        matches
    }

    pub(crate) fn eat_token(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Describe the current token for error messages.
    pub(crate) fn found(&self) -> String {
        match self.peek() {
            Some(token) => format!("'{token}'"),
            None => "end of input".to_string(),
        }
    }
}

/// Unquoted word equal to `keyword`, ignoring case.
pub(crate) fn is_keyword(token: &Token, keyword: &str) -> bool {
    match token {
        Token::Word(w) => w.quote_style.is_none() && w.value.eq_ignore_ascii_case(keyword),
        _ => false,
    }
}
