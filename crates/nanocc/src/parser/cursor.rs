//! Token stream cursor with one-token pushback

use std::mem::discriminant;

use crate::common::{CompileError, CompileResult, Span};
use crate::token::{Token, TokenKind};

/// Forward cursor over an `Eof`-terminated token vector.
///
/// The grammar needs exactly one token of lookbehind: a caller may push the
/// most recently taken token back with [`unget`](Self::unget) and nothing
/// else. Reading past `Eof` never happens in practice because every consumer
/// that takes `Eof` reports an error or ungets before reading again.
pub struct TokenCursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenCursor {
    /// The input must end with exactly one `Eof` token.
    pub fn new(tokens: Vec<Token>) -> Self {
        assert!(
            matches!(tokens.last(), Some(t) if t.kind == TokenKind::Eof),
            "token stream must be Eof-terminated"
        );
        Self { tokens, pos: 0 }
    }

    /// Current token without consuming it
    pub fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    /// Span of the current token, for diagnostics
    pub fn span(&self) -> Span {
        self.peek().span
    }

    /// Take the current token and advance
    pub fn get(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        self.pos += 1;
        tok
    }

    /// Consume the current token if it matches `kind`
    pub fn consume(&mut self, kind: &TokenKind) -> bool {
        if discriminant(&self.peek().kind) == discriminant(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Require the current token to match `kind`, consuming it.
    ///
    /// Matches on the token's discriminant, so payload-carrying kinds compare
    /// by shape only. On mismatch the cursor does not advance.
    pub fn expect(&mut self, kind: &TokenKind) -> CompileResult<Token> {
        let tok = self.peek();
        if discriminant(&tok.kind) == discriminant(kind) {
            Ok(self.get())
        } else {
            Err(CompileError::parser(
                format!("expected {kind}, found {}", tok.kind),
                tok.span,
            ))
        }
    }

    /// Push the most recently taken token back.
    ///
    /// Only the token just returned by [`get`](Self::get) may be pushed back;
    /// anything else is a caller bug.
    pub fn unget(&mut self, token: &Token) {
        assert!(self.pos > 0, "unget with no token taken");
        self.pos -= 1;
        assert_eq!(
            self.tokens[self.pos], *token,
            "unget of a token that was not the last one taken"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Span;

    fn stream(kinds: Vec<TokenKind>) -> TokenCursor {
        let tokens = kinds
            .into_iter()
            .enumerate()
            .map(|(i, kind)| Token::new(kind, Span::new(i, i + 1)))
            .collect();
        TokenCursor::new(tokens)
    }

    #[test]
    fn test_peek_get_consume() {
        let mut cur = stream(vec![TokenKind::Int, TokenKind::Semi, TokenKind::Eof]);
        assert_eq!(cur.peek().kind, TokenKind::Int);
        assert_eq!(cur.get().kind, TokenKind::Int);
        assert!(!cur.consume(&TokenKind::Comma));
        assert!(cur.consume(&TokenKind::Semi));
        assert_eq!(cur.peek().kind, TokenKind::Eof);
    }

    #[test]
    fn test_expect_matches_discriminant() {
        let mut cur = stream(vec![TokenKind::Num(7), TokenKind::Eof]);
        let tok = cur.expect(&TokenKind::Num(0)).unwrap();
        assert_eq!(tok.kind, TokenKind::Num(7));
    }

    #[test]
    fn test_expect_failure_does_not_advance() {
        let mut cur = stream(vec![TokenKind::Semi, TokenKind::Eof]);
        let err = cur.expect(&TokenKind::RBrace).unwrap_err();
        assert!(err.to_string().contains("'}'"));
        assert_eq!(cur.peek().kind, TokenKind::Semi);
    }

    #[test]
    fn test_unget() {
        let mut cur = stream(vec![TokenKind::Int, TokenKind::Eof]);
        let tok = cur.get();
        cur.unget(&tok);
        assert_eq!(cur.peek().kind, TokenKind::Int);
    }

    #[test]
    #[should_panic(expected = "not the last one taken")]
    fn test_unget_wrong_token() {
        let mut cur = stream(vec![TokenKind::Int, TokenKind::Semi, TokenKind::Eof]);
        let _ = cur.get();
        let other = Token::new(TokenKind::Comma, Span::new(0, 1));
        cur.unget(&other);
    }

    #[test]
    #[should_panic(expected = "Eof-terminated")]
    fn test_missing_eof() {
        let _ = stream(vec![TokenKind::Int]);
    }
}
