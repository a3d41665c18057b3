//! Token cursor for navigating the token stream.

use pine_diagnostic::ErrorCode;
use pine_ir::{Span, Token, TokenKind, TokenList};

use crate::ParseError;

/// Position in a [`TokenList`].
///
/// Invariant: the position is always a valid index and the list always ends
/// in `Eof`, so `current()` never fails and `advance()` stops at `Eof`.
pub struct Cursor<'a> {
    tokens: &'a TokenList,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(tokens: &'a TokenList) -> Self {
        Cursor { tokens, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn current(&self) -> &'a Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    #[inline]
    pub fn current_kind(&self) -> &'a TokenKind {
        &self.current().kind
    }

    #[inline]
    pub fn current_span(&self) -> Span {
        self.current().span
    }

    #[inline]
    pub fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::DUMMY
        }
    }

    pub fn previous_kind(&self) -> Option<&'a TokenKind> {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| &t.kind)
    }

    /// Kind of the token `n` positions ahead (`peek_kind(0)` is current).
    pub fn peek_kind(&self, n: usize) -> &'a TokenKind {
        match self.tokens.get(self.pos + n) {
            Some(token) => &token.kind,
            None => &self.tokens[self.tokens.len() - 1].kind,
        }
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    #[inline]
    pub fn check(&self, kind: &TokenKind) -> bool {
        self.current_kind() == kind
    }

    #[inline]
    pub fn check_ident(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Ident(_))
    }

    /// Current identifier text, if the current token is one.
    pub fn ident_text(&self) -> Option<&'a str> {
        match self.current_kind() {
            TokenKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn advance(&mut self) -> &'a Token {
        let token = self.current();
        if !self.is_at_end() {
            self.pos += 1;
        }
        tracing::trace!(kind = ?token.kind, "advance");
        token
    }

    pub fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    /// Skip every layout token (used inside brace-delimited blocks).
    pub fn skip_layout(&mut self) {
        while matches!(
            self.current_kind(),
            TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent
        ) {
            self.advance();
        }
    }

    pub fn expect(&mut self, kind: &TokenKind) -> Result<&'a Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::new(
                ErrorCode::UnexpectedToken,
                format!(
                    "expected `{}`, found `{}`",
                    kind.display_name(),
                    self.current_kind().display_name()
                ),
                self.current_span(),
            ))
        }
    }

    pub fn expect_ident(&mut self) -> Result<(String, Span), ParseError> {
        match self.current_kind() {
            TokenKind::Ident(name) => {
                let span = self.advance().span;
                Ok((name.clone(), span))
            }
            other => Err(ParseError::new(
                ErrorCode::UnexpectedToken,
                format!("expected identifier, found `{}`", other.display_name()),
                self.current_span(),
            )),
        }
    }

    /// Accept an identifier or a keyword usable as a name after `.`
    /// (`plot.style_line`, `x.type`).
    pub fn expect_ident_or_keyword(&mut self) -> Result<(String, Span), ParseError> {
        if let Some(name) = self.current_kind().keyword_as_name() {
            let span = self.advance().span;
            return Ok((name.to_string(), span));
        }
        self.expect_ident()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_stops_at_eof() {
        let tokens = pine_lexer::lex("a").tokens;
        let mut cursor = Cursor::new(&tokens);
        assert!(cursor.check_ident());
        cursor.advance();
        assert!(cursor.check(&TokenKind::Newline));
        cursor.advance();
        assert!(cursor.is_at_end());
        cursor.advance();
        assert!(cursor.is_at_end());
        assert_eq!(cursor.peek_kind(10), &TokenKind::Eof);
    }

    #[test]
    fn test_expect_reports_found_token() {
        let tokens = pine_lexer::lex(")").tokens;
        let mut cursor = Cursor::new(&tokens);
        let err = cursor.expect(&TokenKind::LParen).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnexpectedToken);
        assert_eq!(err.message, "expected `(`, found `)`");
    }
}
