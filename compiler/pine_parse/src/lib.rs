//! Recursive descent parser for the pine indicator language.
//!
//! Produces a [`Module`] whose expressions live in an [`ExprArena`]. Parsing
//! never panics and never stops at the first problem: errors are collected
//! and the parser resynchronises at the next statement boundary.

mod cursor;
mod error;
mod grammar;
mod recovery;

pub use cursor::Cursor;
pub use error::ParseError;

use pine_diagnostic::{Diagnostic, ErrorCode};
use pine_ir::{ExprArena, ExprId, ExprKind, Module, Span, Token, TokenKind, TokenList};

/// Parser state.
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    arena: ExprArena,
    errors: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a TokenList) -> Self {
        Parser {
            cursor: Cursor::new(tokens),
            arena: ExprArena::new(),
            errors: Vec::new(),
        }
    }

    // Cursor delegation.

    #[inline]
    fn current_kind(&self) -> &'a TokenKind {
        self.cursor.current_kind()
    }

    #[inline]
    fn current_span(&self) -> Span {
        self.cursor.current_span()
    }

    #[inline]
    fn previous_span(&self) -> Span {
        self.cursor.previous_span()
    }

    #[inline]
    fn peek_kind(&self, n: usize) -> &'a TokenKind {
        self.cursor.peek_kind(n)
    }

    #[inline]
    fn is_at_end(&self) -> bool {
        self.cursor.is_at_end()
    }

    #[inline]
    fn check(&self, kind: &TokenKind) -> bool {
        self.cursor.check(kind)
    }

    #[inline]
    fn ident_text(&self) -> Option<&'a str> {
        self.cursor.ident_text()
    }

    #[inline]
    fn advance(&mut self) -> &'a Token {
        self.cursor.advance()
    }

    #[inline]
    fn skip_newlines(&mut self) {
        self.cursor.skip_newlines();
    }

    #[inline]
    fn expect(&mut self, kind: &TokenKind) -> Result<&'a Token, ParseError> {
        self.cursor.expect(kind)
    }

    #[inline]
    fn expect_ident(&mut self) -> Result<(String, Span), ParseError> {
        self.cursor.expect_ident()
    }

    #[inline]
    fn expect_ident_or_keyword(&mut self) -> Result<(String, Span), ParseError> {
        self.cursor.expect_ident_or_keyword()
    }

    fn alloc(&mut self, kind: ExprKind, span: Span) -> ExprId {
        self.arena.alloc(kind, span)
    }

    fn span_of(&self, id: ExprId) -> Span {
        self.arena.span(id)
    }

    fn report(&mut self, error: &ParseError) {
        tracing::trace!(code = %error.code, message = %error.message, "parse error");
        self.errors.push(error.to_diagnostic());
    }

    /// Report `error` and skip to the next statement. Always makes progress
    /// unless already at `Eof`.
    fn recover(&mut self, error: &ParseError, start: usize) {
        self.report(error);
        recovery::synchronize(&mut self.cursor);
        if self.cursor.position() == start && !self.is_at_end() {
            self.advance();
        }
    }

    /// Parse a whole module.
    pub fn parse_module(mut self) -> ParseOutput {
        let mut module = Module::default();

        loop {
            self.skip_newlines();
            match self.current_kind() {
                TokenKind::Eof => break,
                TokenKind::Dedent => {
                    self.advance();
                    continue;
                }
                TokenKind::Indent => {
                    let start = self.cursor.position();
                    let err = ParseError::new(
                        ErrorCode::UnexpectedToken,
                        "unexpected indentation",
                        self.current_span(),
                    );
                    self.recover(&err, start);
                    continue;
                }
                _ => {}
            }

            let start = self.cursor.position();
            match self.parse_stmt().and_then(|stmt| {
                self.expect_stmt_end()?;
                Ok(stmt)
            }) {
                Ok(stmt) => module.stmts.push(stmt),
                Err(e) => self.recover(&e, start),
            }
        }

        ParseOutput {
            module,
            arena: self.arena,
            errors: self.errors,
        }
    }

    /// A statement ends at a newline, at the end of its enclosing block, or
    /// right after a nested block it owns.
    fn expect_stmt_end(&mut self) -> Result<(), ParseError> {
        match self.current_kind() {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof | TokenKind::Dedent | TokenKind::RBrace => Ok(()),
            _ if matches!(
                self.cursor.previous_kind(),
                Some(TokenKind::Dedent | TokenKind::RBrace)
            ) =>
            {
                Ok(())
            }
            other => Err(ParseError::new(
                ErrorCode::UnexpectedToken,
                format!("expected end of line, found `{}`", other.display_name()),
                self.current_span(),
            )),
        }
    }
}

/// Parsed module, its expression arena, and every syntax error (lexical
/// errors first).
#[derive(Clone, Debug, Default)]
pub struct ParseOutput {
    pub module: Module,
    pub arena: ExprArena,
    pub errors: Vec<Diagnostic>,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Lex and parse `source`.
#[tracing::instrument(level = "debug", skip_all)]
pub fn parse(source: &str) -> ParseOutput {
    let lexed = pine_lexer::lex(source);
    let mut output = parse_tokens(&lexed.tokens);
    if !lexed.errors.is_empty() {
        let mut errors = lexed.errors;
        errors.append(&mut output.errors);
        output.errors = errors;
    }
    tracing::debug!(
        stmts = output.module.stmts.len(),
        exprs = output.arena.len(),
        errors = output.errors.len(),
        "parsed"
    );
    output
}

/// Parse an already lexed token list. The list must end in `Eof`.
pub fn parse_tokens(tokens: &TokenList) -> ParseOutput {
    if tokens.is_empty() {
        return ParseOutput::default();
    }
    Parser::new(tokens).parse_module()
}

#[cfg(test)]
mod tests;
