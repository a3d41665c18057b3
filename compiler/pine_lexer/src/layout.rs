//! Layout pass: physical lines to logical `Newline`/`Indent`/`Dedent`.
//!
//! - newlines inside `()` or `[]` are dropped;
//! - a newline after a token that [continues the line] is dropped;
//! - blank and comment-only lines produce nothing;
//! - each logical line's leading width is compared against a stack of open
//!   block widths. Wider pushes and emits `Indent`; narrower pops, emitting
//!   one `Dedent` per level, and must land exactly on an open width.
//!
//! Every `Indent` has a matching `Dedent` before `Eof`.
//!
//! [continues the line]: TokenKind::continues_line

use pine_diagnostic::{Diagnostic, ErrorCode};
use pine_ir::{Span, Token, TokenKind, TokenList};

/// Columns a tab advances.
const TAB_WIDTH: u32 = 4;

struct Layout<'a> {
    source: &'a str,
    out: TokenList,
    /// Widths of the open blocks; the bottom entry is the first line's width.
    stack: Vec<u32>,
    /// `(` / `[` nesting.
    depth: u32,
    at_line_start: bool,
    pending_newline: Option<Span>,
    last_kind: Option<TokenKind>,
}

pub(crate) fn apply(source: &str, raw: Vec<Token>, errors: &mut Vec<Diagnostic>) -> TokenList {
    let mut layout = Layout {
        source,
        out: TokenList::new(),
        stack: Vec::new(),
        depth: 0,
        at_line_start: true,
        pending_newline: None,
        last_kind: None,
    };

    for token in raw {
        if token.kind == TokenKind::Newline {
            layout.newline(token.span);
        } else {
            layout.token(token, errors);
        }
    }

    layout.finish()
}

impl Layout<'_> {
    fn newline(&mut self, span: Span) {
        if self.depth > 0 || self.at_line_start {
            return;
        }
        if self.last_kind.as_ref().is_some_and(TokenKind::continues_line) {
            return;
        }
        self.pending_newline = Some(span);
        self.at_line_start = true;
    }

    fn token(&mut self, token: Token, errors: &mut Vec<Diagnostic>) {
        if self.at_line_start {
            self.at_line_start = false;
            if let Some(nl) = self.pending_newline.take() {
                self.out.push(Token::new(TokenKind::Newline, nl));
            }
            let width = self.indent_width(token.span.start);
            self.indentation(width, token.span, errors);
        }

        match token.kind {
            TokenKind::LParen | TokenKind::LBracket => self.depth += 1,
            TokenKind::RParen | TokenKind::RBracket => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }
        self.last_kind = Some(token.kind.clone());
        self.out.push(token);
    }

    fn indentation(&mut self, width: u32, at: Span, errors: &mut Vec<Diagnostic>) {
        let marker = Span::point(at.start);
        let Some(&top) = self.stack.last() else {
            self.stack.push(width);
            return;
        };

        if width > top {
            self.stack.push(width);
            self.out.push(Token::new(TokenKind::Indent, marker));
            return;
        }

        while self.stack.len() > 1 && self.stack.last().is_some_and(|&w| w > width) {
            self.stack.pop();
            self.out.push(Token::new(TokenKind::Dedent, marker));
        }

        if self.stack.last() != Some(&width) {
            errors.push(
                Diagnostic::error(ErrorCode::InconsistentIndent)
                    .with_message("unindent does not match any outer indentation level")
                    .with_label(at, format!("indented {width} columns")),
            );
        }
    }

    /// Width of the whitespace between the start of the line and `offset`.
    fn indent_width(&self, offset: u32) -> u32 {
        let end = (offset as usize).min(self.source.len());
        let line = self.source.get(..end).unwrap_or("");
        let start = line.rfind('\n').map_or(0, |i| i + 1);
        line[start..]
            .chars()
            .map(|c| match c {
                '\t' => TAB_WIDTH,
                ' ' => 1,
                _ => 0,
            })
            .sum()
    }

    fn finish(mut self) -> TokenList {
        let eof = Span::point(u32::try_from(self.source.len()).unwrap_or(u32::MAX));

        let has_content = self.last_kind.is_some();
        if let Some(nl) = self.pending_newline.take() {
            self.out.push(Token::new(TokenKind::Newline, nl));
        } else if has_content {
            self.out.push(Token::new(TokenKind::Newline, eof));
        }
        while self.stack.len() > 1 {
            self.stack.pop();
            self.out.push(Token::new(TokenKind::Dedent, eof));
        }
        self.out.push(Token::new(TokenKind::Eof, eof));
        self.out
    }
}
