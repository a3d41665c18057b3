//! Postfix operators: calls, member access, history access.

use pine_ir::{CallArg, ExprId, ExprKind, TokenKind};

use crate::{ParseError, Parser};

impl Parser<'_> {
    pub(crate) fn parse_postfix(&mut self) -> Result<ExprId, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.current_kind() {
                TokenKind::LParen => {
                    let args = self.parse_call_args()?;
                    let span = self.span_of(expr).merge(self.previous_span());
                    expr = self.alloc(ExprKind::Call { callee: expr, args }, span);
                }
                TokenKind::Dot => {
                    self.advance();
                    let (field, field_span) = self.expect_ident_or_keyword()?;
                    let span = self.span_of(expr).merge(field_span);
                    expr = self.alloc(ExprKind::Member { object: expr, field }, span);
                    // `array.new<float>(...)`: element types are not kept.
                    if let Some(len) = self.generic_args_len() {
                        for _ in 0..len {
                            self.advance();
                        }
                    }
                }
                TokenKind::LBracket => {
                    let open = self.advance().span;
                    let offset = self.parse_expr()?;
                    if !self.check(&TokenKind::RBracket) {
                        return Err(ParseError::unclosed(
                            open,
                            self.current_kind(),
                            self.current_span(),
                            '[',
                        ));
                    }
                    let close = self.advance().span;
                    let span = self.span_of(expr).merge(close);
                    expr = self.alloc(ExprKind::History { base: expr, offset }, span);
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Length of `<T, ...>` when it is immediately followed by `(`.
    fn generic_args_len(&self) -> Option<usize> {
        if self.current_kind() != &TokenKind::Lt {
            return None;
        }
        let mut i = 1;
        loop {
            match self.peek_kind(i) {
                TokenKind::Ident(_) | TokenKind::Comma | TokenKind::Dot => i += 1,
                TokenKind::Gt => {
                    return (self.peek_kind(i + 1) == &TokenKind::LParen && i > 1).then_some(i + 1);
                }
                _ => return None,
            }
        }
    }

    /// `( [name =] value, ... )`; a trailing comma is allowed.
    pub(crate) fn parse_call_args(&mut self) -> Result<Vec<CallArg>, ParseError> {
        let open = self.expect(&TokenKind::LParen)?.span;
        let mut args = Vec::new();

        while !self.check(&TokenKind::RParen) {
            if self.is_at_end() {
                return Err(ParseError::unclosed(
                    open,
                    self.current_kind(),
                    self.current_span(),
                    '(',
                ));
            }
            let start = self.current_span();
            let name = match self.current_kind() {
                TokenKind::Ident(name) if self.peek_kind(1) == &TokenKind::Eq => {
                    self.advance();
                    self.advance();
                    Some(name.clone())
                }
                _ => None,
            };
            let value = self.parse_expr()?;
            args.push(CallArg {
                name,
                value,
                span: start.merge(self.span_of(value)),
            });
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        if !self.check(&TokenKind::RParen) {
            return Err(ParseError::unclosed(
                open,
                self.current_kind(),
                self.current_span(),
                '(',
            ));
        }
        self.advance();
        Ok(args)
    }
}
