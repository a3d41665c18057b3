//! Primary expressions.

use pine_ir::{ExprId, ExprKind, Span, TokenKind};

use crate::{ParseError, Parser};

impl Parser<'_> {
    pub(crate) fn parse_primary(&mut self) -> Result<ExprId, ParseError> {
        let span = self.current_span();
        let kind = match self.current_kind() {
            TokenKind::Int(n) => ExprKind::Int(i64::try_from(*n).unwrap_or(i64::MAX)),
            TokenKind::Float(bits) => ExprKind::Float(f64::from_bits(*bits)),
            TokenKind::Str(s) => ExprKind::Str(s.clone()),
            TokenKind::Color(c) => ExprKind::Color(c.clone()),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            // `na` is a value; `na(x)` is the built-in test.
            TokenKind::Ident(name) if name == "na" && self.peek_kind(1) != &TokenKind::LParen => {
                ExprKind::Na
            }
            TokenKind::Ident(name) => ExprKind::Ident(name.clone()),
            // Already reported by the lexer.
            TokenKind::Error => ExprKind::Na,
            TokenKind::LParen => return self.parse_group(),
            TokenKind::LBracket => return self.parse_tuple(),
            TokenKind::If => {
                let chain = self.parse_if_chain()?;
                let span = span.merge(self.previous_span());
                return Ok(self.alloc(ExprKind::If(chain), span));
            }
            TokenKind::Switch => {
                let switch = self.parse_switch()?;
                let span = span.merge(self.previous_span());
                return Ok(self.alloc(ExprKind::Switch(switch), span));
            }
            other => return Err(ParseError::expected_expression(other, span)),
        };
        self.advance();
        Ok(self.alloc(kind, span))
    }

    /// `( expr )`. Grouping leaves no node behind.
    fn parse_group(&mut self) -> Result<ExprId, ParseError> {
        let open = self.expect(&TokenKind::LParen)?.span;
        let inner = self.parse_expr()?;
        if !self.check(&TokenKind::RParen) {
            return Err(ParseError::unclosed(
                open,
                self.current_kind(),
                self.current_span(),
                '(',
            ));
        }
        self.advance();
        Ok(inner)
    }

    /// `[a, b, c]`
    fn parse_tuple(&mut self) -> Result<ExprId, ParseError> {
        let open = self.expect(&TokenKind::LBracket)?.span;
        let mut items = Vec::new();
        while !self.check(&TokenKind::RBracket) {
            if self.is_at_end() {
                break;
            }
            items.push(self.parse_expr()?);
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        if !self.check(&TokenKind::RBracket) {
            return Err(ParseError::unclosed(
                open,
                self.current_kind(),
                self.current_span(),
                '[',
            ));
        }
        let close = self.advance().span;
        Ok(self.alloc(ExprKind::Tuple(items), Span::merge(open, close)))
    }
}
