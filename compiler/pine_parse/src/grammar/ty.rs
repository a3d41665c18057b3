//! Type annotations.

use pine_ir::{TokenKind, TypeAnnotation};

use super::stmt::array_of;
use crate::{ParseError, Parser};

impl Parser<'_> {
    /// `name`, `lib.Name`, `name<args>`, or `name[]`.
    pub(crate) fn parse_type(&mut self) -> Result<TypeAnnotation, ParseError> {
        let (mut name, mut span) = self.expect_ident()?;
        while self.check(&TokenKind::Dot) {
            self.advance();
            let (part, part_span) = self.expect_ident()?;
            name.push('.');
            name.push_str(&part);
            span = span.merge(part_span);
        }

        let mut args = Vec::new();
        if self.check(&TokenKind::Lt) {
            self.advance();
            loop {
                args.push(self.parse_type()?);
                if !self.check(&TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
            span = span.merge(self.expect(&TokenKind::Gt)?.span);
        }

        let ty = TypeAnnotation { name, args, span };
        if self.check(&TokenKind::LBracket) && self.peek_kind(1) == &TokenKind::RBracket {
            self.advance();
            let close = self.advance().span;
            return Ok(array_of(ty, span.merge(close)));
        }
        Ok(ty)
    }
}
