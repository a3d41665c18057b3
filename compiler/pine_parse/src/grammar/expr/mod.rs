//! Expression parsing.
//!
//! - `mod.rs`: entry point and the binary precedence chain
//! - `operators.rs`: operator matching helpers
//! - `primary.rs`: literals, identifiers, groups, tuples, `if`/`switch`
//! - `postfix.rs`: calls, member access, history access
//!
//! Precedence, lowest first: `?:`, `or`, `and`, equality, relational,
//! additive, multiplicative, unary, postfix.

mod operators;
mod postfix;
mod primary;

use pine_ir::stack::ensure_sufficient_stack;
use pine_ir::{BinaryOp, ExprId, ExprKind, TokenKind};

use crate::{ParseError, Parser};

impl Parser<'_> {
    pub(crate) fn parse_expr(&mut self) -> Result<ExprId, ParseError> {
        ensure_sufficient_stack(|| self.parse_ternary())
    }

    /// `cond ? a : b`, right associative.
    fn parse_ternary(&mut self) -> Result<ExprId, ParseError> {
        let cond = self.parse_binary_or()?;
        if !self.check(&TokenKind::Question) {
            return Ok(cond);
        }
        self.advance();
        let then_branch = self.parse_expr()?;
        self.expect(&TokenKind::Colon)?;
        let else_branch = self.parse_expr()?;
        let span = self.span_of(cond).merge(self.span_of(else_branch));
        Ok(self.alloc(
            ExprKind::Ternary {
                cond,
                then_branch,
                else_branch,
            },
            span,
        ))
    }

    fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        let span = self.span_of(left).merge(self.span_of(right));
        self.alloc(ExprKind::Binary { op, left, right }, span)
    }

    fn parse_binary_or(&mut self) -> Result<ExprId, ParseError> {
        let mut left = self.parse_binary_and()?;
        while self.check(&TokenKind::Or) {
            self.advance();
            let right = self.parse_binary_and()?;
            left = self.binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_binary_and(&mut self) -> Result<ExprId, ParseError> {
        let mut left = self.parse_equality()?;
        while self.check(&TokenKind::And) {
            self.advance();
            let right = self.parse_equality()?;
            left = self.binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<ExprId, ParseError> {
        let mut left = self.parse_comparison()?;
        while let Some(op) = self.match_equality_op() {
            self.advance();
            let right = self.parse_comparison()?;
            left = self.binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<ExprId, ParseError> {
        let mut left = self.parse_additive()?;
        while let Some(op) = self.match_comparison_op() {
            self.advance();
            let right = self.parse_additive()?;
            left = self.binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<ExprId, ParseError> {
        let mut left = self.parse_multiplicative()?;
        while let Some(op) = self.match_additive_op() {
            self.advance();
            let right = self.parse_multiplicative()?;
            left = self.binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<ExprId, ParseError> {
        let mut left = self.parse_unary()?;
        while let Some(op) = self.match_multiplicative_op() {
            self.advance();
            let right = self.parse_unary()?;
            left = self.binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<ExprId, ParseError> {
        if let Some(op) = self.match_unary_op() {
            let start = self.advance().span;
            let operand = ensure_sufficient_stack(|| self.parse_unary())?;
            let span = start.merge(self.span_of(operand));
            return Ok(self.alloc(ExprKind::Unary { op, operand }, span));
        }
        self.parse_postfix()
    }
}
