//! Blocks and the compound statements that own them.

use pine_diagnostic::ErrorCode;
use pine_ir::{
    Block, ForInLoop, ForLoop, IfBranch, IfChain, Span, Stmt, StmtKind, SwitchArm, SwitchExpr,
    TokenKind, WhileLoop,
};

use crate::{ParseError, Parser};

impl Parser<'_> {
    /// Parse a block in any of its three forms:
    /// an indented block, a `{ ... }` block, or one statement on the same line.
    pub(crate) fn parse_block(&mut self) -> Result<Block, ParseError> {
        if self.check(&TokenKind::LBrace) {
            return self.parse_brace_block();
        }
        if self.check(&TokenKind::Newline) && self.peek_kind(1) == &TokenKind::Indent {
            return self.parse_indented_block();
        }
        if matches!(self.current_kind(), TokenKind::Newline | TokenKind::Eof) {
            return Err(ParseError::new(
                ErrorCode::UnexpectedToken,
                "expected an indented block",
                self.current_span(),
            ));
        }
        let stmt = self.parse_stmt()?;
        let span = stmt.span;
        Ok(Block::new(vec![stmt], span))
    }

    fn parse_indented_block(&mut self) -> Result<Block, ParseError> {
        self.expect(&TokenKind::Newline)?;
        let open = self.expect(&TokenKind::Indent)?.span;
        let mut stmts = Vec::new();

        loop {
            self.skip_newlines();
            match self.current_kind() {
                TokenKind::Dedent => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => break,
                _ => {}
            }
            if let Some(stmt) = self.parse_block_stmt() {
                stmts.push(stmt);
            }
        }

        Ok(Block::new(stmts, open.merge(self.previous_span())))
    }

    fn parse_brace_block(&mut self) -> Result<Block, ParseError> {
        let open = self.expect(&TokenKind::LBrace)?.span;
        let mut stmts = Vec::new();

        loop {
            self.cursor.skip_layout();
            match self.current_kind() {
                TokenKind::RBrace => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => {
                    return Err(ParseError::unclosed(
                        open,
                        self.current_kind(),
                        self.current_span(),
                        '{',
                    ));
                }
                _ => {}
            }
            if let Some(stmt) = self.parse_block_stmt() {
                stmts.push(stmt);
            }
        }

        Ok(Block::new(stmts, open.merge(self.previous_span())))
    }

    /// One statement inside a block, recovering locally on error.
    fn parse_block_stmt(&mut self) -> Option<Stmt> {
        let start = self.cursor.position();
        match self.parse_stmt().and_then(|stmt| {
            self.expect_stmt_end()?;
            Ok(stmt)
        }) {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                self.recover(&e, start);
                None
            }
        }
    }

    /// `if c block {else if c block} [else block]`, statement or expression.
    pub(crate) fn parse_if_chain(&mut self) -> Result<IfChain, ParseError> {
        self.expect(&TokenKind::If)?;
        let cond = self.parse_expr()?;
        let body = self.parse_block()?;
        let mut branches = vec![IfBranch { cond, body }];
        let mut else_block = None;

        loop {
            // `}` newline `else` keeps the chain going.
            if self.check(&TokenKind::Newline)
                && self.peek_kind(1) == &TokenKind::Else
                && self.cursor.previous_kind() == Some(&TokenKind::RBrace)
            {
                self.advance();
            }
            if !self.check(&TokenKind::Else) {
                break;
            }
            self.advance();
            if self.check(&TokenKind::If) {
                self.advance();
                let cond = self.parse_expr()?;
                let body = self.parse_block()?;
                branches.push(IfBranch { cond, body });
            } else {
                else_block = Some(self.parse_block()?);
                break;
            }
        }

        Ok(IfChain {
            branches,
            else_block,
        })
    }

    /// `switch [subject]` followed by an indented list of `pattern => body`
    /// arms and an optional `=> body` default.
    pub(crate) fn parse_switch(&mut self) -> Result<SwitchExpr, ParseError> {
        self.expect(&TokenKind::Switch)?;
        let subject = if self.check(&TokenKind::Newline) || self.check(&TokenKind::LBrace) {
            None
        } else {
            Some(self.parse_expr()?)
        };

        let braced = self.check(&TokenKind::LBrace);
        if braced {
            self.advance();
        } else {
            self.expect(&TokenKind::Newline)?;
            self.expect(&TokenKind::Indent)?;
        }

        let mut arms = Vec::new();
        let mut default = None;

        loop {
            if braced {
                self.cursor.skip_layout();
                if self.check(&TokenKind::RBrace) {
                    self.advance();
                    break;
                }
            } else {
                self.skip_newlines();
                if self.check(&TokenKind::Dedent) {
                    self.advance();
                    break;
                }
            }
            if self.is_at_end() {
                break;
            }

            let arm_start = self.current_span();
            if self.check(&TokenKind::FatArrow) {
                self.advance();
                default = Some(self.parse_block()?);
            } else {
                let pattern = self.parse_expr()?;
                self.expect(&TokenKind::FatArrow)?;
                let body = self.parse_block()?;
                arms.push(SwitchArm {
                    pattern,
                    body,
                    span: arm_start.merge(self.previous_span()),
                });
            }
            if self.check(&TokenKind::Newline) {
                self.advance();
            }
        }

        Ok(SwitchExpr {
            subject,
            arms,
            default,
        })
    }

    /// `for i = a to b [by s]` or `for x in xs` / `for [i, x] in xs`.
    pub(crate) fn parse_for(&mut self, start: Span) -> Result<Stmt, ParseError> {
        self.expect(&TokenKind::For)?;

        if self.check(&TokenKind::LBracket) {
            self.advance();
            let index = self.expect_ident()?;
            self.expect(&TokenKind::Comma)?;
            let item = self.expect_ident()?;
            self.expect(&TokenKind::RBracket)?;
            self.expect(&TokenKind::In)?;
            return self.finish_for_in(start, Some(index), item);
        }

        let (var, var_span) = self.expect_ident()?;
        if self.check(&TokenKind::In) {
            return self.finish_for_in(start, None, (var, var_span));
        }

        self.expect(&TokenKind::Eq)?;
        let from = self.parse_expr()?;
        self.expect(&TokenKind::To)?;
        let to = self.parse_expr()?;
        let step = if self.check(&TokenKind::By) {
            self.advance();
            Some(self.parse_expr()?)
        } else {
            None
        };
        let body = self.parse_block()?;
        Ok(self.finish_stmt(
            StmtKind::For(ForLoop {
                var,
                var_span,
                from,
                to,
                step,
                body,
            }),
            start,
        ))
    }

    fn finish_for_in(
        &mut self,
        start: Span,
        index: Option<(String, Span)>,
        item: (String, Span),
    ) -> Result<Stmt, ParseError> {
        if self.check(&TokenKind::In) {
            self.advance();
        }
        let iterable = self.parse_expr()?;
        let body = self.parse_block()?;
        Ok(self.finish_stmt(
            StmtKind::ForIn(ForInLoop {
                index,
                item,
                iterable,
                body,
            }),
            start,
        ))
    }

    pub(crate) fn parse_while(&mut self, start: Span) -> Result<Stmt, ParseError> {
        self.expect(&TokenKind::While)?;
        let cond = self.parse_expr()?;
        let body = self.parse_block()?;
        Ok(self.finish_stmt(StmtKind::While(WhileLoop { cond, body }), start))
    }
}
