//! Statement parsing.

use pine_diagnostic::ErrorCode;
use pine_ir::stack::ensure_sufficient_stack;
use pine_ir::{
    AssignOp, ExprKind, Persistence, Qualifier, Reassign, Span, Stmt, StmtKind,
    TupleDestructure, TypeAnnotation, VarDecl,
};
use pine_ir::TokenKind;

use crate::{ParseError, Parser};

impl Parser<'_> {
    pub(crate) fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        ensure_sufficient_stack(|| self.parse_stmt_inner())
    }

    fn parse_stmt_inner(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        match self.current_kind() {
            TokenKind::Export => {
                self.advance();
                self.parse_exportable(start, true)
            }
            TokenKind::Type if matches!(self.peek_kind(1), TokenKind::Ident(_)) => {
                self.parse_exportable(start, false)
            }
            TokenKind::Method if matches!(self.peek_kind(1), TokenKind::Ident(_)) => {
                self.parse_exportable(start, false)
            }
            TokenKind::Import => self.parse_import(start),
            TokenKind::If => {
                let chain = self.parse_if_chain()?;
                Ok(self.finish_stmt(StmtKind::If(chain), start))
            }
            TokenKind::For => self.parse_for(start),
            TokenKind::While => self.parse_while(start),
            TokenKind::Break => {
                self.advance();
                Ok(Stmt::new(StmtKind::Break, start))
            }
            TokenKind::Continue => {
                self.advance();
                Ok(Stmt::new(StmtKind::Continue, start))
            }
            TokenKind::Var | TokenKind::Varip => {
                let persistence = if self.check(&TokenKind::Var) {
                    Persistence::Var
                } else {
                    Persistence::Varip
                };
                self.advance();
                self.parse_var_decl(start, persistence)
            }
            TokenKind::LBracket if self.looks_like_tuple_destructure() => {
                self.parse_tuple_destructure(start)
            }
            TokenKind::True | TokenKind::False if self.is_reassign_op(self.peek_kind(1)) => {
                // Reported by the analyzer as a constant reassignment.
                let name = if self.check(&TokenKind::True) { "true" } else { "false" };
                let span = self.advance().span;
                let target = self.alloc(ExprKind::Ident(name.to_string()), span);
                self.parse_reassign_rest(start, target)
            }
            TokenKind::Ident(name) if name == "na" && self.is_reassign_op(self.peek_kind(1)) => {
                let span = self.advance().span;
                let target = self.alloc(ExprKind::Ident("na".to_string()), span);
                self.parse_reassign_rest(start, target)
            }
            TokenKind::Ident(name) => {
                if super::DECLARATION_NAMES.contains(&name.as_str())
                    && self.peek_kind(1) == &TokenKind::LParen
                {
                    return self.parse_declaration(start);
                }
                if self.looks_like_function_decl() {
                    return self.parse_function(start, false);
                }
                if self.looks_like_var_decl() {
                    return self.parse_var_decl(start, Persistence::Bar);
                }
                self.parse_expr_stmt(start)
            }
            _ => self.parse_expr_stmt(start),
        }
    }

    /// `type`, `method` or function declaration, optionally after `export`.
    fn parse_exportable(&mut self, start: Span, exported: bool) -> Result<Stmt, ParseError> {
        match self.current_kind() {
            TokenKind::Type => self.parse_type_decl(start, exported),
            TokenKind::Method => self.parse_method(start, exported),
            TokenKind::Ident(_) if self.looks_like_function_decl() => {
                self.parse_function(start, exported)
            }
            other => Err(ParseError::new(
                ErrorCode::UnexpectedToken,
                format!(
                    "expected `type`, `method` or a function after `export`, found `{}`",
                    other.display_name()
                ),
                self.current_span(),
            )),
        }
    }

    pub(crate) fn finish_stmt(&self, kind: StmtKind, start: Span) -> Stmt {
        Stmt::new(kind, start.merge(self.previous_span()))
    }

    fn parse_expr_stmt(&mut self, start: Span) -> Result<Stmt, ParseError> {
        let expr = self.parse_expr()?;
        if self.is_reassign_op(self.current_kind()) {
            return self.parse_reassign_rest(start, expr);
        }
        if self.check(&TokenKind::Eq) {
            return Err(ParseError::new(
                ErrorCode::UnexpectedToken,
                "only a plain name can be declared with `=`; use `:=` to reassign",
                self.current_span(),
            ));
        }
        Ok(self.finish_stmt(StmtKind::Expr(expr), start))
    }

    pub(crate) fn is_reassign_op(&self, kind: &TokenKind) -> bool {
        Self::assign_op(kind).is_some()
    }

    fn assign_op(kind: &TokenKind) -> Option<AssignOp> {
        match kind {
            TokenKind::ColonEq => Some(AssignOp::Assign),
            TokenKind::PlusEq => Some(AssignOp::Add),
            TokenKind::MinusEq => Some(AssignOp::Sub),
            TokenKind::StarEq => Some(AssignOp::Mul),
            TokenKind::SlashEq => Some(AssignOp::Div),
            TokenKind::PercentEq => Some(AssignOp::Mod),
            _ => None,
        }
    }

    fn parse_reassign_rest(
        &mut self,
        start: Span,
        target: pine_ir::ExprId,
    ) -> Result<Stmt, ParseError> {
        if !matches!(
            self.arena.kind(target),
            ExprKind::Ident(_) | ExprKind::Member { .. }
        ) {
            return Err(ParseError::new(
                ErrorCode::UnexpectedToken,
                "invalid reassignment target",
                self.span_of(target),
            )
            .with_context("expected a name or a field access"));
        }
        let op = Self::assign_op(self.current_kind()).unwrap_or(AssignOp::Assign);
        self.advance();
        let value = self.parse_expr()?;
        Ok(self.finish_stmt(StmtKind::Reassign(Reassign { target, op, value }), start))
    }

    /// `[qualifier] [type] name = value`, after any `var`/`varip`.
    fn parse_var_decl(
        &mut self,
        start: Span,
        persistence: Persistence,
    ) -> Result<Stmt, ParseError> {
        let qualifier = self.parse_qualifier();
        let ty = if self.has_type_before_name() {
            Some(self.parse_type()?)
        } else {
            None
        };
        let (name, name_span) = self.expect_ident()?;
        self.expect(&TokenKind::Eq)?;
        let value = self.parse_expr()?;
        Ok(self.finish_stmt(
            StmtKind::VarDecl(VarDecl {
                name,
                name_span,
                persistence,
                qualifier,
                ty,
                value,
            }),
            start,
        ))
    }

    /// A qualifier keyword is only a qualifier when a name or type follows.
    pub(crate) fn parse_qualifier(&mut self) -> Option<Qualifier> {
        let q = self.ident_text().and_then(Qualifier::from_name)?;
        if !matches!(self.peek_kind(1), TokenKind::Ident(_)) {
            return None;
        }
        self.advance();
        Some(q)
    }

    fn parse_tuple_destructure(&mut self, start: Span) -> Result<Stmt, ParseError> {
        self.expect(&TokenKind::LBracket)?;
        let mut names = Vec::new();
        loop {
            names.push(self.expect_ident()?);
            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(&TokenKind::RBracket)?;
        self.expect(&TokenKind::Eq)?;
        let value = self.parse_expr()?;
        Ok(self.finish_stmt(
            StmtKind::TupleDestructure(TupleDestructure { names, value }),
            start,
        ))
    }

    // Lookahead predicates. None of these consume tokens.

    /// `[a, b, ...] =`
    fn looks_like_tuple_destructure(&self) -> bool {
        let mut i = 1;
        loop {
            if !matches!(self.peek_kind(i), TokenKind::Ident(_)) {
                return false;
            }
            i += 1;
            match self.peek_kind(i) {
                TokenKind::Comma => i += 1,
                TokenKind::RBracket => return self.peek_kind(i + 1) == &TokenKind::Eq,
                _ => return false,
            }
        }
    }

    /// `name(...) =>`
    pub(crate) fn looks_like_function_decl(&self) -> bool {
        if self.peek_kind(1) != &TokenKind::LParen {
            return false;
        }
        let mut depth = 0usize;
        let mut i = 1;
        loop {
            match self.peek_kind(i) {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return self.peek_kind(i + 1) == &TokenKind::FatArrow;
                    }
                }
                TokenKind::Eof | TokenKind::Newline => return false,
                _ => {}
            }
            i += 1;
        }
    }

    /// `name =`, `type name =`, `qualifier [type] name =`.
    fn looks_like_var_decl(&self) -> bool {
        let mut i = 0;
        if self
            .ident_text()
            .and_then(Qualifier::from_name)
            .is_some()
            && matches!(self.peek_kind(1), TokenKind::Ident(_))
        {
            i = 1;
        }
        if self.peek_kind(i + 1) == &TokenKind::Eq {
            return matches!(self.peek_kind(i), TokenKind::Ident(_));
        }
        match self.type_len_at(i) {
            Some(len) => {
                matches!(self.peek_kind(i + len), TokenKind::Ident(_))
                    && self.peek_kind(i + len + 1) == &TokenKind::Eq
            }
            None => false,
        }
    }

    /// Whether the tokens at the cursor are `type name` rather than `name`.
    pub(crate) fn has_type_before_name(&self) -> bool {
        match self.type_len_at(0) {
            Some(len) => matches!(self.peek_kind(len), TokenKind::Ident(_)),
            None => false,
        }
    }

    /// Length in tokens of a type annotation starting `offset` tokens ahead.
    pub(crate) fn type_len_at(&self, offset: usize) -> Option<usize> {
        let mut i = offset;
        if !matches!(self.peek_kind(i), TokenKind::Ident(_)) {
            return None;
        }
        i += 1;
        while self.peek_kind(i) == &TokenKind::Dot
            && matches!(self.peek_kind(i + 1), TokenKind::Ident(_))
        {
            i += 2;
        }
        match self.peek_kind(i) {
            TokenKind::Lt => {
                let mut depth = 0usize;
                loop {
                    match self.peek_kind(i) {
                        TokenKind::Lt => depth += 1,
                        TokenKind::Gt => {
                            depth -= 1;
                            if depth == 0 {
                                i += 1;
                                break;
                            }
                        }
                        TokenKind::Ident(_) | TokenKind::Comma | TokenKind::Dot => {}
                        _ => return None,
                    }
                    i += 1;
                }
            }
            TokenKind::LBracket if self.peek_kind(i + 1) == &TokenKind::RBracket => i += 2,
            _ => {}
        }
        Some(i - offset)
    }
}

/// `float[]` is sugar for `array<float>`.
pub(crate) fn array_of(elem: TypeAnnotation, span: Span) -> TypeAnnotation {
    TypeAnnotation {
        name: "array".to_string(),
        args: vec![elem],
        span,
    }
}
