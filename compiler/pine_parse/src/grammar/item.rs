//! Top-level items: functions, methods, user types, imports, script headers.

use pine_diagnostic::ErrorCode;
use pine_ir::{
    Declaration, DeclarationKind, FieldDecl, FunctionDecl, ImportDecl, MethodDecl, Param, Span,
    Stmt, StmtKind, TokenKind, TypeDecl,
};

use crate::{ParseError, Parser};

impl Parser<'_> {
    /// `name(params) => body`
    pub(crate) fn parse_function(
        &mut self,
        start: Span,
        exported: bool,
    ) -> Result<Stmt, ParseError> {
        let (name, name_span) = self.expect_ident()?;
        let params = self.parse_params()?;
        self.expect(&TokenKind::FatArrow)?;
        let body = self.parse_block()?;
        Ok(self.finish_stmt(
            StmtKind::Function(FunctionDecl {
                name,
                name_span,
                params,
                body,
                exported,
            }),
            start,
        ))
    }

    /// `method name(Type self, params) => body`
    pub(crate) fn parse_method(
        &mut self,
        start: Span,
        exported: bool,
    ) -> Result<Stmt, ParseError> {
        self.expect(&TokenKind::Method)?;
        let (name, name_span) = self.expect_ident()?;
        let mut params = self.parse_params()?;
        if params.is_empty() {
            return Err(ParseError::new(
                ErrorCode::UnexpectedToken,
                format!("method `{name}` needs a typed first parameter"),
                name_span,
            ));
        }
        let receiver = params.remove(0);
        let Some(bound) = receiver.ty else {
            return Err(ParseError::new(
                ErrorCode::UnexpectedToken,
                format!("the first parameter of method `{name}` must name its type"),
                receiver.span,
            ));
        };
        self.expect(&TokenKind::FatArrow)?;
        let body = self.parse_block()?;
        Ok(self.finish_stmt(
            StmtKind::Method(MethodDecl {
                name,
                name_span,
                bound_type: bound.name,
                self_name: receiver.name,
                params,
                body,
                exported,
            }),
            start,
        ))
    }

    /// `( [qualifier] [type] name [= default], ... )`
    fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        let open = self.expect(&TokenKind::LParen)?.span;
        let mut params = Vec::new();

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
            self.parse_qualifier();
            let ty = if self.has_type_before_name() {
                Some(self.parse_type()?)
            } else {
                None
            };
            let (name, _) = self.expect_ident()?;
            let default = if self.check(&TokenKind::Eq) {
                self.advance();
                Some(self.parse_expr()?)
            } else {
                None
            };
            params.push(Param {
                name,
                ty,
                default,
                span: start.merge(self.previous_span()),
            });
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        self.expect(&TokenKind::RParen)?;
        Ok(params)
    }

    /// `type Name` followed by an indented list of `type field [= default]`.
    pub(crate) fn parse_type_decl(
        &mut self,
        start: Span,
        exported: bool,
    ) -> Result<Stmt, ParseError> {
        self.expect(&TokenKind::Type)?;
        let (name, name_span) = self.expect_ident()?;
        self.expect(&TokenKind::Newline)?;
        self.expect(&TokenKind::Indent)?;

        let mut fields = Vec::new();
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
            let field_start = self.current_span();
            self.parse_qualifier();
            let ty = self.parse_type()?;
            let (field, _) = self.expect_ident()?;
            let default = if self.check(&TokenKind::Eq) {
                self.advance();
                Some(self.parse_expr()?)
            } else {
                None
            };
            fields.push(FieldDecl {
                name: field,
                ty,
                default,
                span: field_start.merge(self.previous_span()),
            });
            self.expect_stmt_end()?;
        }

        Ok(self.finish_stmt(
            StmtKind::Type(TypeDecl {
                name,
                name_span,
                fields,
                exported,
            }),
            start,
        ))
    }

    /// `import owner/library/version [as alias]`
    pub(crate) fn parse_import(&mut self, start: Span) -> Result<Stmt, ParseError> {
        self.expect(&TokenKind::Import)?;
        let (owner, _) = self.expect_ident()?;
        self.expect(&TokenKind::Slash)?;
        let (library, _) = self.expect_ident()?;
        self.expect(&TokenKind::Slash)?;
        let version = match self.current_kind() {
            TokenKind::Int(v) => {
                let v = u32::try_from(*v).unwrap_or(u32::MAX);
                self.advance();
                v
            }
            other => {
                return Err(ParseError::new(
                    ErrorCode::UnexpectedToken,
                    format!("expected library version, found `{}`", other.display_name()),
                    self.current_span(),
                ));
            }
        };
        let alias = if self.check(&TokenKind::As) {
            self.advance();
            Some(self.expect_ident()?.0)
        } else {
            None
        };
        Ok(self.finish_stmt(
            StmtKind::Import(ImportDecl {
                owner,
                library,
                version,
                alias,
            }),
            start,
        ))
    }

    /// `indicator(...)`, `library(...)`, `strategy(...)`, `study(...)`
    pub(crate) fn parse_declaration(&mut self, start: Span) -> Result<Stmt, ParseError> {
        let (name, span) = self.expect_ident()?;
        let Some(kind) = DeclarationKind::from_name(&name) else {
            return Err(ParseError::new(
                ErrorCode::UnexpectedToken,
                format!("`{name}` is not a script declaration"),
                span,
            ));
        };
        let args = self.parse_call_args()?;
        Ok(self.finish_stmt(StmtKind::Declaration(Declaration { kind, args }), start))
    }
}
