//! Expression arena.
//!
//! Expressions are stored flat and referenced by [`ExprId`]. Every id is
//! handed out exactly once, to the node that owns it, so the arena encodes
//! a tree: no expression has two parents.

use std::fmt;

use crate::ast::{Expr, ExprKind};
use crate::Span;

/// Index of an expression in its [`ExprArena`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        ExprId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExprId({})", self.0)
    }
}

/// Flat storage for all expressions of one parsed module.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExprArena {
    exprs: Vec<Expr>,
}

impl ExprArena {
    pub fn new() -> Self {
        ExprArena { exprs: Vec::new() }
    }

    /// Store an expression and return its id.
    pub fn alloc(&mut self, kind: ExprKind, span: Span) -> ExprId {
        let index = u32::try_from(self.exprs.len()).unwrap_or(u32::MAX);
        self.exprs.push(Expr { kind, span });
        ExprId(index)
    }

    #[inline]
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    #[inline]
    pub fn kind(&self, id: ExprId) -> &ExprKind {
        &self.exprs[id.index()].kind
    }

    #[inline]
    pub fn span(&self, id: ExprId) -> Span {
        self.exprs[id.index()].span
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    /// Identifier name when `id` is a bare identifier.
    pub fn ident(&self, id: ExprId) -> Option<&str> {
        match self.kind(id) {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// Dotted path of an identifier/member chain, e.g. `ta.sma` or
    /// `input.int`. Returns `None` for any other shape.
    pub fn path(&self, id: ExprId) -> Option<String> {
        match self.kind(id) {
            ExprKind::Ident(name) => Some(name.clone()),
            ExprKind::Member { object, field } => {
                let mut base = self.path(*object)?;
                base.push('.');
                base.push_str(field);
                Some(base)
            }
            _ => None,
        }
    }

    /// Dotted path of a call's callee, when the expression is a call.
    pub fn callee_path(&self, id: ExprId) -> Option<String> {
        match self.kind(id) {
            ExprKind::Call { callee, .. } => self.path(*callee),
            _ => None,
        }
    }
}
