//! Expression nodes.

use crate::{BinaryOp, Block, ExprId, Span, UnaryOp};

/// An expression: kind plus location.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

/// Expression kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    /// `#RRGGBB` or `#RRGGBBAA`, normalised to upper-case hex.
    Color(String),
    Na,
    Ident(String),

    /// `object.field`
    Member { object: ExprId, field: String },

    /// `callee(args)`; the callee is usually an identifier or member chain.
    Call { callee: ExprId, args: Vec<CallArg> },

    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },

    Unary { op: UnaryOp, operand: ExprId },

    /// `cond ? then_branch : else_branch`
    Ternary {
        cond: ExprId,
        then_branch: ExprId,
        else_branch: ExprId,
    },

    /// `base[offset]`
    History { base: ExprId, offset: ExprId },

    /// `[a, b, c]`
    Tuple(Vec<ExprId>),

    /// `if` used as a value.
    If(IfChain),

    Switch(SwitchExpr),
}

impl ExprKind {
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            ExprKind::Int(_)
                | ExprKind::Float(_)
                | ExprKind::Bool(_)
                | ExprKind::Str(_)
                | ExprKind::Color(_)
                | ExprKind::Na
        )
    }
}

/// A call argument, positional or `name = value`.
#[derive(Clone, Debug, PartialEq)]
pub struct CallArg {
    pub name: Option<String>,
    pub value: ExprId,
    pub span: Span,
}

impl CallArg {
    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }
}

/// `if c1 ... else if c2 ... else ...`
///
/// Shared by the statement and the expression form.
#[derive(Clone, Debug, PartialEq)]
pub struct IfChain {
    /// At least one branch.
    pub branches: Vec<IfBranch>,
    pub else_block: Option<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IfBranch {
    pub cond: ExprId,
    pub body: Block,
}

/// `switch subject` with `pattern => body` arms and an optional default.
#[derive(Clone, Debug, PartialEq)]
pub struct SwitchExpr {
    /// `None` for the condition form, where each pattern is a boolean.
    pub subject: Option<ExprId>,
    pub arms: Vec<SwitchArm>,
    pub default: Option<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SwitchArm {
    pub pattern: ExprId,
    pub body: Block,
    pub span: Span,
}
