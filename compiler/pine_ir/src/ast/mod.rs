//! Syntax tree.
//!
//! Expressions are arena-allocated ([`crate::ExprArena`]); statements are
//! owned values nested in [`Block`]s. Both are closed sum types so passes
//! can match exhaustively.

mod expr;
mod operators;
mod stmt;

pub use expr::{CallArg, Expr, ExprKind, IfBranch, IfChain, SwitchArm, SwitchExpr};
pub use operators::{AssignOp, BinaryOp, UnaryOp};
pub use stmt::{
    Block, Declaration, DeclarationKind, FieldDecl, ForInLoop, ForLoop, FunctionDecl, ImportDecl,
    MethodDecl, Module, Param, Persistence, Qualifier, Reassign, Stmt, StmtKind,
    TupleDestructure, TypeAnnotation, TypeDecl, VarDecl, WhileLoop,
};
