//! Intermediate representation shared by every stage of the pine compiler.
//!
//! - [`Span`]: byte ranges into the source text
//! - [`Token`] / [`TokenKind`] / [`TokenList`]: lexer output
//! - [`ast`]: the syntax tree (expression arena plus owned statements)
//! - [`visitor`]: generic read-only traversal
//! - [`stack`]: stack growth guard for deeply nested input

pub mod arena;
pub mod ast;
mod span;
pub mod stack;
mod token;
pub mod visitor;

pub use arena::{ExprArena, ExprId};
pub use ast::{
    AssignOp, BinaryOp, Block, CallArg, Declaration, DeclarationKind, Expr, ExprKind, FieldDecl,
    ForInLoop, ForLoop, FunctionDecl, IfBranch, IfChain, ImportDecl, MethodDecl, Module, Param,
    Persistence, Qualifier, Reassign, Stmt, StmtKind, SwitchArm, SwitchExpr, TupleDestructure,
    TypeAnnotation, TypeDecl, UnaryOp, VarDecl, WhileLoop,
};
pub use span::{Span, SpanError};
pub use token::{Token, TokenKind, TokenList};
