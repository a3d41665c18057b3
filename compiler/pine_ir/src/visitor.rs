//! Read-only AST traversal.
//!
//! Override `visit_*` methods to act on specific nodes and call the matching
//! `walk_*` function to continue into children. The visitor may mutate its
//! own state; the tree stays immutable.
//!
//! ```text
//! struct CountHistory(usize);
//!
//! impl<'ast> Visitor<'ast> for CountHistory {
//!     fn visit_expr(&mut self, id: ExprId, arena: &'ast ExprArena) {
//!         if matches!(arena.kind(id), ExprKind::History { .. }) {
//!             self.0 += 1;
//!         }
//!         walk_expr(self, id, arena);
//!     }
//! }
//! ```

use crate::stack::ensure_sufficient_stack;
use crate::{Block, ExprArena, ExprId, ExprKind, IfChain, Module, Stmt, StmtKind, SwitchExpr};

pub trait Visitor<'ast> {
    fn visit_module(&mut self, module: &'ast Module, arena: &'ast ExprArena) {
        walk_module(self, module, arena);
    }

    fn visit_stmt(&mut self, stmt: &'ast Stmt, arena: &'ast ExprArena) {
        walk_stmt(self, stmt, arena);
    }

    fn visit_block(&mut self, block: &'ast Block, arena: &'ast ExprArena) {
        walk_block(self, block, arena);
    }

    fn visit_expr(&mut self, id: ExprId, arena: &'ast ExprArena) {
        walk_expr(self, id, arena);
    }
}

pub fn walk_module<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    module: &'ast Module,
    arena: &'ast ExprArena,
) {
    for stmt in &module.stmts {
        visitor.visit_stmt(stmt, arena);
    }
}

pub fn walk_block<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    block: &'ast Block,
    arena: &'ast ExprArena,
) {
    for stmt in &block.stmts {
        visitor.visit_stmt(stmt, arena);
    }
}

fn walk_if_chain<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    chain: &'ast IfChain,
    arena: &'ast ExprArena,
) {
    for branch in &chain.branches {
        visitor.visit_expr(branch.cond, arena);
        visitor.visit_block(&branch.body, arena);
    }
    if let Some(else_block) = &chain.else_block {
        visitor.visit_block(else_block, arena);
    }
}

fn walk_switch<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    switch: &'ast SwitchExpr,
    arena: &'ast ExprArena,
) {
    if let Some(subject) = switch.subject {
        visitor.visit_expr(subject, arena);
    }
    for arm in &switch.arms {
        visitor.visit_expr(arm.pattern, arena);
        visitor.visit_block(&arm.body, arena);
    }
    if let Some(default) = &switch.default {
        visitor.visit_block(default, arena);
    }
}

pub fn walk_stmt<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    stmt: &'ast Stmt,
    arena: &'ast ExprArena,
) {
    ensure_sufficient_stack(|| walk_stmt_kind(visitor, stmt, arena));
}

fn walk_stmt_kind<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    stmt: &'ast Stmt,
    arena: &'ast ExprArena,
) {
    match &stmt.kind {
        StmtKind::VarDecl(decl) => visitor.visit_expr(decl.value, arena),
        StmtKind::Reassign(re) => {
            visitor.visit_expr(re.target, arena);
            visitor.visit_expr(re.value, arena);
        }
        StmtKind::TupleDestructure(td) => visitor.visit_expr(td.value, arena),
        StmtKind::If(chain) => walk_if_chain(visitor, chain, arena),
        StmtKind::For(f) => {
            visitor.visit_expr(f.from, arena);
            visitor.visit_expr(f.to, arena);
            if let Some(step) = f.step {
                visitor.visit_expr(step, arena);
            }
            visitor.visit_block(&f.body, arena);
        }
        StmtKind::ForIn(f) => {
            visitor.visit_expr(f.iterable, arena);
            visitor.visit_block(&f.body, arena);
        }
        StmtKind::While(w) => {
            visitor.visit_expr(w.cond, arena);
            visitor.visit_block(&w.body, arena);
        }
        StmtKind::Expr(id) => visitor.visit_expr(*id, arena),
        StmtKind::Function(func) => {
            for param in &func.params {
                if let Some(default) = param.default {
                    visitor.visit_expr(default, arena);
                }
            }
            visitor.visit_block(&func.body, arena);
        }
        StmtKind::Method(method) => {
            for param in &method.params {
                if let Some(default) = param.default {
                    visitor.visit_expr(default, arena);
                }
            }
            visitor.visit_block(&method.body, arena);
        }
        StmtKind::Type(ty) => {
            for field in &ty.fields {
                if let Some(default) = field.default {
                    visitor.visit_expr(default, arena);
                }
            }
        }
        StmtKind::Declaration(decl) => {
            for arg in &decl.args {
                visitor.visit_expr(arg.value, arena);
            }
        }
        StmtKind::Break | StmtKind::Continue | StmtKind::Import(_) => {}
    }
}

pub fn walk_expr<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    id: ExprId,
    arena: &'ast ExprArena,
) {
    ensure_sufficient_stack(|| walk_expr_kind(visitor, id, arena));
}

fn walk_expr_kind<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    id: ExprId,
    arena: &'ast ExprArena,
) {
    match arena.kind(id) {
        ExprKind::Int(_)
        | ExprKind::Float(_)
        | ExprKind::Bool(_)
        | ExprKind::Str(_)
        | ExprKind::Color(_)
        | ExprKind::Na
        | ExprKind::Ident(_) => {}
        ExprKind::Member { object, .. } => visitor.visit_expr(*object, arena),
        ExprKind::Call { callee, args } => {
            visitor.visit_expr(*callee, arena);
            for arg in args {
                visitor.visit_expr(arg.value, arena);
            }
        }
        ExprKind::Binary { left, right, .. } => {
            visitor.visit_expr(*left, arena);
            visitor.visit_expr(*right, arena);
        }
        ExprKind::Unary { operand, .. } => visitor.visit_expr(*operand, arena),
        ExprKind::Ternary {
            cond,
            then_branch,
            else_branch,
        } => {
            visitor.visit_expr(*cond, arena);
            visitor.visit_expr(*then_branch, arena);
            visitor.visit_expr(*else_branch, arena);
        }
        ExprKind::History { base, offset } => {
            visitor.visit_expr(*base, arena);
            visitor.visit_expr(*offset, arena);
        }
        ExprKind::Tuple(items) => {
            for item in items {
                visitor.visit_expr(*item, arena);
            }
        }
        ExprKind::If(chain) => walk_if_chain(visitor, chain, arena),
        ExprKind::Switch(switch) => walk_switch(visitor, switch, arena),
    }
}
