//! Statement emission.

use pine_ir::stack::ensure_sufficient_stack;
use pine_ir::{
    BinaryOp, Block, ExprId, ExprKind, ForInLoop, ForLoop, IfBranch, IfChain, Reassign, Span,
    Stmt, StmtKind, SwitchExpr, TupleDestructure, VarDecl, WhileLoop,
};

use super::expr::{self, ATOM};
use super::{func, recurrence};
use crate::collect::{const_value, CallRole};
use crate::context::EmitContext;

pub(crate) fn emit_stmts(ctx: &mut EmitContext<'_>, stmts: &[Stmt]) {
    for stmt in stmts {
        emit_stmt(ctx, stmt);
    }
}

/// Statements of a braced body, one level deeper.
pub(crate) fn emit_block(ctx: &mut EmitContext<'_>, block: &Block) {
    ctx.indent();
    emit_stmts(ctx, &block.stmts);
    ctx.dedent();
}

/// A block used as a value: its statements, then `return` of the tail
/// expression (`NaN` without one).
pub(crate) fn emit_returning(ctx: &mut EmitContext<'_>, block: &Block) {
    match (block.tail_expr(), block.stmts.split_last()) {
        (Some(tail), Some((_, init))) => {
            emit_stmts(ctx, init);
            let value = expr::emit_expr(ctx, tail);
            ctx.writeln(&format!("return {value};"));
        }
        _ => {
            emit_stmts(ctx, &block.stmts);
            ctx.writeln("return NaN;");
        }
    }
}

pub(crate) fn emit_stmt(ctx: &mut EmitContext<'_>, stmt: &Stmt) {
    ensure_sufficient_stack(|| match &stmt.kind {
        StmtKind::VarDecl(decl) => var_decl(ctx, decl),
        StmtKind::Reassign(re) => reassign(ctx, re, stmt.span),
        StmtKind::TupleDestructure(td) => destructure(ctx, td),
        StmtKind::If(chain) => if_stmt(ctx, chain),
        StmtKind::For(f) => for_loop(ctx, f),
        StmtKind::ForIn(f) => for_in(ctx, f),
        StmtKind::While(w) => while_loop(ctx, w),
        StmtKind::Break => loop_exit(ctx, "break", stmt.span),
        StmtKind::Continue => loop_exit(ctx, "continue", stmt.span),
        StmtKind::Expr(id) => expr_stmt(ctx, *id),
        StmtKind::Function(function) => func::emit_function(ctx, function),
        StmtKind::Method(method) => func::emit_method(ctx, method),
        // Written at module level, or configuration only.
        StmtKind::Type(_) | StmtKind::Import(_) | StmtKind::Declaration(_) => {}
    });
}

/// Whether `id` is a display or drawing call, which has no value in the
/// generated code.
pub(crate) fn is_display_call(ctx: &EmitContext<'_>, id: ExprId) -> bool {
    ctx.facts
        .call_role(id)
        .is_some_and(|role| !matches!(role, CallRole::Input(_)))
}

/// Handle a display call in statement position. Returns whether the
/// statement was consumed.
fn display_stmt(ctx: &mut EmitContext<'_>, id: ExprId) -> bool {
    match ctx.facts.call_role(id) {
        Some(CallRole::Plot(index)) => {
            plot(ctx, index);
            true
        }
        Some(CallRole::Hline(_) | CallRole::Fill | CallRole::Unsupported) => true,
        Some(CallRole::Input(_)) | None => false,
    }
}

fn plot(ctx: &mut EmitContext<'_>, index: usize) {
    let facts = ctx.facts;
    let Some(plot) = facts.plots.get(index) else {
        return;
    };
    let value = expr::series_operand(ctx, plot.value);
    ctx.writeln(&format!("const ${} = {value};", plot.id));
}

fn var_decl(ctx: &mut EmitContext<'_>, decl: &VarDecl) {
    if display_stmt(ctx, decl.value) {
        return;
    }
    let facts = ctx.facts;
    let binding = ctx.binding(&decl.name);
    let value_series = ctx.is_series(decl.value);
    let value = if decl.persistence.is_persistent() && value_series {
        // Initialised once, on the first bar.
        let first = expr::emit_expr(ctx, decl.value);
        ctx.lift(&format!("{first}.get(0)"))
    } else if facts.is_series(&binding) && !value_series {
        let value = expr::emit_expr(ctx, decl.value);
        ctx.lift(&value)
    } else {
        expr::emit_expr(ctx, decl.value)
    };
    let keyword = if facts.is_reassigned(&binding) { "let" } else { "const" };
    let name = ctx.ident(&decl.name);
    ctx.writeln(&format!("{keyword} {name} = {value};"));
}

fn reassign(ctx: &mut EmitContext<'_>, re: &Reassign, span: Span) {
    if display_stmt(ctx, re.value) {
        return;
    }
    let arena = ctx.arena;
    match arena.kind(re.target) {
        ExprKind::Ident(name) => {
            let binding = ctx.binding(name);
            if ctx.facts.needs_bar_loop(&binding, ctx.in_loop()) {
                recurrence::emit_recurrence(ctx, name, re);
                return;
            }
            let target = ctx.ident(name);
            let series = ctx.facts.is_series(&binding);
            let mut value = combine(ctx, &target, series, re);
            if let Some(mask) = ctx.mask().filter(|_| series) {
                value = format!("{mask}.iif({value}, {target})");
            }
            ctx.writeln(&format!("{target} = {value};"));
        }
        ExprKind::Member { .. } => {
            let target = expr::emit_expr(ctx, re.target);
            let series = ctx.is_series(re.target);
            let value = combine(ctx, &target, series, re);
            ctx.writeln(&format!("{target} = {value};"));
        }
        _ => ctx.warn(span, "only names and fields can be reassigned"),
    }
}

/// New value of a reassignment target, after any compound operator.
fn combine(ctx: &mut EmitContext<'_>, target: &str, series: bool, re: &Reassign) -> String {
    match re.op.binary_op() {
        None => {
            let value = expr::emit_expr(ctx, re.value);
            if series && !ctx.is_series(re.value) {
                ctx.lift(&value)
            } else {
                value
            }
        }
        Some(op) if series => {
            let value = expr::emit_expr(ctx, re.value);
            format!("{target}.{}({value})", op.method_name())
        }
        Some(op) => {
            let value = expr::operand(ctx, re.value, expr::precedence(op) + 1);
            format!("{target} {} {value}", expr::native_symbol(op))
        }
    }
}

fn destructure(ctx: &mut EmitContext<'_>, td: &TupleDestructure) {
    let value = expr::emit_expr(ctx, td.value);
    let reassigned = td
        .names
        .iter()
        .any(|(name, _)| ctx.facts.is_reassigned(&ctx.binding(name)));
    let names: Vec<String> = td.names.iter().map(|(name, _)| ctx.ident(name)).collect();
    let keyword = if reassigned { "let" } else { "const" };
    ctx.writeln(&format!("{keyword} [{}] = {value};", names.join(", ")));
}

/// Native branches up to the first per-bar condition; masked lowering from
/// there on.
fn if_stmt(ctx: &mut EmitContext<'_>, chain: &IfChain) {
    let split = chain
        .branches
        .iter()
        .position(|branch| ctx.is_series(branch.cond))
        .unwrap_or(chain.branches.len());
    let (native, masked) = chain.branches.split_at(split);

    for (index, branch) in native.iter().enumerate() {
        let cond = expr::emit_expr(ctx, branch.cond);
        if index == 0 {
            ctx.writeln(&format!("if ({cond}) {{"));
        } else {
            ctx.writeln(&format!("}} else if ({cond}) {{"));
        }
        emit_block(ctx, &branch.body);
    }

    if native.is_empty() {
        let arms = series_arms(ctx, masked);
        masked_chain(ctx, arms, chain.else_block.as_ref());
        return;
    }
    if masked.is_empty() {
        if let Some(block) = &chain.else_block {
            ctx.writeln("} else {");
            emit_block(ctx, block);
        }
    } else {
        ctx.writeln("} else {");
        ctx.indent();
        let arms = series_arms(ctx, masked);
        masked_chain(ctx, arms, chain.else_block.as_ref());
        ctx.dedent();
    }
    ctx.writeln("}");
}

fn series_arms<'b>(ctx: &mut EmitContext<'_>, branches: &'b [IfBranch]) -> Vec<(String, &'b Block)> {
    branches
        .iter()
        .map(|branch| (expr::series_operand(ctx, branch.cond), &branch.body))
        .collect()
}

/// Lower branches selected per bar.
///
/// Each branch runs on every bar under a mask: the conjunction of the
/// enclosing mask, the negation of every earlier condition and its own
/// condition. Reassignments inside only take effect where the mask holds.
fn masked_chain(ctx: &mut EmitContext<'_>, arms: Vec<(String, &Block)>, else_block: Option<&Block>) {
    let count = arms.len();
    let mut remaining = ctx.mask().map(str::to_string);
    for (index, (cond, body)) in arms.into_iter().enumerate() {
        let more = index + 1 < count || else_block.is_some();
        let mask = ctx.fresh_temp("m");
        match remaining.take() {
            None => {
                ctx.writeln(&format!("const {mask} = {cond};"));
                if more {
                    remaining = Some(format!("{mask}.not()"));
                }
            }
            Some(rest) if more => {
                let hoisted = ctx.fresh_temp("c");
                ctx.writeln(&format!("const {hoisted} = {cond};"));
                ctx.writeln(&format!("const {mask} = {rest}.and({hoisted});"));
                remaining = Some(format!("{rest}.and({hoisted}.not())"));
            }
            Some(rest) => ctx.writeln(&format!("const {mask} = {rest}.and({cond});")),
        }
        masked_block(ctx, mask, body);
    }
    if let Some(block) = else_block {
        match remaining {
            Some(rest) => {
                let mask = ctx.fresh_temp("m");
                ctx.writeln(&format!("const {mask} = {rest};"));
                masked_block(ctx, mask, block);
            }
            None => {
                ctx.writeln("{");
                emit_block(ctx, block);
                ctx.writeln("}");
            }
        }
    }
}

fn masked_block(ctx: &mut EmitContext<'_>, mask: String, body: &Block) {
    ctx.writeln("{");
    ctx.with_mask(mask, |ctx| emit_block(ctx, body));
    ctx.writeln("}");
}

/// A loop bound, read on the last bar when it is a series.
fn bound(ctx: &mut EmitContext<'_>, id: ExprId) -> String {
    if ctx.is_series(id) {
        ctx.warn(
            ctx.arena.span(id),
            "a loop bound that varies per bar uses its last value",
        );
        format!("{}.last()", expr::operand(ctx, id, ATOM))
    } else {
        expr::emit_expr(ctx, id)
    }
}

fn for_loop(ctx: &mut EmitContext<'_>, f: &ForLoop) {
    let arena = ctx.arena;
    let number = |id| const_value(arena, id).and_then(|value| value.as_f64());
    let descending = matches!((number(f.from), number(f.to)), (Some(from), Some(to)) if from > to);

    let from = bound(ctx, f.from);
    let to = bound(ctx, f.to);
    let step = f
        .step
        .map_or_else(|| "1".to_string(), |step| bound(ctx, step));
    let var = ctx.ident(&f.var);
    let (compare, update) = if descending { (">=", "-=") } else { ("<=", "+=") };
    ctx.writeln(&format!(
        "for (let {var} = {from}; {var} {compare} {to}; {var} {update} {step}) {{"
    ));
    ctx.with_loop(|ctx| emit_block(ctx, &f.body));
    ctx.writeln("}");
}

fn for_in(ctx: &mut EmitContext<'_>, f: &ForInLoop) {
    let iterable = expr::operand(ctx, f.iterable, ATOM);
    let item = ctx.ident(&f.item.0);
    let head = match &f.index {
        Some((index, _)) => {
            let index = ctx.ident(index);
            format!("for (const [{index}, {item}] of {iterable}.entries()) {{")
        }
        None => format!("for (const {item} of {iterable}) {{"),
    };
    ctx.writeln(&head);
    ctx.with_loop(|ctx| emit_block(ctx, &f.body));
    ctx.writeln("}");
}

fn while_loop(ctx: &mut EmitContext<'_>, w: &WhileLoop) {
    let cond = if ctx.is_series(w.cond) {
        ctx.warn(
            ctx.arena.span(w.cond),
            "a loop condition that varies per bar uses its last value",
        );
        ctx.use_facility("truthy");
        format!("truthy({}.last())", expr::operand(ctx, w.cond, ATOM))
    } else {
        expr::emit_expr(ctx, w.cond)
    };
    ctx.writeln(&format!("while ({cond}) {{"));
    ctx.with_loop(|ctx| emit_block(ctx, &w.body));
    ctx.writeln("}");
}

fn loop_exit(ctx: &mut EmitContext<'_>, keyword: &str, span: Span) {
    if ctx.mask().is_some() {
        ctx.warn(span, format!("`{keyword}` under a per-bar condition is dropped"));
        return;
    }
    ctx.writeln(&format!("{keyword};"));
}

fn expr_stmt(ctx: &mut EmitContext<'_>, id: ExprId) {
    if display_stmt(ctx, id) {
        return;
    }
    let arena = ctx.arena;
    match arena.kind(id) {
        ExprKind::Switch(switch) => switch_stmt(ctx, switch),
        ExprKind::If(chain) => if_stmt(ctx, chain),
        _ => {
            let text = expr::emit_expr(ctx, id);
            ctx.writeln(&format!("{text};"));
        }
    }
}

/// A switch in statement position: masked lowering when it selects per
/// bar, otherwise an `if` chain.
fn switch_stmt(ctx: &mut EmitContext<'_>, switch: &SwitchExpr) {
    if expr::switch_is_per_bar(ctx, switch) {
        let arms: Vec<_> = switch
            .arms
            .iter()
            .map(|arm| (expr::switch_condition(ctx, switch.subject, arm.pattern), &arm.body))
            .collect();
        masked_chain(ctx, arms, switch.default.as_ref());
        return;
    }

    let arena = ctx.arena;
    let subject = switch.subject.map(|subject| {
        let text = expr::operand(ctx, subject, ATOM);
        if matches!(arena.kind(subject), ExprKind::Ident(_)) {
            text
        } else {
            let temp = ctx.fresh_temp("s");
            ctx.writeln(&format!("const {temp} = {text};"));
            temp
        }
    });
    for (index, arm) in switch.arms.iter().enumerate() {
        let cond = match &subject {
            Some(subject) => {
                let strength = expr::precedence(BinaryOp::Eq) + 1;
                let pattern = expr::operand(ctx, arm.pattern, strength);
                format!("{subject} === {pattern}")
            }
            None => expr::emit_expr(ctx, arm.pattern),
        };
        if index == 0 {
            ctx.writeln(&format!("if ({cond}) {{"));
        } else {
            ctx.writeln(&format!("}} else if ({cond}) {{"));
        }
        emit_block(ctx, &arm.body);
    }
    match (&switch.default, switch.arms.is_empty()) {
        (Some(block), true) => {
            ctx.writeln("{");
            emit_block(ctx, block);
            ctx.writeln("}");
        }
        (Some(block), false) => {
            ctx.writeln("} else {");
            emit_block(ctx, block);
            ctx.writeln("}");
        }
        (None, false) => ctx.writeln("}"),
        (None, true) => {}
    }
}
