//! Bar-by-bar evaluation of recurrences.
//!
//! A reassignment that reads its own history (`x := a * x[1] + b`), or one
//! that carries a `var` from bar to bar, has no whole-series form. It is
//! evaluated as a scalar loop over the bars instead:
//!
//! ```text
//! const $in0 = <series input>;
//! const $buf0 = new Array<number>(bars.length).fill(NaN);
//! for (let $i = 0; $i < bars.length; $i++) {
//!   $buf0[$i] = <value on bar $i>;
//! }
//! x = Series.fromArray(bars, $buf0);
//! ```
//!
//! Series subexpressions that do not read the target are hoisted before the
//! loop and sampled with `.get($i)`. The target's own history is read back
//! from the buffer being filled.

use pine_ir::stack::ensure_sufficient_stack;
use pine_ir::visitor::{walk_expr, Visitor};
use pine_ir::{BinaryOp, CallArg, ExprArena, ExprId, ExprKind, Reassign, UnaryOp};

use super::expr::{self, LITERAL};
use crate::collect::const_value;
use crate::context::EmitContext;

/// The name being computed.
struct Target<'n> {
    name: &'n str,
    /// Spelling in the generated code.
    text: String,
    buffer: String,
    persistent: bool,
}

impl Target<'_> {
    /// Value of the target on bar `$i` before this reassignment.
    fn bare(&self) -> String {
        let Target { text, buffer, .. } = self;
        if self.persistent {
            format!("($i > 0 ? {buffer}[$i - 1] : {text}.get(0))")
        } else {
            format!("{text}.get($i)")
        }
    }
}

pub(crate) fn emit_recurrence(ctx: &mut EmitContext<'_>, name: &str, re: &Reassign) {
    let binding = ctx.binding(name);
    let target = Target {
        name,
        text: ctx.ident(name),
        buffer: ctx.fresh_temp("buf"),
        persistent: ctx.facts.persistent.contains(&binding),
    };
    tracing::trace!(name, persistent = target.persistent, "bar loop");

    let value = bar_expr(ctx, &target, re.value);
    let bare = target.bare();
    let mut next = match re.op.binary_op() {
        Some(op) => scalar_op(ctx, op, &bare, &value),
        None => value,
    };
    if let Some(mask) = ctx.mask().map(str::to_string) {
        ctx.use_facility("truthy");
        next = format!("truthy({mask}.get($i)) ? {next} : {bare}");
    }

    ctx.use_facility("Series");
    let Target { text, buffer, .. } = &target;
    ctx.writeln(&format!("const {buffer} = new Array<number>(bars.length).fill(NaN);"));
    ctx.writeln("for (let $i = 0; $i < bars.length; $i++) {");
    ctx.indent();
    ctx.writeln(&format!("{buffer}[$i] = {next};"));
    ctx.dedent();
    ctx.writeln("}");
    ctx.writeln(&format!("{text} = Series.fromArray(bars, {buffer});"));
}

/// Scalar expression for the value of `id` on bar `$i`.
fn bar_expr(ctx: &mut EmitContext<'_>, target: &Target<'_>, id: ExprId) -> String {
    ensure_sufficient_stack(|| bar_kind(ctx, target, id))
}

fn bar_kind(ctx: &mut EmitContext<'_>, target: &Target<'_>, id: ExprId) -> String {
    let arena = ctx.arena;
    if !mentions(arena, id, target.name) {
        return sample(ctx, id);
    }
    match arena.kind(id) {
        ExprKind::Ident(_) => target.bare(),
        ExprKind::History { base, offset } if arena.ident(*base) == Some(target.name) => {
            own_history(ctx, target, *offset)
        }
        ExprKind::Binary { op, left, right } => {
            let left = bar_expr(ctx, target, *left);
            let right = bar_expr(ctx, target, *right);
            scalar_op(ctx, *op, &left, &right)
        }
        ExprKind::Unary { op, operand } => {
            let value = bar_expr(ctx, target, *operand);
            match op {
                UnaryOp::Plus => value,
                UnaryOp::Neg => format!("(-{value})"),
                UnaryOp::Not => {
                    ctx.use_facility("truthy");
                    format!("(truthy({value}) ? 0 : 1)")
                }
            }
        }
        ExprKind::Ternary {
            cond,
            then_branch,
            else_branch,
        } => {
            let cond = bar_expr(ctx, target, *cond);
            let then_branch = bar_expr(ctx, target, *then_branch);
            let else_branch = bar_expr(ctx, target, *else_branch);
            ctx.use_facility("truthy");
            format!("(truthy({cond}) ? {then_branch} : {else_branch})")
        }
        ExprKind::Call { callee, args } => bar_call(ctx, target, id, *callee, args),
        _ => unsupported(ctx, id),
    }
}

/// A subexpression independent of the target: series are hoisted before
/// the loop, scalars are used as they are.
fn sample(ctx: &mut EmitContext<'_>, id: ExprId) -> String {
    if !ctx.is_series(id) {
        return expr::operand(ctx, id, LITERAL);
    }
    let text = expr::emit_expr(ctx, id);
    if matches!(ctx.arena.kind(id), ExprKind::Ident(_)) {
        return format!("{text}.get($i)");
    }
    let hoisted = ctx.fresh_temp("in");
    ctx.writeln(&format!("const {hoisted} = {text};"));
    format!("{hoisted}.get($i)")
}

/// `x[n]` of the target itself.
fn own_history(ctx: &mut EmitContext<'_>, target: &Target<'_>, offset: ExprId) -> String {
    let literal = const_value(ctx.arena, offset).and_then(|value| value.as_i64());
    let back = match literal {
        Some(0) => return target.bare(),
        Some(n) => n.to_string(),
        None => sample(ctx, offset),
    };
    ctx.use_facility("at");
    format!("at({}, $i - {back})", target.buffer)
}

fn bar_call(
    ctx: &mut EmitContext<'_>,
    target: &Target<'_>,
    id: ExprId,
    callee: ExprId,
    args: &[CallArg],
) -> String {
    let Some(path) = ctx.arena.path(callee) else {
        return unsupported(ctx, id);
    };
    let values: Vec<String> = args
        .iter()
        .map(|arg| bar_expr(ctx, target, arg.value))
        .collect();
    let values = values.join(", ");
    match path.as_str() {
        "nz" => {
            ctx.use_facility("nz");
            format!("nz({values})")
        }
        "na" => {
            ctx.use_facility("na");
            format!("(na({values}) ? 1 : 0)")
        }
        _ if path.starts_with("math.") && ctx.facts.is_namespace(ctx.owner(), "math") => {
            ctx.use_facility("math");
            format!("{path}({values})")
        }
        _ => unsupported(ctx, id),
    }
}

fn scalar_op(ctx: &mut EmitContext<'_>, op: BinaryOp, left: &str, right: &str) -> String {
    let symbol = expr::native_symbol(op);
    if op.is_arithmetic() {
        format!("({left} {symbol} {right})")
    } else if op.is_comparison() {
        format!("({left} {symbol} {right} ? 1 : 0)")
    } else {
        ctx.use_facility("truthy");
        format!("(truthy({left}) {symbol} truthy({right}) ? 1 : 0)")
    }
}

fn unsupported(ctx: &mut EmitContext<'_>, id: ExprId) -> String {
    ctx.warn(
        ctx.arena.span(id),
        "this expression cannot be evaluated bar by bar and is replaced with `na`",
    );
    "NaN".to_string()
}

/// Whether `id` reads `name` anywhere.
fn mentions(arena: &ExprArena, id: ExprId, name: &str) -> bool {
    let mut finder = Mentions { name, found: false };
    finder.visit_expr(id, arena);
    finder.found
}

struct Mentions<'n> {
    name: &'n str,
    found: bool,
}

impl<'ast> Visitor<'ast> for Mentions<'_> {
    fn visit_expr(&mut self, id: ExprId, arena: &'ast ExprArena) {
        if self.found {
            return;
        }
        if arena.ident(id) == Some(self.name) {
            self.found = true;
            return;
        }
        walk_expr(self, id, arena);
    }
}
