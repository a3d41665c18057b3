//! Expression emission.
//!
//! Every expression is written in one of two forms, picked by its
//! classification: series expressions become method chains on `Series`
//! (`close.sub(open)`), scalar expressions use native operators
//! (`a + b`). A scalar that has to take part in a series operation is lifted
//! with `Series.constant(bars, x)`.

use std::fmt::Write;

use pine_ir::stack::ensure_sufficient_stack;
use pine_ir::{BinaryOp, Block, CallArg, ExprId, ExprKind, IfChain, SwitchExpr, UnaryOp};
use pine_types::{builtins, Type};
use serde_json::Value;

use super::names::{float_literal, quote};
use super::stmt;
use crate::collect::{const_value, Binding, CallRole, InputKind, Owner};
use crate::context::EmitContext;

/// Needs no parentheses anywhere.
pub(crate) const ATOM: u8 = 9;
/// Number literals: safe as operands, not as method receivers.
pub(crate) const LITERAL: u8 = 8;
const UNARY: u8 = 7;
const TERNARY: u8 = 0;

/// Binding strength of a native binary operator.
pub(crate) const fn precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Or => 1,
        BinaryOp::And => 2,
        BinaryOp::Eq | BinaryOp::NotEq => 3,
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => 4,
        BinaryOp::Add | BinaryOp::Sub => 5,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 6,
    }
}

/// TypeScript spelling of a binary operator.
pub(crate) const fn native_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Eq => "===",
        BinaryOp::NotEq => "!==",
        BinaryOp::And => "&&",
        BinaryOp::Or => "||",
        _ => op.as_symbol(),
    }
}

pub(crate) fn emit_expr(ctx: &mut EmitContext<'_>, id: ExprId) -> String {
    ensure_sufficient_stack(|| emit_kind(ctx, id))
}

/// Emit `id`, parenthesized unless it binds at least as tightly as `min`.
pub(crate) fn operand(ctx: &mut EmitContext<'_>, id: ExprId, min: u8) -> String {
    let text = emit_expr(ctx, id);
    if expr_precedence(ctx, id) < min {
        format!("({text})")
    } else {
        text
    }
}

/// Emit `id` as a series, lifting a scalar.
pub(crate) fn series_operand(ctx: &mut EmitContext<'_>, id: ExprId) -> String {
    let text = emit_expr(ctx, id);
    if ctx.is_series(id) {
        text
    } else {
        ctx.lift(&text)
    }
}

fn expr_precedence(ctx: &EmitContext<'_>, id: ExprId) -> u8 {
    if ctx.is_series(id) {
        return ATOM;
    }
    match ctx.arena.kind(id) {
        ExprKind::Binary { op, .. } => precedence(*op),
        ExprKind::Unary {
            op: UnaryOp::Plus,
            operand,
        } => expr_precedence(ctx, *operand),
        ExprKind::Unary { .. } => UNARY,
        ExprKind::Ternary { .. } => TERNARY,
        ExprKind::Int(_) | ExprKind::Float(_) => LITERAL,
        _ => ATOM,
    }
}

fn emit_kind(ctx: &mut EmitContext<'_>, id: ExprId) -> String {
    let arena = ctx.arena;
    match arena.kind(id) {
        ExprKind::Int(n) => n.to_string(),
        ExprKind::Float(f) => float_literal(*f),
        ExprKind::Bool(b) => b.to_string(),
        ExprKind::Str(s) | ExprKind::Color(s) => quote(s),
        ExprKind::Na => "NaN".to_string(),
        ExprKind::Ident(name) => {
            if ctx.is_builtin_series(name) {
                name.clone()
            } else {
                ctx.ident(name)
            }
        }
        ExprKind::Member { object, field } => member(ctx, id, *object, field),
        ExprKind::Call { callee, args } => call(ctx, id, *callee, args),
        ExprKind::Binary { op, left, right } => binary(ctx, id, *op, *left, *right),
        ExprKind::Unary { op, operand } => unary(ctx, id, *op, *operand),
        ExprKind::Ternary {
            cond,
            then_branch,
            else_branch,
        } => ternary(ctx, id, *cond, *then_branch, *else_branch),
        ExprKind::History { base, offset } => history(ctx, *base, *offset),
        ExprKind::Tuple(items) => {
            let items: Vec<String> = items.iter().map(|item| emit_expr(ctx, *item)).collect();
            format!("[{}]", items.join(", "))
        }
        ExprKind::If(chain) => if_expr(ctx, id, chain),
        ExprKind::Switch(switch) => switch_expr(ctx, id, switch),
    }
}

/// TypeScript literal of a compile-time constant.
pub(crate) fn value_literal(value: &Value) -> String {
    match value {
        Value::Null => "NaN".to_string(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(value_literal).collect();
            format!("[{}]", items.join(", "))
        }
        other => other.to_string(),
    }
}

/// The built-in namespace `id` names, unless a user binding shadows it.
fn namespace_of<'x>(ctx: &EmitContext<'x>, id: ExprId) -> Option<&'x str> {
    let name = ctx.arena.ident(id)?;
    ctx.facts.is_namespace(ctx.owner(), name).then_some(name)
}

/// A module-level name no user binding shadows, e.g. a type or an import.
fn declared_root<'x>(ctx: &EmitContext<'x>, id: ExprId) -> Option<&'x str> {
    let name = ctx.arena.ident(id)?;
    (ctx.binding(name).owner == Owner::Module && !ctx.facts.declares_at_module(name))
        .then_some(name)
}

fn member(ctx: &mut EmitContext<'_>, id: ExprId, object: ExprId, field: &str) -> String {
    if let Some(namespace) = namespace_of(ctx, object) {
        if let Some(value) = const_value(ctx.arena, id) {
            return value_literal(&value);
        }
        ctx.use_namespace(namespace);
        let path = format!("{namespace}.{field}");
        // Per-bar namespace values are computed from the bars.
        return if builtins::member_type(&path).is_series() {
            format!("{path}(bars)")
        } else {
            path
        };
    }
    if let Some(name) = declared_root(ctx, object).filter(|name| ctx.facts.import(name).is_some()) {
        return format!("{}.{field}", ctx.ident(name));
    }
    format!("{}.{field}", operand(ctx, object, ATOM))
}

fn binary(ctx: &mut EmitContext<'_>, id: ExprId, op: BinaryOp, left: ExprId, right: ExprId) -> String {
    if ctx.is_series(id) {
        let receiver = series_operand(ctx, left);
        let right = emit_expr(ctx, right);
        return format!("{receiver}.{}({right})", op.method_name());
    }
    let strength = precedence(op);
    let left = operand(ctx, left, strength);
    let right = operand(ctx, right, strength + 1);
    format!("{left} {} {right}", native_symbol(op))
}

fn unary(ctx: &mut EmitContext<'_>, id: ExprId, op: UnaryOp, operand_id: ExprId) -> String {
    match op {
        UnaryOp::Plus => emit_expr(ctx, operand_id),
        _ if ctx.is_series(id) => {
            let receiver = series_operand(ctx, operand_id);
            let method = if op == UnaryOp::Neg { "neg" } else { "not" };
            format!("{receiver}.{method}()")
        }
        UnaryOp::Neg => {
            let text = operand(ctx, operand_id, UNARY);
            if text.starts_with('-') {
                format!("-({text})")
            } else {
                format!("-{text}")
            }
        }
        UnaryOp::Not => format!("!{}", operand(ctx, operand_id, UNARY)),
    }
}

fn ternary(
    ctx: &mut EmitContext<'_>,
    id: ExprId,
    cond: ExprId,
    then_branch: ExprId,
    else_branch: ExprId,
) -> String {
    if ctx.is_series(id) {
        let cond = series_operand(ctx, cond);
        let then_branch = emit_expr(ctx, then_branch);
        let else_branch = emit_expr(ctx, else_branch);
        return format!("{cond}.iif({then_branch}, {else_branch})");
    }
    let cond = operand(ctx, cond, TERNARY + 1);
    let then_branch = operand(ctx, then_branch, TERNARY + 1);
    let else_branch = operand(ctx, else_branch, TERNARY);
    format!("{cond} ? {then_branch} : {else_branch}")
}

fn history(ctx: &mut EmitContext<'_>, base: ExprId, offset: ExprId) -> String {
    let base = series_operand(ctx, base);
    let offset = if ctx.is_series(offset) {
        ctx.warn(
            ctx.arena.span(offset),
            "a history offset that varies per bar uses its last value",
        );
        format!("{}.last()", emit_expr(ctx, offset))
    } else {
        emit_expr(ctx, offset)
    };
    format!("{base}.offset({offset})")
}

fn call(ctx: &mut EmitContext<'_>, id: ExprId, callee: ExprId, args: &[CallArg]) -> String {
    if let Some(role) = ctx.facts.call_role(id) {
        return match role {
            CallRole::Input(index) => input_ref(ctx, index),
            CallRole::Plot(_) | CallRole::Hline(_) | CallRole::Fill | CallRole::Unsupported => {
                "undefined".to_string()
            }
        };
    }
    let arena = ctx.arena;
    match arena.kind(callee) {
        ExprKind::Ident(name) => function_call(ctx, name, args),
        ExprKind::Member { object, field } => member_call(ctx, id, *object, field, args),
        _ => {
            let callee = operand(ctx, callee, ATOM);
            format!("{callee}({})", written_args(ctx, args))
        }
    }
}

fn input_ref(ctx: &mut EmitContext<'_>, index: usize) -> String {
    let facts = ctx.facts;
    let Some(input) = facts.inputs.get(index) else {
        return "undefined".to_string();
    };
    let value = format!("$inputs.{}", input.id);
    if input.kind == InputKind::Source {
        ctx.use_facility("Series");
        format!("Series.field(bars, {value})")
    } else {
        value
    }
}

/// Arguments in written order.
fn written_args(ctx: &mut EmitContext<'_>, args: &[CallArg]) -> String {
    let args: Vec<String> = args.iter().map(|arg| emit_expr(ctx, arg.value)).collect();
    args.join(", ")
}

/// Arguments placed by parameter, with gaps passed as `undefined`.
///
/// With `owner`, arguments bound to a series parameter of that function or
/// method are lifted.
fn ordered_args(
    ctx: &mut EmitContext<'_>,
    owner: Option<&str>,
    params: &[String],
    args: &[CallArg],
) -> String {
    let facts = ctx.facts;
    let mut slots: Vec<Option<String>> = vec![None; params.len()];
    let mut extra = Vec::new();
    let mut next = 0;
    for arg in args {
        let index = match &arg.name {
            Some(name) => params.iter().position(|param| param == name),
            None => {
                let index = next;
                next += 1;
                Some(index).filter(|index| *index < params.len())
            }
        };
        let lift = index.zip(owner).is_some_and(|(index, owner)| {
            facts.is_series(&Binding::local(owner, params[index].as_str()))
        });
        let text = if lift {
            series_operand(ctx, arg.value)
        } else {
            emit_expr(ctx, arg.value)
        };
        match index {
            Some(index) => slots[index] = Some(text),
            None => extra.push(text),
        }
    }
    let used = slots.iter().rposition(Option::is_some).map_or(0, |last| last + 1);
    slots.truncate(used);
    slots
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| "undefined".to_string()))
        .chain(extra)
        .collect::<Vec<_>>()
        .join(", ")
}

fn function_call(ctx: &mut EmitContext<'_>, name: &str, args: &[CallArg]) -> String {
    let facts = ctx.facts;
    if ctx.binding(name).owner == Owner::Module {
        if let Some(function) = facts.function(name) {
            let args = ordered_args(ctx, Some(name), &function.params, args);
            return format!("{}({args})", ctx.ident(name));
        }
    }
    let facility = match name {
        "nz" => return nz(ctx, args),
        "na" => "na",
        "fixnan" => "fixnan",
        "timestamp" => "timestamp",
        "int" => "toInt",
        "float" => "toFloat",
        "bool" => "toBool",
        _ => return format!("{}({})", ctx.ident(name), written_args(ctx, args)),
    };
    ctx.use_facility(facility);
    format!("{facility}({})", written_args(ctx, args))
}

fn nz(ctx: &mut EmitContext<'_>, args: &[CallArg]) -> String {
    let Some(first) = args.first() else {
        return "NaN".to_string();
    };
    if ctx.is_series(first.value) {
        let receiver = emit_expr(ctx, first.value);
        let replacement = args
            .get(1)
            .map_or_else(|| "0".to_string(), |arg| emit_expr(ctx, arg.value));
        return format!("{receiver}.nz({replacement})");
    }
    ctx.use_facility("nz");
    format!("nz({})", written_args(ctx, args))
}

fn member_call(
    ctx: &mut EmitContext<'_>,
    id: ExprId,
    object: ExprId,
    field: &str,
    args: &[CallArg],
) -> String {
    let facts = ctx.facts;
    if let Some(namespace) = namespace_of(ctx, object) {
        if let Some(value) = const_value(ctx.arena, id) {
            return value_literal(&value);
        }
        ctx.use_namespace(namespace);
        return format!("{namespace}.{field}({})", written_args(ctx, args));
    }
    if let Some(name) = declared_root(ctx, object) {
        if facts.import(name).is_some() {
            return format!("{}.{field}({})", ctx.ident(name), written_args(ctx, args));
        }
        if let Some(ty) = facts.user_type(name).filter(|_| field == "new") {
            let fields: Vec<String> = ty.fields.iter().map(|f| f.name.clone()).collect();
            let args = ordered_args(ctx, None, &fields, args);
            return format!("{}_new({args})", ctx.ident(&ty.name));
        }
    }
    method_call(ctx, object, field, args)
}

fn method_call(ctx: &mut EmitContext<'_>, object: ExprId, field: &str, args: &[CallArg]) -> String {
    let facts = ctx.facts;
    let analysis = ctx.analysis;
    let receiver_ty = analysis.expr_type(object).scalar();
    let method = match receiver_ty {
        Type::Udt(type_name) => facts.method(type_name, field),
        Type::Array(_) => None,
        _ => facts.unique_method(field),
    };

    if let Some(method) = method {
        let key = method.owner_key();
        let receiver = if facts.is_series(&Binding::local(key.as_str(), method.self_name.as_str())) {
            series_operand(ctx, object)
        } else {
            emit_expr(ctx, object)
        };
        let rest = ordered_args(ctx, Some(&key), &method.params, args);
        return format!(
            "{}_{}({})",
            ctx.ident(&method.type_name),
            method.name,
            join_receiver(receiver, &rest)
        );
    }
    if matches!(receiver_ty, Type::Array(_)) {
        ctx.use_facility("array");
        let receiver = emit_expr(ctx, object);
        let rest = written_args(ctx, args);
        return format!("array.{field}({})", join_receiver(receiver, &rest));
    }
    let receiver = operand(ctx, object, ATOM);
    format!("{receiver}.{field}({})", written_args(ctx, args))
}

fn join_receiver(receiver: String, rest: &str) -> String {
    if rest.is_empty() {
        receiver
    } else {
        format!("{receiver}, {rest}")
    }
}

/// Value of a branch body: the expression itself, or an IIFE returning
/// the block's tail.
fn block_value(ctx: &mut EmitContext<'_>, block: &Block) -> String {
    match block.single_expr() {
        Some(id) => emit_expr(ctx, id),
        None => ctx.iife(|ctx| stmt::emit_returning(ctx, block)),
    }
}

fn if_expr(ctx: &mut EmitContext<'_>, id: ExprId, chain: &IfChain) -> String {
    if ctx.is_series(id) {
        let mut branches = Vec::with_capacity(chain.branches.len());
        for branch in &chain.branches {
            let cond = series_operand(ctx, branch.cond);
            let value = block_value(ctx, &branch.body);
            branches.push((cond, value));
        }
        let otherwise = chain
            .else_block
            .as_ref()
            .map_or_else(|| "NaN".to_string(), |block| block_value(ctx, block));
        return branches
            .into_iter()
            .rev()
            .fold(otherwise, |acc, (cond, value)| format!("{cond}.iif({value}, {acc})"));
    }

    let single = chain
        .branches
        .iter()
        .all(|branch| branch.body.single_expr().is_some())
        && chain
            .else_block
            .as_ref()
            .map_or(true, |block| block.single_expr().is_some());
    if single {
        let mut text = String::from("(");
        for branch in &chain.branches {
            let cond = operand(ctx, branch.cond, TERNARY + 1);
            let value = match branch.body.single_expr() {
                Some(value) => operand(ctx, value, TERNARY + 1),
                None => "NaN".to_string(),
            };
            let _ = write!(text, "{cond} ? {value} : ");
        }
        let otherwise = match chain.else_block.as_ref().and_then(Block::single_expr) {
            Some(value) => operand(ctx, value, TERNARY),
            None => "NaN".to_string(),
        };
        text.push_str(&otherwise);
        text.push(')');
        return text;
    }

    ctx.iife(|ctx| {
        for (index, branch) in chain.branches.iter().enumerate() {
            let cond = emit_expr(ctx, branch.cond);
            if index == 0 {
                ctx.writeln(&format!("if ({cond}) {{"));
            } else {
                ctx.writeln(&format!("}} else if ({cond}) {{"));
            }
            ctx.indent();
            stmt::emit_returning(ctx, &branch.body);
            ctx.dedent();
        }
        match &chain.else_block {
            Some(block) => {
                ctx.writeln("} else {");
                ctx.indent();
                stmt::emit_returning(ctx, block);
                ctx.dedent();
                ctx.writeln("}");
            }
            None => {
                ctx.writeln("}");
                ctx.writeln("return NaN;");
            }
        }
    })
}

/// Whether a switch selects per bar, so its arms need masks.
pub(crate) fn switch_is_per_bar(ctx: &EmitContext<'_>, switch: &SwitchExpr) -> bool {
    switch.subject.is_some_and(|subject| ctx.is_series(subject))
        || switch.arms.iter().any(|arm| ctx.is_series(arm.pattern))
}

/// Series condition selecting one switch arm.
pub(crate) fn switch_condition(
    ctx: &mut EmitContext<'_>,
    subject: Option<ExprId>,
    pattern: ExprId,
) -> String {
    let Some(subject) = subject else {
        return series_operand(ctx, pattern);
    };
    if ctx.is_series(subject) {
        let subject = emit_expr(ctx, subject);
        let pattern = emit_expr(ctx, pattern);
        format!("{subject}.eq({pattern})")
    } else if ctx.is_series(pattern) {
        let pattern = emit_expr(ctx, pattern);
        let subject = emit_expr(ctx, subject);
        format!("{pattern}.eq({subject})")
    } else {
        let strength = precedence(BinaryOp::Eq) + 1;
        let subject = operand(ctx, subject, strength);
        let pattern = operand(ctx, pattern, strength);
        ctx.lift(&format!("{subject} === {pattern}"))
    }
}

fn switch_expr(ctx: &mut EmitContext<'_>, id: ExprId, switch: &SwitchExpr) -> String {
    if ctx.is_series(id) {
        let mut arms = Vec::with_capacity(switch.arms.len());
        for arm in &switch.arms {
            let cond = switch_condition(ctx, switch.subject, arm.pattern);
            let value = block_value(ctx, &arm.body);
            arms.push((cond, value));
        }
        let otherwise = switch
            .default
            .as_ref()
            .map_or_else(|| "NaN".to_string(), |block| block_value(ctx, block));
        return arms
            .into_iter()
            .rev()
            .fold(otherwise, |acc, (cond, value)| format!("{cond}.iif({value}, {acc})"));
    }

    let subject = switch
        .subject
        .map_or_else(|| "true".to_string(), |subject| emit_expr(ctx, subject));
    ctx.iife(|ctx| {
        ctx.writeln(&format!("switch ({subject}) {{"));
        ctx.indent();
        for arm in &switch.arms {
            let pattern = emit_expr(ctx, arm.pattern);
            ctx.writeln(&format!("case {pattern}: {{"));
            ctx.indent();
            stmt::emit_returning(ctx, &arm.body);
            ctx.dedent();
            ctx.writeln("}");
        }
        ctx.writeln("default: {");
        ctx.indent();
        match &switch.default {
            Some(block) => stmt::emit_returning(ctx, block),
            None => ctx.writeln("return NaN;"),
        }
        ctx.dedent();
        ctx.writeln("}");
        ctx.dedent();
        ctx.writeln("}");
    })
}
