//! User functions and methods.
//!
//! Both become `function` declarations nested in the indicator function, so
//! they close over `bars` and the resolved inputs. A method bound to type
//! `T` is written as `T_name(self, ...)`.

use pine_ir::{Block, FunctionDecl, MethodDecl, Param};

use super::expr;
use super::stmt;
use crate::collect::{Binding, Owner};
use crate::context::EmitContext;

pub(crate) fn emit_function(ctx: &mut EmitContext<'_>, function: &FunctionDecl) {
    let name = ctx.ident(&function.name);
    let key = function.name.clone();
    ctx.with_owner(Owner::Function(key.clone()), |ctx| {
        let params = params(ctx, &key, &function.params);
        ctx.writeln(&format!("function {name}({params}) {{"));
        ctx.indent();
        body(ctx, &function.body);
        ctx.dedent();
        ctx.writeln("}");
    });
}

pub(crate) fn emit_method(ctx: &mut EmitContext<'_>, method: &MethodDecl) {
    let name = format!("{}_{}", ctx.ident(&method.bound_type), method.name);
    let key = format!("{}.{}", method.bound_type, method.name);
    ctx.with_owner(Owner::Function(key.clone()), |ctx| {
        let receiver = ctx.ident(&method.self_name);
        let binding = Binding::local(key.as_str(), method.self_name.as_str());
        let receiver_ty = if ctx.facts.is_series(&binding) {
            series_type(ctx)
        } else {
            ctx.ts_type(&method.bound_type)
        };
        let mut list = format!("{receiver}: {receiver_ty}");
        let rest = params(ctx, &key, &method.params);
        if !rest.is_empty() {
            list.push_str(", ");
            list.push_str(&rest);
        }
        ctx.writeln(&format!("function {name}({list}) {{"));
        ctx.indent();
        body(ctx, &method.body);
        ctx.dedent();
        ctx.writeln("}");
    });
}

fn series_type(ctx: &mut EmitContext<'_>) -> String {
    ctx.use_facility("Series");
    "Series".to_string()
}

fn params(ctx: &mut EmitContext<'_>, key: &str, params: &[Param]) -> String {
    params
        .iter()
        .map(|param| self::param(ctx, key, param))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `name: Type[ = default]`. Series parameters are typed `Series` and get
/// a lifted default.
fn param(ctx: &mut EmitContext<'_>, key: &str, param: &Param) -> String {
    let series = ctx.facts.is_series(&Binding::local(key, param.name.as_str()));
    let ty = if series {
        series_type(ctx)
    } else {
        param
            .ty
            .as_ref()
            .map_or_else(|| "any".to_string(), |ty| ctx.ts_type(&ty.to_string()))
    };
    let name = ctx.ident(&param.name);
    match param.default {
        Some(default) => {
            let value = if series {
                expr::series_operand(ctx, default)
            } else {
                expr::emit_expr(ctx, default)
            };
            format!("{name}: {ty} = {value}")
        }
        None => format!("{name}: {ty}"),
    }
}

/// Function body; the tail expression is the return value.
fn body(ctx: &mut EmitContext<'_>, block: &Block) {
    let returns = block
        .tail_expr()
        .filter(|tail| !stmt::is_display_call(ctx, *tail));
    match (returns, block.stmts.split_last()) {
        (Some(tail), Some((_, init))) => {
            stmt::emit_stmts(ctx, init);
            let value = expr::emit_expr(ctx, tail);
            ctx.writeln(&format!("return {value};"));
        }
        _ => stmt::emit_stmts(ctx, &block.stmts),
    }
}
