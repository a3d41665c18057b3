//! TypeScript module emission.
//!
//! The module is written top to bottom in one pass over the facts and the
//! statements. The runtime import comes first in the output but depends on
//! everything after it, so a placeholder line is written in its place and
//! patched with the sorted facility list once the body is done.

mod expr;
mod func;
pub(crate) mod names;
mod recurrence;
mod stmt;

use pine_ir::Module;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::collect::{HlineDef, PlotDef};
use crate::context::EmitContext;
use crate::CodegenError;
use names::quote;

/// Stands in for the runtime import until the facility list is known.
const RUNTIME_IMPORT: &str = "/* pinec:runtime-import */";

pub(crate) fn emit_module(
    ctx: &mut EmitContext<'_>,
    module: &Module,
) -> Result<String, CodegenError> {
    header(ctx);
    ctx.writeln(RUNTIME_IMPORT);
    imports(ctx);
    user_types(ctx);
    inputs_interface(ctx);
    metadata(ctx);
    default_inputs(ctx);
    configs(ctx)?;
    main_function(ctx, module);
    exports(ctx);

    let output = ctx.take_output();
    Ok(patch_runtime_import(ctx, &output))
}

fn header(ctx: &mut EmitContext<'_>) {
    if ctx.options.header_comment {
        let title = quote(&ctx.facts.metadata.title);
        ctx.writeln(&format!("// Generated by pinec from {title}. Do not edit."));
    }
}

fn patch_runtime_import(ctx: &EmitContext<'_>, output: &str) -> String {
    let facilities: Vec<&str> = ctx.facilities().collect();
    let line = if facilities.is_empty() {
        String::new()
    } else {
        format!(
            "import {{ {} }} from {};\n",
            facilities.join(", "),
            quote(&ctx.options.runtime_module)
        )
    };
    output.replacen(&format!("{RUNTIME_IMPORT}\n"), &line, 1)
}

fn imports(ctx: &mut EmitContext<'_>) {
    let facts = ctx.facts;
    let mut types = vec!["Bar", "IndicatorResult", "InputConfig", "PlotConfig"];
    if !facts.fills.is_empty() {
        types.push("FillConfig");
    }
    let runtime = quote(&ctx.options.runtime_module);
    ctx.writeln(&format!("import type {{ {} }} from {runtime};", types.join(", ")));
    for import in &facts.imports {
        let namespace = ctx.ident(&import.namespace);
        let specifier = quote(&format!("{}/{}/{}", import.owner, import.library, import.version));
        ctx.writeln(&format!("import * as {namespace} from {specifier};"));
    }
    ctx.newline();
}

/// Interfaces and `<Type>_new` factories of user types.
fn user_types(ctx: &mut EmitContext<'_>) {
    let facts = ctx.facts;
    for ty in &facts.types {
        let name = ctx.ident(&ty.name);
        let export = if ty.exported || facts.is_library() { "export " } else { "" };
        let mut fields = Vec::with_capacity(ty.fields.len());
        let mut params = Vec::with_capacity(ty.fields.len());
        let mut entries = Vec::with_capacity(ty.fields.len());
        for field in &ty.fields {
            let ts = ctx.ts_type(&field.ty);
            let param = ctx.ident(&field.name);
            let default = field
                .default
                .map(|default| expr::emit_expr(ctx, default))
                .or_else(|| (ts == "number").then(|| "NaN".to_string()));
            match default {
                Some(default) => {
                    fields.push(format!("{}: {ts};", field.name));
                    params.push(format!("{param}: {ts} = {default}"));
                }
                None => {
                    fields.push(format!("{}?: {ts};", field.name));
                    params.push(format!("{param}?: {ts}"));
                }
            }
            entries.push(if param == field.name {
                param
            } else {
                format!("{}: {param}", field.name)
            });
        }

        ctx.writeln(&format!("{export}interface {name} {{"));
        ctx.indent();
        for field in &fields {
            ctx.writeln(field);
        }
        ctx.dedent();
        ctx.writeln("}");
        ctx.newline();
        ctx.writeln(&format!(
            "{export}function {name}_new({}): {name} {{",
            params.join(", ")
        ));
        ctx.indent();
        ctx.writeln(&format!("return {{ {} }};", entries.join(", ")));
        ctx.dedent();
        ctx.writeln("}");
        ctx.newline();
    }
}

fn inputs_interface(ctx: &mut EmitContext<'_>) {
    let facts = ctx.facts;
    let name = format!("{}Inputs", ctx.name);
    if facts.inputs.is_empty() {
        ctx.writeln(&format!("export interface {name} {{}}"));
    } else {
        ctx.writeln(&format!("export interface {name} {{"));
        ctx.indent();
        for input in &facts.inputs {
            ctx.writeln(&format!("{}: {};", input.id, input.kind.ts_type()));
        }
        ctx.dedent();
        ctx.writeln("}");
    }
    ctx.newline();
}

fn metadata(ctx: &mut EmitContext<'_>) {
    let metadata = &ctx.facts.metadata;
    let lines = [
        format!("title: {},", quote(&metadata.title)),
        format!("shortTitle: {},", quote(&metadata.short_title)),
        format!("overlay: {},", metadata.overlay),
    ];
    ctx.writeln("export const metadata = {");
    ctx.indent();
    for line in &lines {
        ctx.writeln(line);
    }
    ctx.dedent();
    ctx.writeln("};");
    ctx.newline();
}

fn default_inputs(ctx: &mut EmitContext<'_>) {
    let facts = ctx.facts;
    let ty = format!("{}Inputs", ctx.name);
    if facts.inputs.is_empty() {
        ctx.writeln(&format!("export const defaultInputs: {ty} = {{}};"));
    } else {
        ctx.writeln(&format!("export const defaultInputs: {ty} = {{"));
        ctx.indent();
        for input in &facts.inputs {
            let value = expr::value_literal(&input.defval);
            ctx.writeln(&format!("{}: {value},", input.id));
        }
        ctx.dedent();
        ctx.writeln("};");
    }
    ctx.newline();
}

/// An entry of `plotConfig`: plots first, then hlines.
#[derive(Serialize)]
#[serde(untagged)]
enum PlotEntry<'f> {
    Plot(&'f PlotDef),
    Hline(&'f HlineDef),
}

fn configs(ctx: &mut EmitContext<'_>) -> Result<(), CodegenError> {
    let facts = ctx.facts;
    let inputs = json(ctx, "inputConfig", &facts.inputs)?;
    ctx.writeln(&format!("export const inputConfig: InputConfig[] = {inputs};"));
    ctx.newline();

    let plots: Vec<PlotEntry<'_>> = facts
        .plots
        .iter()
        .map(PlotEntry::Plot)
        .chain(facts.hlines.iter().map(PlotEntry::Hline))
        .collect();
    let plots = json(ctx, "plotConfig", &plots)?;
    ctx.writeln(&format!("export const plotConfig: PlotConfig[] = {plots};"));
    ctx.newline();

    if !facts.fills.is_empty() {
        let fills = json(ctx, "fillConfig", &facts.fills)?;
        ctx.writeln(&format!("export const fillConfig: FillConfig[] = {fills};"));
        ctx.newline();
    }
    Ok(())
}

/// Pretty JSON indented like the rest of the module.
fn json<T: Serialize>(
    ctx: &EmitContext<'_>,
    what: &'static str,
    value: &T,
) -> Result<String, CodegenError> {
    let indent = " ".repeat(ctx.options.indent_width);
    let mut out = Vec::with_capacity(256);
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(indent.as_bytes()));
    value
        .serialize(&mut serializer)
        .map_err(|source| CodegenError::Serialize { what, source })?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

fn main_function(ctx: &mut EmitContext<'_>, module: &Module) {
    let facts = ctx.facts;
    let name = ctx.name.clone();
    ctx.writeln(&format!(
        "export function {name}(bars: Bar[], inputs: Partial<{name}Inputs> = {{}}): IndicatorResult {{"
    ));
    ctx.indent();
    if !facts.inputs.is_empty() {
        ctx.writeln("const $inputs = { ...defaultInputs, ...inputs };");
    }
    for series in &facts.builtin_series {
        ctx.use_facility("Series");
        let value = if *series == "bar_index" {
            "Series.barIndex(bars)".to_string()
        } else {
            format!("Series.field(bars, {})", quote(series))
        };
        ctx.writeln(&format!("const {series} = {value};"));
    }

    stmt::emit_stmts(ctx, &module.stmts);

    ctx.writeln("return {");
    ctx.indent();
    ctx.writeln("metadata,");
    if facts.plots.is_empty() {
        ctx.writeln("plots: {},");
    } else {
        ctx.writeln("plots: {");
        ctx.indent();
        for plot in &facts.plots {
            ctx.writeln(&format!("{0}: ${0}.toPoints(),", plot.id));
        }
        ctx.dedent();
        ctx.writeln("},");
    }
    ctx.dedent();
    ctx.writeln("};");
    ctx.dedent();
    ctx.writeln("}");
    ctx.newline();
}

fn exports(ctx: &mut EmitContext<'_>) {
    let name = ctx.name.clone();
    ctx.writeln(&format!("export const calculate = {name};"));
    ctx.writeln(&format!("export {{ {name} as {name}Indicator }};"));
    ctx.writeln(&format!("export type {name}Input = {name}Inputs;"));
}

#[cfg(test)]
mod tests;
