#![allow(clippy::unwrap_used, clippy::expect_used)]

use pine_diagnostic::ErrorCode;
use pine_ir::{DeclarationKind, ExprArena, StmtKind};
use pine_parse::parse;
use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;

struct Collected {
    facts: ProgramFacts,
    module: Module,
    arena: ExprArena,
}

fn collect_source(source: &str) -> Collected {
    let parsed = parse(source);
    assert!(!parsed.has_errors(), "syntax errors: {:#?}", parsed.errors);
    let analysis = pine_types::analyze(&parsed);
    assert!(analysis.valid, "semantic errors: {:#?}", analysis.errors);
    let facts = collect(&parsed.module, &parsed.arena, &analysis);
    Collected {
        facts,
        module: parsed.module,
        arena: parsed.arena,
    }
}

fn facts(source: &str) -> ProgramFacts {
    collect_source(source).facts
}

fn is_module_series(facts: &ProgramFacts, name: &str) -> bool {
    facts.is_series(&Binding::module(name))
}

fn warning_codes(facts: &ProgramFacts) -> Vec<ErrorCode> {
    facts.diagnostics.iter().map(|d| d.code).collect()
}

#[test]
fn test_metadata_positional_and_named() {
    let f = facts("indicator(\"Balance of Power\", \"BOP\", overlay = true)\n");
    assert_eq!(f.metadata.title, "Balance of Power");
    assert_eq!(f.metadata.short_title, "BOP");
    assert!(f.metadata.overlay);
    assert_eq!(f.metadata.kind, DeclarationKind::Indicator);

    let f = facts("indicator(title = \"Named\")\n");
    assert_eq!(f.metadata.title, "Named");
    assert_eq!(f.metadata.short_title, "Named");
    assert!(!f.metadata.overlay);
}

#[test]
fn test_library_header() {
    let f = facts("library(\"Utils\", true)\nexport double(x) => x * 2\n");
    assert!(f.is_library());
    assert!(f.metadata.overlay);
    assert_eq!(f.functions[0].name, "double");
    assert!(f.functions[0].exported);
}

#[test]
fn test_inputs_take_the_variable_name() {
    let source = "\
indicator(\"RSI\")
length = input.int(14, \"Length\", minval = 1, maxval = 200)
src = input.source(close, \"Source\")
mode = input.string(\"fast\", \"Mode\", options = [\"fast\", \"slow\"], group = \"Main\")
show = input(true)
";
    let f = facts(source);
    assert_eq!(f.inputs.len(), 4);

    let length = &f.inputs[0];
    assert_eq!(length.id, "length");
    assert_eq!(length.kind, InputKind::Int);
    assert_eq!(length.title, "Length");
    assert_eq!(length.defval, json!(14));
    assert_eq!(length.min, Some(json!(1)));
    assert_eq!(length.max, Some(json!(200)));

    assert_eq!(f.inputs[1].kind, InputKind::Source);
    assert_eq!(f.inputs[1].defval, json!("close"));

    let mode = &f.inputs[2];
    assert_eq!(mode.options, Some(vec![json!("fast"), json!("slow")]));
    assert_eq!(mode.group.as_deref(), Some("Main"));

    assert_eq!(f.inputs[3].kind, InputKind::Bool);
    assert_eq!(f.inputs[3].title, "show");
    assert!(f.features.contains(RuntimeFeatures::INPUTS));
    assert!(is_module_series(&f, "src"));
    assert!(!is_module_series(&f, "length"));
}

#[test]
fn test_input_config_serializes_optional_fields_only_when_present() {
    let f = facts("x = input.float(1.5, \"X\", step = 0.5)\n");
    let value = serde_json::to_value(&f.inputs[0]).unwrap();
    assert_eq!(
        value,
        json!({"id": "x", "type": "float", "title": "X", "defval": 1.5, "step": 0.5})
    );
}

#[test]
fn test_plots_hlines_and_fills() {
    let source = "\
indicator(\"Bands\", overlay = true)
basis = ta.sma(close, 20)
upper = basis + 2
p1 = plot(basis, \"Basis\", color = color.orange, linewidth = 2)
p2 = plot(upper, title = \"Upper\", color = color.new(color.blue, 50), style = plot.style_stepline)
h = hline(70, \"Overbought\", color = color.red)
fill(p1, p2, color = color.new(color.teal, 90))
plot(close, display = display.none)
";
    let f = facts(source);
    assert_eq!(f.plots.len(), 3);
    assert_eq!(f.plots[0].id, "plot0");
    assert_eq!(f.plots[0].title, "Basis");
    assert_eq!(f.plots[0].color, "#FF9800");
    assert_eq!(f.plots[0].line_width, 2);
    assert_eq!(f.plots[1].color, "#2196F380");
    assert_eq!(f.plots[1].style, "stepline");
    assert_eq!(f.plots[2].title, "plot2");
    assert_eq!(f.plots[2].visible, Some(false));
    assert_eq!(f.plots[2].display.as_deref(), Some("none"));

    assert_eq!(f.hlines.len(), 1);
    assert_eq!(f.hlines[0].price, json!(70));
    assert_eq!(f.hlines[0].color, "#FF5252");

    assert_eq!(f.fills.len(), 1);
    assert_eq!(f.fills[0].plot1, "plot0");
    assert_eq!(f.fills[0].plot2, "plot1");
    assert_eq!(f.fills[0].color.as_deref(), Some("#00897B1A"));
    assert!(f.diagnostics.is_empty(), "{:#?}", f.diagnostics);
}

#[test]
fn test_unresolved_fill_warns() {
    let f = facts("a = close\nb = open\nfill(a, b)\n");
    assert!(f.fills.is_empty());
    assert_eq!(warning_codes(&f), vec![ErrorCode::UnsupportedConstruct]);
}

#[test]
fn test_unsupported_calls_warn() {
    let source = "\
bgcolor(color.red)
l = label.new(bar_index, high, \"x\")
alertcondition(close > open, \"Up\")
";
    let f = facts(source);
    assert_eq!(f.diagnostics.len(), 3);
    assert!(f
        .diagnostics
        .iter()
        .all(|d| d.code == ErrorCode::UnsupportedConstruct));
}

#[test]
fn test_plot_inside_a_block_is_unsupported() {
    let f = facts("if close > open\n    plot(close)\n");
    assert!(f.plots.is_empty());
    assert_eq!(warning_codes(&f), vec![ErrorCode::UnsupportedConstruct]);
}

#[test]
fn test_dynamic_plot_color_warns() {
    let f = facts("plot(close, color = close > open ? color.green : color.red)\n");
    assert_eq!(f.plots.len(), 1);
    assert_eq!(f.plots[0].color, "#2962FF");
    assert_eq!(warning_codes(&f), vec![ErrorCode::UnsupportedConstruct]);
}

#[test]
fn test_classification_propagates_through_declarations() {
    let source = "\
a = close
b = a * 2
c = 5
d = c + 1
[m, s, h] = ta.macd(close, 12, 26, 9)
e = math.max(c, 3)
g = math.max(b, 3)
";
    let f = facts(source);
    for name in ["a", "b", "m", "s", "h", "g"] {
        assert!(is_module_series(&f, name), "{name} should be a series");
    }
    for name in ["c", "d", "e"] {
        assert!(!is_module_series(&f, name), "{name} should be scalar");
    }
}

#[test]
fn test_every_expression_mentioning_a_series_is_series() {
    let c = collect_source("x = (close - open) / (high - low)\ny = 1 + 2\n");
    let values: Vec<_> = c
        .module
        .stmts
        .iter()
        .filter_map(|s| match &s.kind {
            StmtKind::VarDecl(d) => Some(d.value),
            _ => None,
        })
        .collect();
    assert!(c.facts.is_series_expr(values[0]));
    assert!(!c.facts.is_series_expr(values[1]));
    // Every subexpression of a series expression that reads a price is a series.
    for index in 0..c.arena.len() {
        let id = pine_ir::ExprId::new(u32::try_from(index).unwrap());
        if let pine_ir::ExprKind::Ident(name) = c.arena.kind(id) {
            assert!(c.facts.is_series_expr(id), "{name}");
        }
    }
}

#[test]
fn test_reassignment_under_a_series_condition_is_series() {
    let source = "\
x = 0.0
y = 0
if close > open
    x := 1.0
if true
    y := 2
";
    let f = facts(source);
    assert!(is_module_series(&f, "x"));
    assert!(!is_module_series(&f, "y"));
    assert!(f.features.contains(RuntimeFeatures::MASKED_IF));
    assert!(f.is_reassigned(&Binding::module("x")));
}

#[test]
fn test_else_if_after_a_series_condition_is_masked() {
    let source = "\
z = 0
if false
    z := 1
else if close > open
    z := 2
else
    z := 3
";
    let f = facts(source);
    assert!(is_module_series(&f, "z"));
}

#[test]
fn test_series_arguments_reach_function_parameters() {
    let source = "\
double(v) => v * 2
offset(v, k = 1) => v + k
a = double(close)
b = double(3)
c = offset(1, k = high)
";
    let f = facts(source);
    assert!(f.is_series(&Binding::local("double", "v")));
    assert!(f.is_series(&Binding::local("offset", "k")));
    assert!(!f.is_series(&Binding::local("offset", "v")));
    assert!(f.returns_series("double"));
    assert!(is_module_series(&f, "a"));
    // Once a parameter is a series, every call returns one.
    assert!(is_module_series(&f, "b"));
    assert!(is_module_series(&f, "c"));
}

#[test]
fn test_function_locals_do_not_leak() {
    let source = "\
f(n) =>
    close = n
    close + 1
close2 = 1
r = f(1)
";
    let f = facts(source);
    assert!(!f.returns_series("f"));
    assert!(!is_module_series(&f, "r"));
    assert_eq!(f.resolve(&Owner::Function("f".into()), "close").owner, Owner::Function("f".into()));
    assert!(f.builtin_series.is_empty());
}

#[test]
fn test_recursive_and_persistent_sets() {
    let source = "\
var count = 0
count := count + 1
acc = 0.0
acc := nz(acc[1]) + close
total = 0
for i = 0 to 10
    total := total + i
var inner = 0
for j = 0 to 3
    inner := inner + 1
";
    let f = facts(source);
    assert!(f.recursive.contains(&Binding::module("acc")));
    assert!(!f.recursive.contains(&Binding::module("count")));
    assert!(f.persistent.contains(&Binding::module("count")));
    assert!(f.carried.contains(&Binding::module("count")));
    assert!(!f.carried.contains(&Binding::module("inner")));
    assert!(!f.recursive.contains(&Binding::module("total")));

    assert!(f.needs_bar_loop(&Binding::module("acc"), false));
    assert!(f.needs_bar_loop(&Binding::module("count"), false));
    assert!(!f.needs_bar_loop(&Binding::module("inner"), true));
    assert!(!f.needs_bar_loop(&Binding::module("total"), true));

    assert!(is_module_series(&f, "count"));
    assert!(is_module_series(&f, "acc"));
    assert!(!is_module_series(&f, "total"));
    assert!(f.features.contains(RuntimeFeatures::RECURRENCE));
}

#[test]
fn test_history_of_another_name_is_not_recursive() {
    let f = facts("x = 0.0\ny = close\nx := y[1]\n");
    assert!(f.recursive.is_empty());
    assert!(is_module_series(&f, "x"));
}

#[test]
fn test_builtin_series_in_canonical_order() {
    let f = facts("a = volume + close\nb = bar_index\nc = dayofweek\nd = hl2\nt = time\n");
    assert_eq!(
        f.builtin_series,
        vec!["close", "volume", "time", "hl2", "bar_index", "dayofweek"]
    );
    assert!(f.features.contains(
        RuntimeFeatures::PRICE
            | RuntimeFeatures::TIME
            | RuntimeFeatures::BAR_INDEX
            | RuntimeFeatures::CALENDAR
    ));
}

#[test]
fn test_types_methods_and_imports() {
    let source = "\
import trader/utils/2 as u
type Point
    float x = 0.0
    int n
method scaled(Point p, float k) => p.x * k
p = Point.new(close, 2)
w = p.scaled(2.0)
";
    let f = facts(source);
    assert_eq!(f.types.len(), 1);
    assert_eq!(f.types[0].fields[0].ty, "float");
    assert!(f.types[0].fields[0].default.is_some());
    assert!(f.types[0].fields[1].default.is_none());
    assert_eq!(f.methods[0].owner_key(), "Point.scaled");
    assert!(f.method("Point", "scaled").is_some());
    assert_eq!(
        f.import("u"),
        Some(&ImportInfo {
            owner: "trader".into(),
            library: "utils".into(),
            version: 2,
            namespace: "u".into(),
        })
    );
    assert!(is_module_series(&f, "p"));
    assert!(f.is_series(&Binding::local("Point.scaled", "p")));
    assert!(is_module_series(&f, "w"));
    assert!(f.features.contains(RuntimeFeatures::USER_TYPES | RuntimeFeatures::LIBRARY_IMPORTS));
}

#[test]
fn test_const_values() {
    let c = collect_source("a = -3\nb = color.rgb(255, 0, 0, 50)\nc = [1, 2.5]\nd = na\ne = close\n");
    let values: Vec<_> = c
        .module
        .stmts
        .iter()
        .filter_map(|s| match &s.kind {
            StmtKind::VarDecl(d) => Some(d.value),
            _ => None,
        })
        .collect();
    assert_eq!(const_value(&c.arena, values[0]), Some(json!(-3)));
    assert_eq!(const_value(&c.arena, values[1]), Some(json!("#FF000080")));
    assert_eq!(const_value(&c.arena, values[2]), Some(json!([1, 2.5])));
    assert_eq!(const_value(&c.arena, values[3]), Some(serde_json::Value::Null));
    assert_eq!(const_value(&c.arena, values[4]), None);
    assert_eq!(color_hex(&c.arena, values[1]).as_deref(), Some("#FF000080"));
}
