#![allow(clippy::unwrap_used, clippy::expect_used)]

use pine_diagnostic::ErrorCode;
use pine_parse::parse;
use pretty_assertions::assert_eq;

use crate::{analyze, Analysis, Type};

fn check(source: &str) -> Analysis {
    let parsed = parse(source);
    assert!(!parsed.has_errors(), "syntax errors: {:#?}", parsed.errors);
    analyze(&parsed)
}

fn error_codes(analysis: &Analysis) -> Vec<ErrorCode> {
    analysis.errors.iter().map(|d| d.code).collect()
}

fn warning_codes(analysis: &Analysis) -> Vec<ErrorCode> {
    analysis.warnings.iter().map(|d| d.code).collect()
}

fn global_type(analysis: &Analysis, name: &str) -> Type {
    analysis
        .global(name)
        .unwrap_or_else(|| panic!("`{name}` is not declared"))
        .ty
        .clone()
}

#[test]
fn test_clean_program_is_valid() {
    let a = check(
        "indicator(\"Balance of Power\", overlay = false)\nbop = (close - open) / (high - low)\nplot(bop, \"BOP\", color = color.red)\n",
    );
    assert!(a.valid, "{:#?}", a.errors);
    assert!(a.warnings.is_empty());
    assert_eq!(global_type(&a, "bop"), Type::series(Type::Float));
}

#[test]
fn test_duplicate_in_same_scope() {
    let a = check("x = 1\nx = 2\n");
    assert_eq!(error_codes(&a), vec![ErrorCode::DuplicateDeclaration]);
    assert_eq!(a.errors[0].labels.len(), 2);
}

#[test]
fn test_nested_shadowing_is_silent() {
    let a = check("x = 1\nif close > open\n    x = 2\n    y = x\nf(x) => x + 1\n");
    assert!(a.valid, "{:#?}", a.errors);
}

#[test]
fn test_builtins_may_be_shadowed_by_declarations() {
    let a = check("color = 1\ncolor := 2\n");
    assert!(a.valid, "{:#?}", a.errors);
}

#[test]
fn test_undefined_names() {
    let a = check("y = z + 1\nw := 3\n");
    assert_eq!(
        error_codes(&a),
        vec![ErrorCode::UndefinedVariable, ErrorCode::UndefinedVariable]
    );
}

#[test]
fn test_self_reference_in_declaration_is_undefined() {
    let a = check("x = x + 1\n");
    assert_eq!(error_codes(&a), vec![ErrorCode::UndefinedVariable]);
}

#[test]
fn test_fixed_builtins_cannot_be_reassigned() {
    let a = check("close := 1\ntrue := false\nna := 0\nbar_index := 2\n");
    assert_eq!(error_codes(&a), vec![ErrorCode::ConstReassignment; 4]);
}

#[test]
fn test_user_names_may_be_rebound() {
    let a = check("x = 1\nx := 2\nx += 3\nvar total = 0.0\ntotal := total + close\n");
    assert!(a.valid, "{:#?}", a.errors);
}

#[test]
fn test_break_and_continue_need_a_loop() {
    let a = check("break\ncontinue\nif close > open\n    break\n");
    assert_eq!(
        error_codes(&a),
        vec![
            ErrorCode::BreakOutsideLoop,
            ErrorCode::ContinueOutsideLoop,
            ErrorCode::BreakOutsideLoop,
        ]
    );
}

#[test]
fn test_break_inside_nested_block_of_loop() {
    let source = "\
s = 0
for i = 0 to 10
    if i > 5
        break
    else
        if i == 2
            continue
    s += i
n = 3
while n > 0
    n -= 1
    if n == 1
        break
xs = array.new_float(3, 0.0)
for x in xs
    if x > 1
        continue
";
    let a = check(source);
    assert!(a.valid, "{:#?}", a.errors);
}

#[test]
fn test_function_body_does_not_inherit_an_enclosing_loop() {
    let a = check("for i = 0 to 3\n    f() =>\n        break\n        1\n    x = f()\n");
    assert_eq!(error_codes(&a), vec![ErrorCode::BreakOutsideLoop]);

    let a = check("while close > open\n    g() =>\n        continue\n        1\n    y = g()\n");
    assert_eq!(error_codes(&a), vec![ErrorCode::ContinueOutsideLoop]);
}

#[test]
fn test_builtin_arity() {
    let a = check("a = ta.sma(close)\nb = ta.sma(close, 14, 3)\nc = nz(close, 0, 1, 2)\n");
    assert_eq!(error_codes(&a), vec![ErrorCode::WrongArgumentCount; 3]);
    assert!(a.errors[0].message.contains("ta.sma"));
}

#[test]
fn test_arity_counts_named_and_positional_together() {
    let a = check(
        "a = ta.sma(close, 14)\nb = ta.sma(source = close, length = 14)\nc = ta.sma(close, length = 14)\nd = nz(close)\ne = input.int(14, \"Length\", minval = 1, maxval = 100)\n",
    );
    assert!(a.valid, "{:#?}", a.errors);
}

#[test]
fn test_unknown_callees_are_tolerated() {
    let a = check("import acme/Utils/1 as u\nx = u.smooth(close, 1, 2, 3, 4)\ny = ta.notacatalogentry(close)\nf(a, b) => a + b\nz = f(1, 2, 3)\n");
    assert!(a.valid, "{:#?}", a.errors);
}

#[test]
fn test_method_style_array_calls_count_the_receiver() {
    let a = check("xs = array.new_float()\nxs.push(1.0)\nxs.push(1.0, 2.0)\nn = xs.size()\nv = xs.get(0)\n");
    assert_eq!(error_codes(&a), vec![ErrorCode::WrongArgumentCount]);
    assert_eq!(global_type(&a, "n"), Type::Int);
    assert_eq!(global_type(&a, "v"), Type::Float);
}

#[test]
fn test_literal_and_operator_inference() {
    let a = check(
        "a = 1\nb = 1 / 2\nc = 1 + 2.5\nd = 3 % 2\ne = \"x\" + \"y\"\nf = 1 < 2 and true\ng = not f\n",
    );
    assert_eq!(global_type(&a, "a"), Type::Int);
    assert_eq!(global_type(&a, "b"), Type::Float);
    assert_eq!(global_type(&a, "c"), Type::Float);
    assert_eq!(global_type(&a, "d"), Type::Int);
    assert_eq!(global_type(&a, "e"), Type::Str);
    assert_eq!(global_type(&a, "f"), Type::Bool);
    assert_eq!(global_type(&a, "g"), Type::Bool);
}

#[test]
fn test_series_inference() {
    let a = check(
        "up = close > open\nprev = close[1]\ncount = bar_index + 1\npick = up ? na : close\nma = ta.ema(close, 10)\nm = math.max(close, 1)\nk = math.max(2, 1)\n",
    );
    assert_eq!(global_type(&a, "up"), Type::series(Type::Bool));
    assert_eq!(global_type(&a, "prev"), Type::series(Type::Float));
    assert_eq!(global_type(&a, "count"), Type::series(Type::Int));
    assert_eq!(global_type(&a, "pick"), Type::series(Type::Float));
    assert_eq!(global_type(&a, "ma"), Type::series(Type::Float));
    assert_eq!(global_type(&a, "m"), Type::series(Type::Float));
    assert_eq!(global_type(&a, "k"), Type::Float);
}

#[test]
fn test_conditional_values_unify() {
    let source = "\
x = if close > open
    1
else
    2.5
kind = \"a\"
y = switch kind
    \"a\" => 1
    \"b\" => 2
    => 3
";
    let a = check(source);
    assert_eq!(global_type(&a, "x"), Type::series(Type::Float));
    assert_eq!(global_type(&a, "y"), Type::Int);
}

#[test]
fn test_reassignment_promotes_to_series() {
    let a = check("s = 0.0\ns := close\n");
    let symbol = a.global("s").unwrap();
    assert!(symbol.is_series);
    assert_eq!(symbol.ty, Type::series(Type::Float));
}

#[test]
fn test_declared_type_mismatch() {
    let a = check("int n = \"a\"\nfloat f = 1\nfloat g = close\nbool b = na\n");
    assert_eq!(error_codes(&a), vec![ErrorCode::TypeMismatch]);
    assert_eq!(global_type(&a, "f"), Type::Float);
    assert_eq!(global_type(&a, "g"), Type::series(Type::Float));
}

#[test]
fn test_tuple_destructuring() {
    let a = check("[m, s, h] = ta.macd(close, 12, 26, 9)\n[u, l] = ta.bb(close, 20, 2)\n");
    assert_eq!(error_codes(&a), vec![ErrorCode::TypeMismatch]);
    assert_eq!(global_type(&a, "m"), Type::series(Type::Float));
}

#[test]
fn test_user_functions_return_their_last_expression() {
    let a = check("g() => close * 2\nh(x) =>\n    y = x\n    1\nr = g()\nq = h(3)\n");
    assert_eq!(global_type(&a, "r"), Type::series(Type::Float));
    assert_eq!(global_type(&a, "q"), Type::Int);
}

#[test]
fn test_user_types_and_methods() {
    let source = "\
type Point
    float x = 0.0
    int n
method scaled(Point p, float k) => p.x * k
p = Point.new(1.0, 2)
v = p.x
w = p.scaled(2.0)
";
    let a = check(source);
    assert!(a.valid, "{:#?}", a.errors);
    assert_eq!(global_type(&a, "p"), Type::Udt("Point".into()));
    assert_eq!(global_type(&a, "v"), Type::Float);
    assert_eq!(global_type(&a, "w"), Type::Float);
}

#[test]
fn test_field_default_mismatch() {
    let a = check("type Cfg\n    int n = \"x\"\n");
    assert_eq!(error_codes(&a), vec![ErrorCode::TypeMismatch]);
}

#[test]
fn test_warnings_do_not_invalidate() {
    let source = "\
study(\"Old\")
a = close[-1]
for i = 0 to 3
    break
    b = 1
";
    let a = check(source);
    assert!(a.valid, "{:#?}", a.errors);
    assert_eq!(
        warning_codes(&a),
        vec![
            ErrorCode::DeprecatedDeclaration,
            ErrorCode::NegativeHistoryOffset,
            ErrorCode::UnreachableCode,
        ]
    );
}

#[test]
fn test_all_errors_accumulate() {
    let a = check("a = nope\nbreak\nclose := 1\nx = 1\nx = 2\nb = ta.rsi(close)\n");
    assert_eq!(
        error_codes(&a),
        vec![
            ErrorCode::UndefinedVariable,
            ErrorCode::BreakOutsideLoop,
            ErrorCode::ConstReassignment,
            ErrorCode::DuplicateDeclaration,
            ErrorCode::WrongArgumentCount,
        ]
    );
    assert!(!a.valid);
}

#[test]
fn test_scopes_survive_the_walk() {
    let a = check("if close > open\n    t = 1\nfor i = 0 to 2\n    u = i\n");
    // Root, module, `if` block, loop.
    assert_eq!(a.symbols.len(), 4);
    assert!(a.global("t").is_none());
    let declared: Vec<_> = a
        .symbols
        .iter()
        .filter_map(|(_, scope)| scope.get("u"))
        .collect();
    assert_eq!(declared.len(), 1);
}

#[test]
fn test_expression_types_are_recorded() {
    let parsed = parse("x = close - open\n");
    let a = analyze(&parsed);
    let pine_ir::StmtKind::VarDecl(decl) = &parsed.module.stmts[0].kind else {
        panic!("expected declaration");
    };
    assert_eq!(a.expr_type(decl.value), &Type::series(Type::Float));
    assert_eq!(a.expr_types.len(), parsed.arena.len());
}
