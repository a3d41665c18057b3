use pine_ir::{
    AssignOp, DeclarationKind, ExprKind, Persistence, Qualifier, StmtKind,
};
use pretty_assertions::assert_eq;

use super::parse_ok;

#[test]
fn test_var_decl_and_reassign() {
    let out = parse_ok("x = 1\nx := x + 1\nx += 2");
    let stmts = &out.module.stmts;
    assert_eq!(stmts.len(), 3);
    let StmtKind::VarDecl(decl) = &stmts[0].kind else {
        panic!("expected declaration");
    };
    assert_eq!(decl.name, "x");
    assert_eq!(decl.persistence, Persistence::Bar);
    let StmtKind::Reassign(re) = &stmts[1].kind else {
        panic!("expected reassignment");
    };
    assert_eq!(re.op, AssignOp::Assign);
    assert_eq!(out.arena.ident(re.target), Some("x"));
    let StmtKind::Reassign(re) = &stmts[2].kind else {
        panic!("expected compound reassignment");
    };
    assert_eq!(re.op, AssignOp::Add);
}

#[test]
fn test_persistent_typed_decls() {
    let out = parse_ok("var float acc = na\nvarip int n = 0\nseries float s = close\nfloat[] xs = array.new_float()\narray<int> ys = array.new_int()");
    let decls: Vec<_> = out
        .module
        .stmts
        .iter()
        .map(|s| match &s.kind {
            StmtKind::VarDecl(d) => d,
            other => panic!("expected declaration, got {other:?}"),
        })
        .collect();
    assert_eq!(decls[0].persistence, Persistence::Var);
    assert_eq!(decls[0].ty.as_ref().map(ToString::to_string).as_deref(), Some("float"));
    assert_eq!(decls[1].persistence, Persistence::Varip);
    assert_eq!(decls[2].qualifier, Some(Qualifier::Series));
    assert_eq!(decls[3].ty.as_ref().map(ToString::to_string).as_deref(), Some("array<float>"));
    assert_eq!(decls[4].ty.as_ref().map(ToString::to_string).as_deref(), Some("array<int>"));
}

#[test]
fn test_field_reassignment() {
    let out = parse_ok("p.x := 1");
    let StmtKind::Reassign(re) = &out.module.stmts[0].kind else {
        panic!("expected reassignment");
    };
    assert_eq!(out.arena.path(re.target).as_deref(), Some("p.x"));
}

#[test]
fn test_constant_reassignment_target_parses() {
    let out = parse_ok("true := false");
    let StmtKind::Reassign(re) = &out.module.stmts[0].kind else {
        panic!("expected reassignment");
    };
    assert_eq!(out.arena.ident(re.target), Some("true"));
}

#[test]
fn test_tuple_destructure() {
    let out = parse_ok("[m, s, h] = ta.macd(close, 12, 26, 9)");
    let StmtKind::TupleDestructure(td) = &out.module.stmts[0].kind else {
        panic!("expected destructuring");
    };
    let names: Vec<_> = td.names.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["m", "s", "h"]);
}

#[test]
fn test_if_else_chain() {
    let source = "\
if a
    x := 1
else if b
    x := 2
else
    x := 3
y = x
";
    let out = parse_ok(source);
    assert_eq!(out.module.stmts.len(), 2);
    let StmtKind::If(chain) = &out.module.stmts[0].kind else {
        panic!("expected if");
    };
    assert_eq!(chain.branches.len(), 2);
    assert!(chain.else_block.is_some());
}

#[test]
fn test_if_expression_value() {
    let source = "\
x = if close > open
    1
else
    -1
plot(x)
";
    let out = parse_ok(source);
    assert_eq!(out.module.stmts.len(), 2);
    let StmtKind::VarDecl(decl) = &out.module.stmts[0].kind else {
        panic!("expected declaration");
    };
    let ExprKind::If(chain) = out.arena.kind(decl.value) else {
        panic!("expected if expression");
    };
    assert!(chain.branches[0].body.tail_expr().is_some());
}

#[test]
fn test_counted_loop_with_brace_block() {
    let source = "sum = 0\nfor i = 0 to 10 by 2 {\n    sum := sum + i\n}\n";
    let out = parse_ok(source);
    assert_eq!(out.module.stmts.len(), 2);
    let StmtKind::For(f) = &out.module.stmts[1].kind else {
        panic!("expected for loop");
    };
    assert_eq!(f.var, "i");
    assert!(f.step.is_some());
    assert_eq!(f.body.stmts.len(), 1);
}

#[test]
fn test_one_line_brace_block() {
    let out = parse_ok("for i = 1 to 3 { total := total + i }");
    let StmtKind::For(f) = &out.module.stmts[0].kind else {
        panic!("expected for loop");
    };
    assert_eq!(f.body.stmts.len(), 1);
}

#[test]
fn test_for_in_forms() {
    let out = parse_ok("for x in xs\n    s += x\nfor [i, x] in xs\n    s += i * x\n");
    let StmtKind::ForIn(plain) = &out.module.stmts[0].kind else {
        panic!("expected for-in");
    };
    assert!(plain.index.is_none());
    assert_eq!(plain.item.0, "x");
    let StmtKind::ForIn(indexed) = &out.module.stmts[1].kind else {
        panic!("expected indexed for-in");
    };
    assert_eq!(indexed.index.as_ref().map(|(n, _)| n.as_str()), Some("i"));
}

#[test]
fn test_while_with_break_and_continue() {
    let source = "\
while n > 0
    n -= 1
    if n == 5
        continue
    if n == 2
        break
";
    let out = parse_ok(source);
    let StmtKind::While(w) = &out.module.stmts[0].kind else {
        panic!("expected while");
    };
    assert_eq!(w.body.stmts.len(), 3);
}

#[test]
fn test_switch_with_subject_and_default() {
    let source = "\
ma = switch kind
    \"SMA\" => ta.sma(close, 14)
    \"EMA\" => ta.ema(close, 14)
    => close
";
    let out = parse_ok(source);
    let StmtKind::VarDecl(decl) = &out.module.stmts[0].kind else {
        panic!("expected declaration");
    };
    let ExprKind::Switch(sw) = out.arena.kind(decl.value) else {
        panic!("expected switch");
    };
    assert!(sw.subject.is_some());
    assert_eq!(sw.arms.len(), 2);
    assert!(sw.default.is_some());
}

#[test]
fn test_switch_without_subject() {
    let source = "\
c = switch
    close > open => 1
    close < open => -1
";
    let out = parse_ok(source);
    let StmtKind::VarDecl(decl) = &out.module.stmts[0].kind else {
        panic!("expected declaration");
    };
    let ExprKind::Switch(sw) = out.arena.kind(decl.value) else {
        panic!("expected switch");
    };
    assert!(sw.subject.is_none());
    assert!(sw.default.is_none());
}

#[test]
fn test_function_decls() {
    let source = "\
double(x) => x * 2
clamp(float v, float lo = 0.0, hi) =>
    r = math.max(v, lo)
    math.min(r, hi)
export f() => 1
";
    let out = parse_ok(source);
    let funcs: Vec<_> = out
        .module
        .stmts
        .iter()
        .map(|s| match &s.kind {
            StmtKind::Function(f) => f,
            other => panic!("expected function, got {other:?}"),
        })
        .collect();
    assert_eq!(funcs[0].name, "double");
    assert_eq!(funcs[0].body.stmts.len(), 1);
    assert_eq!(funcs[1].params.len(), 3);
    assert!(funcs[1].params[1].default.is_some());
    assert_eq!(funcs[1].body.stmts.len(), 2);
    assert!(funcs[2].exported);
}

#[test]
fn test_type_and_method() {
    let source = "\
type Point
    float x = 0.0
    float y
method len(Point p, int scale = 1) => math.sqrt(p.x * p.x + p.y * p.y) * scale
";
    let out = parse_ok(source);
    let StmtKind::Type(ty) = &out.module.stmts[0].kind else {
        panic!("expected type");
    };
    assert_eq!(ty.name, "Point");
    assert_eq!(ty.fields.len(), 2);
    assert!(ty.fields[0].default.is_some());
    assert!(ty.fields[1].default.is_none());
    let StmtKind::Method(m) = &out.module.stmts[1].kind else {
        panic!("expected method");
    };
    assert_eq!(m.bound_type, "Point");
    assert_eq!(m.self_name, "p");
    assert_eq!(m.params.len(), 1);
}

#[test]
fn test_import() {
    let out = parse_ok("import acme/Utils/3 as u\nimport acme/Other/1");
    let StmtKind::Import(first) = &out.module.stmts[0].kind else {
        panic!("expected import");
    };
    assert_eq!(first.owner, "acme");
    assert_eq!(first.library, "Utils");
    assert_eq!(first.version, 3);
    assert_eq!(first.alias.as_deref(), Some("u"));
    let StmtKind::Import(second) = &out.module.stmts[1].kind else {
        panic!("expected import");
    };
    assert_eq!(second.alias, None);
}

#[test]
fn test_declaration_headers() {
    let out = parse_ok("indicator(\"BOP\", shorttitle = \"B\", overlay = false)");
    let decl = out.module.declaration().expect("header");
    assert_eq!(decl.kind, DeclarationKind::Indicator);
    assert_eq!(decl.args.len(), 3);

    let out = parse_ok("library(\"Utils\")");
    assert_eq!(
        out.module.declaration().map(|d| d.kind),
        Some(DeclarationKind::Library)
    );
}

#[test]
fn test_comment_lines_and_trailing_comments() {
    let source = "// header\nx = 1 // one\n\n// gap\ny = 2\n";
    let out = parse_ok(source);
    assert_eq!(out.module.stmts.len(), 2);
}
