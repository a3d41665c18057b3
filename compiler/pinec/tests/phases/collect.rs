//! Series classification and recurrence detection.

use pine_codegen::collect::Binding;
use pine_ir::ExprKind;

use crate::common::{collect, compile_ok, expr_ids};

const CLOSURE: &str = "\
indicator(\"Closure\")
length = input.int(10)
basis = ta.sma(close, length)
dev = close - basis
up = dev > 0 ? dev : na
x = 0.0
if close > open
    x := 1.0
y = x * 2
z = -y + up[1]
w = 1 + 2
";

#[test]
fn test_series_names() {
    let c = collect(CLOSURE);
    for name in ["basis", "dev", "up", "x", "y", "z"] {
        assert!(c.facts.is_series(&Binding::module(name)), "`{name}` should be a series");
    }
    for name in ["length", "w"] {
        assert!(!c.facts.is_series(&Binding::module(name)), "`{name}` should be scalar");
    }
}

#[test]
fn test_classification_is_closed_under_operators() {
    let c = collect(CLOSURE);
    let series = |id| c.facts.is_series_expr(id);
    for id in expr_ids(&c.arena) {
        match c.arena.kind(id) {
            ExprKind::Ident(name) if c.facts.is_series(&Binding::module(name.as_str())) => {
                assert!(series(id), "reference to `{name}`");
            }
            ExprKind::Binary { left, right, .. } => {
                if series(*left) || series(*right) {
                    assert!(series(id), "binary with a series operand");
                }
            }
            ExprKind::Unary { operand, .. } => {
                if series(*operand) {
                    assert!(series(id), "unary of a series");
                }
            }
            ExprKind::Ternary {
                cond,
                then_branch,
                else_branch,
            } => {
                if series(*cond) || series(*then_branch) || series(*else_branch) {
                    assert!(series(id), "ternary with a series part");
                }
            }
            ExprKind::History { base, .. } => {
                if series(*base) {
                    assert!(series(id), "history of a series");
                }
            }
            _ => {}
        }
    }
}

#[test]
fn test_own_history_is_a_recurrence() {
    let c = collect("acc = 0.0\nacc := nz(acc[1]) + close\nx = 0.0\ny = close\nx := y[1]\n");
    assert!(c.facts.recursive.contains(&Binding::module("acc")));
    assert!(!c.facts.recursive.contains(&Binding::module("x")));

    let code = compile_ok("indicator(\"R\")\nacc = 0.0\nacc := nz(acc[1]) + close\nplot(acc)\n").code;
    assert!(code.contains("for (let $i = 0; $i < bars.length; $i++) {"));
    assert!(code.contains("acc = Series.fromArray(bars, $buf0);"));
}

#[test]
fn test_plain_reassignment_is_not_a_recurrence() {
    let code = compile_ok("indicator(\"R\")\nx = 0.0\ny = close\nx := y[1]\nplot(x)\n").code;
    assert!(!code.contains("fromArray"));
    assert!(code.contains("x = y.offset(1);"));
}
