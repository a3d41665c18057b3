//! Generated module shape.

use pinec::{compile, compile_many, CompileOptions};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::common::compile_ok;

const BOP: &str = "\
indicator(\"Balance of Power\", \"BOP\", overlay = false)
bop = (close - open) / (high - low)
plot(bop, \"BOP\", color = color.red, linewidth = 2)
";

#[test]
fn test_balance_of_power_end_to_end() {
    let output = compile_ok(BOP);
    let code = &output.code;
    assert!(code.contains("close.sub(open).div(high.sub(low))"));
    assert_eq!(code.matches(".toPoints()").count(), 1);
    assert!(code.contains("\"lineWidth\": 2"));
    assert!(code.contains("\"title\": \"BOP\""));
    assert!(code.contains("export function BalanceOfPower(bars: Bar[]"));
    assert!(output.warnings.is_empty(), "{:#?}", output.warnings);
}

#[test]
fn test_counted_loop_end_to_end() {
    let source = "\
indicator(\"Sum\")
sum = 0
for i = 0 to 10 by 2
    sum := sum + i
plot(sum)
";
    let code = compile_ok(source).code;
    assert!(code.contains("for (let i = 0; i <= 10; i += 2) {"));
    assert!(code.contains("sum = sum + i;"));
    assert!(!code.contains("sum.add("));
}

#[test]
fn test_display_calls_become_configuration() {
    let source = "\
indicator(\"Levels\")
plot(close, \"Close\")
hline(70, \"Upper\")
hline(30, \"Lower\")
";
    let code = compile_ok(source).code;
    assert!(!code.contains("hline("));
    assert!(!code.contains("plot("));
    assert_eq!(code.matches(".toPoints()").count(), 1);
    assert!(code.contains("\"title\": \"Upper\""));
    assert!(code.contains("\"title\": \"Lower\""));
}

#[test]
fn test_compilation_is_deterministic() {
    let first = compile(BOP);
    for _ in 0..10 {
        assert_eq!(compile(BOP), first);
    }
}

#[test]
fn test_batch_compilation_matches_one_by_one() {
    let sources = [
        BOP.to_string(),
        "indicator(\"A\")\nplot(ta.sma(close, 5))\n".to_string(),
        "x = nope\n".to_string(),
        "indicator(\"C\")\nvar n = 0\nn := n + 1\nplot(n)\n".to_string(),
    ];
    let options = CompileOptions::default();
    let batch = compile_many(&sources, &options);
    assert_eq!(batch.len(), sources.len());
    for (source, output) in sources.iter().zip(&batch) {
        assert_eq!(output, &compile(source));
    }
    assert!(!batch[2].is_success());
}

#[test]
fn test_long_operator_chain_compiles() {
    let source = format!("indicator(\"Chain\")\nx = close{}\nplot(x)\n", " + 1".repeat(20_000));
    let code = compile_ok(&source).code;
    assert!(code.contains("const x = close.add(1).add(1)"));
    assert_eq!(code.matches(".toPoints()").count(), 1);
}

#[test]
fn test_deeply_nested_negation_compiles() {
    let source = format!("x = {}1\n", "-".repeat(50_000));
    compile_ok(&source);
}

/// Arithmetic over prices and literals.
fn arithmetic() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        Just("close".to_string()),
        Just("open".to_string()),
        Just("high".to_string()),
        Just("low".to_string()),
        (1u32..100).prop_map(|n| n.to_string()),
    ];
    leaf.prop_recursive(4, 32, 2, |inner| {
        (inner.clone(), prop_oneof![Just("+"), Just("-"), Just("*"), Just("/")], inner)
            .prop_map(|(left, op, right)| format!("({left} {op} {right})"))
    })
}

proptest! {
    #[test]
    fn prop_arithmetic_scripts_compile(expr in arithmetic()) {
        let source = format!("indicator(\"P\")\nv = {expr}\nplot(v)\n");
        let first = compile(&source);
        prop_assert!(first.is_success(), "{:#?}", first.errors);
        prop_assert_eq!(first.code.matches(".toPoints()").count(), 1);
        prop_assert_eq!(compile(&source), first);
    }
}
