//! Semantic rules as seen through the compiler entry point.

use pinec::{compile, ErrorCode, Stage};

use crate::common::{compile_ok, error_codes};

#[test]
fn test_break_and_continue_outside_a_loop() {
    let output = compile("break\nif close > open\n    continue\n");
    assert_eq!(output.failed_stage(), Some(Stage::Analyze));
    assert_eq!(
        error_codes(&output),
        vec![ErrorCode::BreakOutsideLoop, ErrorCode::ContinueOutsideLoop]
    );
}

#[test]
fn test_break_and_continue_inside_loops() {
    compile_ok("s = 0\nfor i = 0 to 9\n    if i > 4\n        break\n    s += i\nn = 3\nwhile n > 0\n    n -= 1\n    continue\n");
}

#[test]
fn test_duplicate_in_one_scope_is_an_error() {
    let output = compile("x = 1\nx = 2\n");
    assert_eq!(error_codes(&output), vec![ErrorCode::DuplicateDeclaration]);
    assert_eq!(output.errors[0].line, 2);
}

#[test]
fn test_shadowing_in_a_nested_scope_is_silent() {
    let output = compile_ok("x = 1\nif close > open\n    x = 2\nf(x) => x * 2\ny = f(x)\n");
    assert!(output.warnings.is_empty(), "{:#?}", output.warnings);
}

#[test]
fn test_arity_outside_the_catalog_range() {
    let output = compile("a = ta.sma(close)\nb = ta.sma(close, 14, 1)\n");
    assert_eq!(error_codes(&output), vec![ErrorCode::WrongArgumentCount; 2]);
}

#[test]
fn test_arity_inside_the_range_with_named_arguments() {
    compile_ok("a = ta.sma(close, 14)\nb = ta.sma(source = close, length = 14)\nc = ta.sma(close, length = 14)\nd = nz(close)\ne = nz(close, 0)\n");
}

#[test]
fn test_unknown_callees_are_assumed_user_defined() {
    compile_ok("x = ta.somethingnew(close)\n");
}

#[test]
fn test_fixed_builtins_cannot_be_rebound() {
    let output = compile("close := 1\n");
    assert_eq!(error_codes(&output), vec![ErrorCode::ConstReassignment]);
}

#[test]
fn test_every_semantic_error_is_reported_at_once() {
    let output = compile("a = nope\nbreak\nclose := 1\nx = 1\nx = 2\n");
    assert_eq!(output.errors.len(), 4);
    let lines: Vec<u32> = output.errors.iter().map(|e| e.line).collect();
    assert_eq!(lines, vec![1, 2, 3, 5]);
}
