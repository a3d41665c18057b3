//! Shared helpers for phase tests.

use pine_codegen::ProgramFacts;
use pine_ir::{ExprArena, ExprId};
use pinec::{compile, CompileOutput, ErrorCode};

/// Compile and require success.
pub fn compile_ok(source: &str) -> CompileOutput {
    let output = compile(source);
    assert!(output.is_success(), "compile errors: {:#?}", output.errors);
    output
}

pub fn error_codes(output: &CompileOutput) -> Vec<ErrorCode> {
    output.errors.iter().map(|e| e.code).collect()
}

/// A parsed, analyzed and collected program.
pub struct Collected {
    pub arena: ExprArena,
    pub facts: ProgramFacts,
}

pub fn collect(source: &str) -> Collected {
    let parsed = pine_parse::parse(source);
    assert!(!parsed.has_errors(), "syntax errors: {:#?}", parsed.errors);
    let analysis = pine_types::analyze(&parsed);
    assert!(analysis.valid, "semantic errors: {:#?}", analysis.errors);
    let facts = pine_codegen::collect(&parsed.module, &parsed.arena, &analysis);
    Collected {
        arena: parsed.arena,
        facts,
    }
}

pub fn expr_ids(arena: &ExprArena) -> impl Iterator<Item = ExprId> {
    (0..arena.len()).map(|index| ExprId::new(u32::try_from(index).unwrap()))
}
