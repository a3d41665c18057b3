#![allow(clippy::unwrap_used, clippy::expect_used)]

mod stmt;

use crate::{parse, ParseOutput};
use pine_ir::{ExprId, Stmt, StmtKind};

pub(crate) fn parse_ok(source: &str) -> ParseOutput {
    let output = parse(source);
    assert!(
        !output.has_errors(),
        "unexpected errors for {source:?}: {:#?}",
        output.errors
    );
    output
}

/// The expression of the single expression statement in `source`.
pub(crate) fn single_expr(output: &ParseOutput) -> ExprId {
    match output.module.stmts.as_slice() {
        [Stmt {
            kind: StmtKind::Expr(id),
            ..
        }] => *id,
        other => panic!("expected one expression statement, got {other:#?}"),
    }
}
