//! Result types of the compiler entry points.
//!
//! These are the public interface between the pipeline and its callers.
//! Diagnostics are resolved to line and column here so callers never deal
//! with byte spans.

use std::fmt;

use pine_diagnostic::{Diagnostic, ErrorCode, LineOffsetTable, Severity};

/// Pipeline stage, in execution order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Lexing and parsing.
    Parse,
    /// Name resolution, scope rules and arity checks.
    Analyze,
    /// Fact collection and TypeScript emission.
    Codegen,
}

/// A diagnostic positioned in the source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileDiagnostic {
    pub code: ErrorCode,
    pub message: String,
    /// 1-based.
    pub line: u32,
    /// 1-based, in characters.
    pub column: u32,
    pub severity: Severity,
}

impl CompileDiagnostic {
    pub(crate) fn resolve(source: &str, table: &LineOffsetTable, diagnostic: &Diagnostic) -> Self {
        let (line, column) = diagnostic
            .primary_span()
            .map_or((1, 1), |span| table.span_start(source, span));
        CompileDiagnostic {
            code: diagnostic.code,
            message: diagnostic.message.clone(),
            line,
            column,
            severity: diagnostic.severity,
        }
    }
}

impl fmt::Display for CompileDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] at line {}, column {}: {}",
            self.severity, self.code, self.line, self.column, self.message
        )
    }
}

/// Result of compiling one script.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompileOutput {
    /// Generated module; empty when any error was reported or compilation
    /// stopped before code generation.
    pub code: String,
    pub errors: Vec<CompileDiagnostic>,
    pub warnings: Vec<CompileDiagnostic>,
    /// Last stage that ran.
    pub stage: Option<Stage>,
}

impl CompileOutput {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Stage that reported the errors, if any.
    pub fn failed_stage(&self) -> Option<Stage> {
        if self.errors.is_empty() {
            None
        } else {
            self.stage
        }
    }
}

/// Every error of a failed compilation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{}", render(.errors))]
pub struct CompileError {
    pub errors: Vec<CompileDiagnostic>,
}

fn render(errors: &[CompileDiagnostic]) -> String {
    let mut out = match errors.len() {
        1 => "compilation failed with 1 error".to_string(),
        n => format!("compilation failed with {n} errors"),
    };
    for error in errors {
        out.push_str("\n  line ");
        out.push_str(&error.line.to_string());
        out.push_str(": ");
        out.push_str(&error.message);
        out.push_str(" (");
        out.push_str(error.code.as_str());
        out.push(')');
    }
    out
}
