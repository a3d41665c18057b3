//! The compilation pipeline: parse → analyze → collect → generate.
//!
//! Every call builds fresh state, so independent sources can be compiled
//! concurrently.

use pine_diagnostic::{Diagnostic, ErrorCode, LineOffsetTable};
use rayon::prelude::*;

use crate::options::CompileOptions;
use crate::output::{CompileDiagnostic, CompileError, CompileOutput, Stage};

/// Compile `source` with default options.
pub fn compile(source: &str) -> CompileOutput {
    compile_with(source, &CompileOptions::default())
}

/// Compile `source`.
///
/// Never fails: syntax errors stop the pipeline after parsing, semantic
/// errors stop it after analysis, and every diagnostic is returned in the
/// output. Codegen problems are warnings on otherwise successful output.
#[tracing::instrument(level = "debug", skip_all, fields(bytes = source.len()))]
pub fn compile_with(source: &str, options: &CompileOptions) -> CompileOutput {
    let table = LineOffsetTable::build(source);
    let resolve = |diagnostics: &[Diagnostic]| -> Vec<CompileDiagnostic> {
        diagnostics
            .iter()
            .map(|diagnostic| CompileDiagnostic::resolve(source, &table, diagnostic))
            .collect()
    };

    let parsed = pine_parse::parse(source);
    if parsed.has_errors() || options.stops_at(Stage::Parse) {
        tracing::debug!(errors = parsed.errors.len(), "stopped after parsing");
        return CompileOutput {
            errors: resolve(&parsed.errors),
            stage: Some(Stage::Parse),
            ..CompileOutput::default()
        };
    }

    let analysis = pine_types::analyze(&parsed);
    let mut warnings = resolve(&analysis.warnings);
    if !analysis.valid || options.stops_at(Stage::Analyze) {
        tracing::debug!(errors = analysis.errors.len(), "stopped after analysis");
        return CompileOutput {
            errors: resolve(&analysis.errors),
            warnings,
            stage: Some(Stage::Analyze),
            ..CompileOutput::default()
        };
    }

    let generated = pine_codegen::generate(
        &parsed.module,
        &parsed.arena,
        &analysis,
        &options.codegen,
    );
    match generated {
        Ok(output) => {
            warnings.extend(resolve(&output.warnings));
            CompileOutput {
                code: output.code,
                errors: Vec::new(),
                warnings,
                stage: Some(Stage::Codegen),
            }
        }
        Err(err) => {
            tracing::debug!(error = %err, "code generation failed");
            CompileOutput {
                errors: vec![CompileDiagnostic {
                    code: ErrorCode::CodegenFailed,
                    message: err.to_string(),
                    line: 1,
                    column: 1,
                    severity: pine_diagnostic::Severity::Error,
                }],
                warnings,
                stage: Some(Stage::Codegen),
                ..CompileOutput::default()
            }
        }
    }
}

/// Compile `source`, failing on any error.
///
/// # Errors
///
/// Returns every syntax, semantic or codegen error, with line numbers.
pub fn compile_or_throw(source: &str) -> Result<String, CompileError> {
    let output = compile(source);
    if output.errors.is_empty() {
        Ok(output.code)
    } else {
        Err(CompileError {
            errors: output.errors,
        })
    }
}

/// Compile independent sources in parallel. Results keep the input order.
pub fn compile_many<S>(sources: &[S], options: &CompileOptions) -> Vec<CompileOutput>
where
    S: AsRef<str> + Sync,
{
    sources
        .par_iter()
        .map(|source| compile_with(source.as_ref(), options))
        .collect()
}
