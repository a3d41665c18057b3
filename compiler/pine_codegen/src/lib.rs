//! TypeScript code generation for Pine indicators.
//!
//! The generated module targets the lazy `Series` runtime: every per-bar
//! value is a `Series`, operators become method calls, and the indicator is
//! a single function from bars to plot points.
//!
//! # Architecture
//!
//! ```text
//! Module + ExprArena + Analysis
//!        ↓
//!     collect        (metadata, inputs, plots, series classification)
//!        ↓
//!    EmitContext     (one pass over the statements, writing TypeScript)
//!        ↓
//!   CodegenOutput    (module text + codegen warnings)
//! ```
//!
//! Generation is deterministic: the same source always produces the same
//! module, byte for byte.

pub mod collect;
mod context;
mod emit;
mod options;

pub use collect::{collect, Classification, ProgramFacts};
pub use options::CodegenOptions;

use pine_diagnostic::Diagnostic;
use pine_ir::{ExprArena, Module};
use pine_types::Analysis;

use context::EmitContext;

/// A generated module.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CodegenOutput {
    pub code: String,
    /// Constructs that were approximated or dropped.
    pub warnings: Vec<Diagnostic>,
}

#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    #[error("could not serialize {what}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("code generation requires a valid analysis")]
    InvalidAnalysis,
}

/// Generate the TypeScript module for an analyzed program.
///
/// # Errors
///
/// Returns [`CodegenError::InvalidAnalysis`] when `analysis` carries
/// errors, and [`CodegenError::Serialize`] if a config table cannot be
/// written.
#[tracing::instrument(level = "debug", skip_all)]
pub fn generate(
    module: &Module,
    arena: &ExprArena,
    analysis: &Analysis,
    options: &CodegenOptions,
) -> Result<CodegenOutput, CodegenError> {
    if !analysis.valid {
        return Err(CodegenError::InvalidAnalysis);
    }

    let facts = collect(module, arena, analysis);
    tracing::debug!(
        inputs = facts.inputs.len(),
        plots = facts.plots.len(),
        series = facts.series.len(),
        recurrences = facts.recursive.len(),
        "collected program facts"
    );

    let mut ctx = EmitContext::new(arena, &facts, analysis, options);
    let code = emit::emit_module(&mut ctx, module)?;

    let mut warnings = facts.diagnostics.clone();
    warnings.extend(ctx.take_warnings());
    tracing::debug!(bytes = code.len(), warnings = warnings.len(), "generated module");

    Ok(CodegenOutput { code, warnings })
}
