//! Compiler from Pine indicator scripts to TypeScript.
//!
//! The generated module is written against the lazy `Series` runtime and
//! exports one indicator function from bars to plot points, together with
//! its metadata, default inputs and plot configuration.
//!
//! # Usage
//!
//! ```
//! let output = pinec::compile("indicator(\"BOP\")\nplot((close - open) / (high - low))\n");
//! assert!(output.is_success());
//! assert!(output.code.contains("close.sub(open).div(high.sub(low))"));
//! ```
//!
//! # Architecture
//!
//! ```text
//! pine_lexer → pine_parse → pine_types → pine_codegen
//!                          ↓
//!                        pinec  ← this crate
//! ```
//!
//! Syntax errors stop the pipeline after parsing and semantic errors after
//! analysis; codegen problems come back as warnings next to the code.

mod options;
mod output;
mod pipeline;

pub use options::{CompileOptions, INDENT_VAR, RUNTIME_MODULE_VAR};
pub use output::{CompileDiagnostic, CompileError, CompileOutput, Stage};
pub use pine_codegen::CodegenOptions;
pub use pine_diagnostic::{ErrorCode, Severity};
pub use pipeline::{compile, compile_many, compile_or_throw, compile_with};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call more than once. Does nothing unless `RUST_LOG` is set, e.g.
/// `RUST_LOG=pine_codegen=debug` or `RUST_LOG=pinec=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
