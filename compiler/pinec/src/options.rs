//! Compilation options.

use pine_codegen::CodegenOptions;

use crate::output::Stage;

/// Environment variable overriding the runtime module specifier.
pub const RUNTIME_MODULE_VAR: &str = "PINEC_RUNTIME_MODULE";
/// Environment variable overriding the indent width of generated code.
pub const INDENT_VAR: &str = "PINEC_INDENT";

/// Widest indent accepted from the environment.
const MAX_INDENT: usize = 8;

/// How to run the pipeline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub codegen: CodegenOptions,
    /// Stop once this stage has run. `None` runs every stage.
    pub stop_after: Option<Stage>,
}

impl CompileOptions {
    /// Default options with environment overrides applied.
    ///
    /// Reads `PINEC_RUNTIME_MODULE` and `PINEC_INDENT`. Values that cannot
    /// be used are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = CompileOptions::default();
        if let Some(module) = lookup(RUNTIME_MODULE_VAR) {
            let module = module.trim();
            if module.is_empty() {
                tracing::warn!("{RUNTIME_MODULE_VAR} is empty; using the default runtime module");
            } else {
                options.codegen.runtime_module = module.to_string();
            }
        }
        if let Some(indent) = lookup(INDENT_VAR) {
            match indent.trim().parse::<usize>() {
                Ok(width) if (1..=MAX_INDENT).contains(&width) => {
                    options.codegen.indent_width = width;
                }
                _ => tracing::warn!(
                    value = %indent,
                    "{INDENT_VAR} must be a width from 1 to {MAX_INDENT}; using the default"
                ),
            }
        }
        options
    }

    #[must_use]
    pub fn with_codegen(mut self, codegen: CodegenOptions) -> Self {
        self.codegen = codegen;
        self
    }

    #[must_use]
    pub fn with_runtime_module(mut self, module: impl Into<String>) -> Self {
        self.codegen = self.codegen.with_runtime_module(module);
        self
    }

    #[must_use]
    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.codegen = self.codegen.with_indent_width(width);
        self
    }

    #[must_use]
    pub fn with_header_comment(mut self, header: bool) -> Self {
        self.codegen = self.codegen.with_header_comment(header);
        self
    }

    #[must_use]
    pub fn stop_after(mut self, stage: Stage) -> Self {
        self.stop_after = Some(stage);
        self
    }

    /// Whether the pipeline ends at `stage`.
    pub(crate) fn stops_at(&self, stage: Stage) -> bool {
        self.stop_after == Some(stage)
    }
}
