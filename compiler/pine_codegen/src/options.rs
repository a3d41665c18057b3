//! Output options.

/// How generated modules are written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Module specifier the runtime facilities are imported from.
    pub runtime_module: String,
    /// Spaces per indentation level.
    pub indent_width: usize,
    /// Start the module with a "generated, do not edit" comment.
    pub header_comment: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        CodegenOptions {
            runtime_module: "@pinec/runtime".to_string(),
            indent_width: 2,
            header_comment: true,
        }
    }
}

impl CodegenOptions {
    #[must_use]
    pub fn with_runtime_module(mut self, module: impl Into<String>) -> Self {
        self.runtime_module = module.into();
        self
    }

    #[must_use]
    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }

    #[must_use]
    pub fn with_header_comment(mut self, header: bool) -> Self {
        self.header_comment = header;
        self
    }
}
