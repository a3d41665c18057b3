//! Emission state.
//!
//! An `EmitContext` is created for one module and dropped with it. It owns
//! the output buffer and everything the emitters accumulate while writing:
//! runtime facilities used, temporary counters, the active `if` masks and
//! codegen warnings. Program facts are only read.

use std::collections::BTreeSet;

use pine_diagnostic::{Diagnostic, ErrorCode};
use pine_ir::{ExprArena, ExprId, Span};
use pine_types::{builtins, Analysis};
use rustc_hash::FxHashMap;

use crate::collect::{Binding, Owner, ProgramFacts};
use crate::emit::names;
use crate::CodegenOptions;

pub struct EmitContext<'a> {
    pub arena: &'a ExprArena,
    pub facts: &'a ProgramFacts,
    pub analysis: &'a Analysis,
    pub options: &'a CodegenOptions,
    /// Sanitized indicator name; also the main function's name.
    pub name: String,
    indent: usize,
    indent_unit: String,
    output: String,
    /// Runtime exports referenced so far, sorted for the import line.
    facilities: BTreeSet<&'static str>,
    temp_counters: FxHashMap<&'static str, u32>,
    /// Series masks of the enclosing series-conditioned `if` branches,
    /// innermost last. Each already includes its outer masks.
    masks: Vec<String>,
    owner: Owner,
    loop_depth: u32,
    warnings: Vec<Diagnostic>,
}

impl<'a> EmitContext<'a> {
    pub fn new(
        arena: &'a ExprArena,
        facts: &'a ProgramFacts,
        analysis: &'a Analysis,
        options: &'a CodegenOptions,
    ) -> Self {
        EmitContext {
            arena,
            facts,
            analysis,
            options,
            name: names::pascal_case(&facts.metadata.title),
            indent: 0,
            indent_unit: " ".repeat(options.indent_width),
            output: String::with_capacity(4096),
            facilities: BTreeSet::new(),
            temp_counters: FxHashMap::default(),
            masks: Vec::new(),
            owner: Owner::Module,
            loop_depth: 0,
            warnings: Vec::new(),
        }
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn dedent(&mut self) {
        debug_assert!(self.indent > 0, "dedent called with zero indent");
        self.indent = self.indent.saturating_sub(1);
    }

    /// Current indentation as text.
    pub fn indentation(&self) -> String {
        self.indent_unit.repeat(self.indent)
    }

    pub fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.output.push_str(&self.indent_unit);
        }
    }

    /// Write a line at the current indentation.
    pub fn writeln(&mut self, s: &str) {
        self.write_indent();
        self.output.push_str(s);
        self.output.push('\n');
    }

    pub fn newline(&mut self) {
        self.output.push('\n');
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    /// Run `f` against an empty buffer and return what it wrote.
    pub fn capture(&mut self, f: impl FnOnce(&mut Self)) -> String {
        let saved = std::mem::take(&mut self.output);
        f(self);
        std::mem::replace(&mut self.output, saved)
    }

    /// Wrap statements written by `f` in an immediately invoked arrow
    /// function. The body is indented one level past the current line.
    pub fn iife(&mut self, f: impl FnOnce(&mut Self)) -> String {
        self.indent();
        let body = self.capture(f);
        self.dedent();
        format!("(() => {{\n{body}{}}})()", self.indentation())
    }

    pub fn use_facility(&mut self, name: &'static str) {
        self.facilities.insert(name);
    }

    /// Record the runtime namespace `name`, if it is one.
    pub fn use_namespace(&mut self, name: &str) {
        if let Some(&namespace) = builtins::NAMESPACES.iter().find(|ns| **ns == name) {
            self.facilities.insert(namespace);
        }
    }

    pub fn facilities(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.facilities.iter().copied()
    }

    /// A fresh generated name, e.g. `$m0`. Pine identifiers cannot contain
    /// `$`, so these never collide with user names.
    pub fn fresh_temp(&mut self, prefix: &'static str) -> String {
        let counter = self.temp_counters.entry(prefix).or_insert(0);
        let n = *counter;
        *counter += 1;
        format!("${prefix}{n}")
    }

    pub fn warn(&mut self, span: Span, message: impl Into<String>) {
        self.warnings.push(
            Diagnostic::warning(ErrorCode::UnsupportedConstruct)
                .with_message(message)
                .with_label(span, "not supported by the code generator"),
        );
    }

    pub fn take_warnings(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.warnings)
    }

    pub fn mask(&self) -> Option<&str> {
        self.masks.last().map(String::as_str)
    }

    pub fn with_mask<R>(&mut self, mask: String, f: impl FnOnce(&mut Self) -> R) -> R {
        self.masks.push(mask);
        let result = f(self);
        self.masks.pop();
        result
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    pub fn with_owner<R>(&mut self, owner: Owner, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = std::mem::replace(&mut self.owner, owner);
        let result = f(self);
        self.owner = saved;
        result
    }

    pub fn in_loop(&self) -> bool {
        self.loop_depth > 0
    }

    pub fn with_loop<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.loop_depth += 1;
        let result = f(self);
        self.loop_depth -= 1;
        result
    }

    pub fn binding(&self, name: &str) -> Binding {
        self.facts.resolve(&self.owner, name)
    }

    #[inline]
    pub fn is_series(&self, id: ExprId) -> bool {
        self.facts.is_series_expr(id)
    }

    /// Whether `name` reads one of the built-in series rather than a user
    /// binding.
    pub fn is_builtin_series(&self, name: &str) -> bool {
        builtins::is_builtin_series(name)
            && self.binding(name).owner == Owner::Module
            && !self.facts.declares_at_module(name)
    }

    /// Spelling of a user identifier.
    pub fn ident(&self, name: &str) -> String {
        names::mangle(name, &self.name)
    }

    /// TypeScript spelling of a written Pine type.
    pub fn ts_type(&self, pine: &str) -> String {
        if self.facts.user_type(pine).is_some() {
            self.ident(pine)
        } else {
            names::ts_type(pine)
        }
    }

    /// `value` as a constant series.
    pub fn lift(&mut self, value: &str) -> String {
        self.use_facility("Series");
        format!("Series.constant(bars, {value})")
    }
}
