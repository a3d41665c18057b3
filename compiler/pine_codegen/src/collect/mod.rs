//! Program facts.
//!
//! Emission decisions depend on the whole program: whether a name is a
//! series, whether a reassignment is a recurrence, which inputs and plots
//! exist. [`collect`] gathers all of that in one pass over the module before
//! any text is written, and the emitters only read the result.
//!
//! # Passes
//!
//! ```text
//! Module + ExprArena + Analysis
//!        ↓
//!   scan      (declarations, inputs, plots, recurrences, imports)
//!        ↓
//!   classify  (series classification to a fixpoint)
//!        ↓
//!   ProgramFacts
//! ```

mod classify;
mod display;
mod scan;

pub use display::{
    color_hex, const_value, FillDef, HlineDef, InputDef, InputKind, Metadata, PlotDef,
};

use bitflags::bitflags;
use pine_diagnostic::Diagnostic;
use pine_ir::{DeclarationKind, ExprArena, ExprId, Module};
use pine_types::Analysis;
use rustc_hash::{FxHashMap, FxHashSet};

/// Whether an expression denotes a per-bar series or a plain value.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Classification {
    #[default]
    Scalar,
    Series,
}

impl Classification {
    #[inline]
    pub fn is_series(self) -> bool {
        self == Classification::Series
    }

    #[inline]
    pub fn of(series: bool) -> Self {
        if series {
            Classification::Series
        } else {
            Classification::Scalar
        }
    }
}

/// Where a name is bound. Functions and methods own their parameters
/// and locals; every other name belongs to the module.
#[derive(Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub enum Owner {
    Module,
    /// A function name, or `Type.method` for a method.
    Function(String),
}

/// A resolved name.
#[derive(Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct Binding {
    pub owner: Owner,
    pub name: String,
}

impl Binding {
    pub fn module(name: impl Into<String>) -> Self {
        Binding {
            owner: Owner::Module,
            name: name.into(),
        }
    }

    pub fn local(function: impl Into<String>, name: impl Into<String>) -> Self {
        Binding {
            owner: Owner::Function(function.into()),
            name: name.into(),
        }
    }
}

bitflags! {
    /// Runtime facilities the generated module needs beyond plain series
    /// composition.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct RuntimeFeatures: u16 {
        /// OHLCV or derived price series.
        const PRICE = 1 << 0;
        const TIME = 1 << 1;
        /// UTC calendar fields of the bar time.
        const CALENDAR = 1 << 2;
        const BAR_INDEX = 1 << 3;
        /// At least one reassignment is evaluated bar by bar.
        const RECURRENCE = 1 << 4;
        /// At least one `if` statement has a series condition.
        const MASKED_IF = 1 << 5;
        const INPUTS = 1 << 6;
        const FILLS = 1 << 7;
        const USER_TYPES = 1 << 8;
        const LIBRARY_IMPORTS = 1 << 9;
    }
}

/// What a call does, when it is more than a function call.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CallRole {
    /// Index into [`ProgramFacts::inputs`].
    Input(usize),
    /// Index into [`ProgramFacts::plots`].
    Plot(usize),
    /// Index into [`ProgramFacts::hlines`].
    Hline(usize),
    Fill,
    /// A display or drawing call with no generated counterpart.
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionInfo {
    pub name: String,
    pub params: Vec<String>,
    pub exported: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodInfo {
    pub type_name: String,
    pub name: String,
    pub self_name: String,
    pub params: Vec<String>,
}

impl MethodInfo {
    /// Owner key of the method's locals.
    pub fn owner_key(&self) -> String {
        format!("{}.{}", self.type_name, self.name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    /// Written type, e.g. `float` or `array<int>`.
    pub ty: String,
    pub default: Option<ExprId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UserType {
    pub name: String,
    pub fields: Vec<FieldInfo>,
    pub exported: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportInfo {
    pub owner: String,
    pub library: String,
    pub version: u32,
    /// Local namespace: the alias, or the library name.
    pub namespace: String,
}

/// Everything the emitters need to know about a program up front.
///
/// Built once per compilation by [`collect`] and read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct ProgramFacts {
    pub metadata: Metadata,
    pub inputs: Vec<InputDef>,
    pub plots: Vec<PlotDef>,
    pub hlines: Vec<HlineDef>,
    pub fills: Vec<FillDef>,
    pub types: Vec<UserType>,
    pub methods: Vec<MethodInfo>,
    pub functions: Vec<FunctionInfo>,
    pub imports: Vec<ImportInfo>,

    /// Series-classified names.
    pub series: FxHashSet<Binding>,
    /// Names reassigned with `:=` or a compound operator.
    pub reassigned: FxHashSet<Binding>,
    /// Names whose reassignment reads their own history (`x := x[1] + 1`).
    pub recursive: FxHashSet<Binding>,
    /// `var`/`varip` declarations.
    pub persistent: FxHashSet<Binding>,
    /// Persistent names reassigned outside of any loop; their value is carried
    /// from bar to bar.
    pub carried: FxHashSet<Binding>,

    pub features: RuntimeFeatures,
    /// Built-in series the program reads, in canonical order.
    pub builtin_series: Vec<&'static str>,
    /// Codegen warnings found while collecting.
    pub diagnostics: Vec<Diagnostic>,

    classification: Vec<Classification>,
    calls: FxHashMap<ExprId, CallRole>,
    /// Names declared inside each function or method, parameters included.
    locals: FxHashMap<String, FxHashSet<String>>,
    /// Names declared at module level.
    module_names: FxHashSet<String>,
    /// Functions and methods whose value is a series.
    returns_series: FxHashSet<String>,
}

impl ProgramFacts {
    /// Classification of an expression.
    #[inline]
    pub fn classification(&self, id: ExprId) -> Classification {
        self.classification
            .get(id.index())
            .copied()
            .unwrap_or_default()
    }

    #[inline]
    pub fn is_series_expr(&self, id: ExprId) -> bool {
        self.classification(id).is_series()
    }

    /// Resolve `name` as seen from inside `owner`.
    pub fn resolve(&self, owner: &Owner, name: &str) -> Binding {
        if let Owner::Function(function) = owner {
            if self
                .locals
                .get(function)
                .is_some_and(|names| names.contains(name))
            {
                return Binding::local(function.as_str(), name);
            }
        }
        Binding::module(name)
    }

    /// Whether `name` names a built-in namespace as seen from `owner`, i.e.
    /// no user declaration shadows it.
    pub fn is_namespace(&self, owner: &Owner, name: &str) -> bool {
        pine_types::builtins::NAMESPACES.contains(&name)
            && self.resolve(owner, name).owner == Owner::Module
            && !self.declares_at_module(name)
    }

    pub fn is_series(&self, binding: &Binding) -> bool {
        self.series.contains(binding)
    }

    pub fn is_reassigned(&self, binding: &Binding) -> bool {
        self.reassigned.contains(binding)
    }

    /// Whether a reassignment of `binding` must be evaluated bar by bar.
    pub fn needs_bar_loop(&self, binding: &Binding, in_loop: bool) -> bool {
        self.recursive.contains(binding) || (!in_loop && self.persistent.contains(binding))
    }

    pub fn call_role(&self, id: ExprId) -> Option<CallRole> {
        self.calls.get(&id).copied()
    }

    /// Whether the module itself declares `name`.
    pub fn declares_at_module(&self, name: &str) -> bool {
        self.module_names.contains(name)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionInfo> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn user_type(&self, name: &str) -> Option<&UserType> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn method(&self, type_name: &str, name: &str) -> Option<&MethodInfo> {
        self.methods
            .iter()
            .find(|m| m.type_name == type_name && m.name == name)
    }

    /// A method called `name`, when exactly one type declares one.
    pub fn unique_method(&self, name: &str) -> Option<&MethodInfo> {
        let mut found = self.methods.iter().filter(|m| m.name == name);
        let first = found.next()?;
        found.next().is_none().then_some(first)
    }

    pub fn import(&self, namespace: &str) -> Option<&ImportInfo> {
        self.imports.iter().find(|i| i.namespace == namespace)
    }

    pub fn returns_series(&self, key: &str) -> bool {
        self.returns_series.contains(key)
    }

    pub fn is_library(&self) -> bool {
        self.metadata.kind == DeclarationKind::Library
    }
}

/// Collect the facts of a parsed and analyzed module.
#[tracing::instrument(level = "debug", skip_all)]
pub fn collect(module: &Module, arena: &ExprArena, analysis: &Analysis) -> ProgramFacts {
    let mut facts = scan::scan(module, arena);
    classify::classify(&mut facts, module, arena, analysis);
    tracing::debug!(
        series = facts.series.len(),
        recursive = facts.recursive.len(),
        inputs = facts.inputs.len(),
        plots = facts.plots.len(),
        "collected program facts"
    );
    facts
}

#[cfg(test)]
mod tests;
