//! Declarations, display calls and reassignment shapes.

use pine_diagnostic::{Diagnostic, ErrorCode};
use pine_ir::visitor::{walk_block, walk_expr, walk_stmt, Visitor};
use pine_ir::{Block, CallArg, ExprArena, ExprId, ExprKind, Module, Span, Stmt, StmtKind};
use pine_types::builtins;
use rustc_hash::{FxHashMap, FxHashSet};

use super::display::{self, arg};
use super::{
    Binding, CallRole, FieldInfo, FunctionInfo, ImportInfo, MethodInfo, Owner, ProgramFacts,
    RuntimeFeatures, UserType,
};

/// Calls that draw or alert and have no generated counterpart.
const UNSUPPORTED_CALLS: &[&str] = &[
    "bgcolor",
    "barcolor",
    "plotshape",
    "plotchar",
    "plotarrow",
    "plotcandle",
    "plotbar",
    "alertcondition",
    "alert",
];

/// Namespaces of drawing objects and order handling.
const UNSUPPORTED_NAMESPACES: &[&str] = &[
    "label", "line", "box", "table", "linefill", "polyline", "strategy",
];

pub(super) fn scan<'a>(module: &'a Module, arena: &'a ExprArena) -> ProgramFacts {
    let mut scanner = Scanner {
        facts: ProgramFacts::default(),
        arena,
        owner: Owner::Module,
        loop_depth: 0,
        block_depth: 0,
        root: None,
        display_refs: FxHashMap::default(),
        display_calls: FxHashMap::default(),
        used_series: FxHashSet::default(),
    };
    scanner.declarations(module);
    scanner.visit_module(module, arena);
    scanner.finish();
    scanner.facts
}

/// Statement root being visited: the value of a declaration or an
/// expression statement.
#[derive(Clone)]
struct Root {
    id: ExprId,
    name: Option<String>,
}

struct Scanner<'a> {
    facts: ProgramFacts,
    arena: &'a ExprArena,
    owner: Owner,
    loop_depth: u32,
    block_depth: u32,
    root: Option<Root>,
    /// Variable name to plot or hline id, for `fill` arguments.
    display_refs: FxHashMap<String, String>,
    /// Plot and hline call to its id.
    display_calls: FxHashMap<ExprId, String>,
    used_series: FxHashSet<&'static str>,
}

impl<'a> Scanner<'a> {
    /// Module-level declarations, and the names each function declares.
    fn declarations(&mut self, module: &Module) {
        for stmt in &module.stmts {
            match &stmt.kind {
                StmtKind::Declaration(decl) => {
                    self.facts.metadata = display::metadata(decl.kind, &decl.args, self.arena);
                }
                StmtKind::Function(func) => {
                    let params: Vec<String> = func.params.iter().map(|p| p.name.clone()).collect();
                    let mut names = local_names(&func.body, self.arena);
                    names.extend(params.iter().cloned());
                    self.facts.locals.insert(func.name.clone(), names);
                    self.facts.functions.push(FunctionInfo {
                        name: func.name.clone(),
                        params,
                        exported: func.exported,
                    });
                }
                StmtKind::Method(method) => {
                    let info = MethodInfo {
                        type_name: method.bound_type.clone(),
                        name: method.name.clone(),
                        self_name: method.self_name.clone(),
                        params: method.params.iter().map(|p| p.name.clone()).collect(),
                    };
                    let mut names = local_names(&method.body, self.arena);
                    names.insert(info.self_name.clone());
                    names.extend(info.params.iter().cloned());
                    self.facts.locals.insert(info.owner_key(), names);
                    self.facts.methods.push(info);
                }
                StmtKind::Type(ty) => self.facts.types.push(UserType {
                    name: ty.name.clone(),
                    fields: ty
                        .fields
                        .iter()
                        .map(|f| FieldInfo {
                            name: f.name.clone(),
                            ty: f.ty.to_string(),
                            default: f.default,
                        })
                        .collect(),
                    exported: ty.exported,
                }),
                StmtKind::Import(import) => self.facts.imports.push(ImportInfo {
                    owner: import.owner.clone(),
                    library: import.library.clone(),
                    version: import.version,
                    namespace: import.namespace().to_string(),
                }),
                _ => {
                    let mut names = LocalNames::default();
                    names.visit_stmt(stmt, self.arena);
                    self.facts.module_names.extend(names.0);
                }
            }
        }
    }

    fn binding(&self, name: &str) -> Binding {
        self.facts.resolve(&self.owner, name)
    }

    fn warn(&mut self, span: Span, message: String) {
        self.facts.diagnostics.push(
            Diagnostic::warning(ErrorCode::UnsupportedConstruct)
                .with_message(message)
                .with_label(span, "dropped from the generated code"),
        );
    }

    fn is_user_name(&self, name: &str) -> bool {
        self.binding(name).owner != Owner::Module || self.facts.module_names.contains(name)
    }

    fn is_statement_root(&self, id: ExprId) -> bool {
        self.owner == Owner::Module
            && self.block_depth == 0
            && self.root.as_ref().is_some_and(|root| root.id == id)
    }

    fn is_unsupported(&self, path: &str) -> bool {
        if UNSUPPORTED_CALLS.contains(&path) {
            return !self.is_user_name(path);
        }
        path.split_once('.').is_some_and(|(namespace, _)| {
            UNSUPPORTED_NAMESPACES.contains(&namespace) && !self.is_user_name(namespace)
        })
    }

    fn call(&mut self, id: ExprId, path: &str, args: &'a [CallArg]) {
        if display::is_input(path) {
            let index = self.facts.inputs.len();
            let name = self
                .root
                .as_ref()
                .filter(|root| root.id == id)
                .and_then(|root| root.name.clone())
                .filter(|name| self.facts.inputs.iter().all(|input| &input.id != name))
                .unwrap_or_else(|| format!("input{index}"));
            let def = display::input(path, name, args, self.arena);
            self.facts.inputs.push(def);
            self.facts.calls.insert(id, CallRole::Input(index));
            return;
        }

        let span = self.arena.span(id);
        match path {
            "plot" | "hline" | "fill" if !self.is_statement_root(id) => {
                self.facts.calls.insert(id, CallRole::Unsupported);
                self.warn(span, format!("`{path}` is only supported as a top-level statement"));
            }
            "plot" => {
                let index = self.facts.plots.len();
                let Some((def, dynamic_color)) = display::plot(index, args, self.arena) else {
                    self.facts.calls.insert(id, CallRole::Unsupported);
                    self.warn(span, "`plot` without a series argument".to_string());
                    return;
                };
                if dynamic_color {
                    self.facts.diagnostics.push(
                        Diagnostic::warning(ErrorCode::UnsupportedConstruct)
                            .with_message("per-bar plot colors are not supported")
                            .with_label(span, "the default color is used"),
                    );
                }
                self.register_display(id, def.id.clone());
                self.facts.plots.push(def);
                self.facts.calls.insert(id, CallRole::Plot(index));
            }
            "hline" => {
                let index = self.facts.hlines.len();
                let Some(def) = display::hline(index, args, self.arena) else {
                    self.facts.calls.insert(id, CallRole::Unsupported);
                    self.warn(span, "`hline` without a price argument".to_string());
                    return;
                };
                self.register_display(id, def.id.clone());
                self.facts.hlines.push(def);
                self.facts.calls.insert(id, CallRole::Hline(index));
            }
            "fill" => self.fill(id, args),
            _ if self.is_unsupported(path) => {
                self.facts.calls.insert(id, CallRole::Unsupported);
                self.warn(span, format!("`{path}` has no generated counterpart"));
            }
            _ => {}
        }
    }

    fn register_display(&mut self, id: ExprId, display_id: String) {
        if let Some(name) = self.root.as_ref().and_then(|root| root.name.clone()) {
            self.display_refs.insert(name, display_id.clone());
        }
        self.display_calls.insert(id, display_id);
    }

    fn display_ref(&self, id: ExprId) -> Option<String> {
        match self.arena.kind(id) {
            ExprKind::Ident(name) => self.display_refs.get(name).cloned(),
            _ => self.display_calls.get(&id).cloned(),
        }
    }

    fn fill(&mut self, id: ExprId, args: &[CallArg]) {
        self.facts.calls.insert(id, CallRole::Fill);
        let plot1 = arg(args, 0, "hline1")
            .or_else(|| arg(args, 0, "plot1"))
            .and_then(|a| self.display_ref(a));
        let plot2 = arg(args, 1, "hline2")
            .or_else(|| arg(args, 1, "plot2"))
            .and_then(|a| self.display_ref(a));
        let (Some(plot1), Some(plot2)) = (plot1, plot2) else {
            self.warn(
                self.arena.span(id),
                "`fill` arguments must name plots or hlines".to_string(),
            );
            return;
        };
        let (color, title) = display::fill_style(args, self.arena);
        let index = self.facts.fills.len();
        self.facts.fills.push(display::FillDef {
            id: format!("fill{index}"),
            plot1,
            plot2,
            color,
            title,
        });
    }

    fn with_root(&mut self, id: ExprId, name: Option<String>) {
        let saved = self.root.replace(Root { id, name });
        self.visit_expr(id, self.arena);
        self.root = saved;
    }

    fn finish(&mut self) {
        let canonical = builtins::PRICE_SERIES
            .iter()
            .chain(builtins::DERIVED_SERIES)
            .chain(builtins::CALENDAR_SERIES);
        self.facts.builtin_series = canonical
            .filter(|name| self.used_series.contains(*name))
            .copied()
            .collect();

        let mut features = RuntimeFeatures::empty();
        for name in &self.facts.builtin_series {
            features |= match *name {
                "time" => RuntimeFeatures::TIME,
                "bar_index" => RuntimeFeatures::BAR_INDEX,
                name if builtins::CALENDAR_SERIES.contains(&name) => RuntimeFeatures::CALENDAR,
                _ => RuntimeFeatures::PRICE,
            };
        }
        features.set(RuntimeFeatures::INPUTS, !self.facts.inputs.is_empty());
        features.set(RuntimeFeatures::FILLS, !self.facts.fills.is_empty());
        features.set(RuntimeFeatures::USER_TYPES, !self.facts.types.is_empty());
        features.set(RuntimeFeatures::LIBRARY_IMPORTS, !self.facts.imports.is_empty());
        self.facts.features = features;
    }
}

impl<'a> Visitor<'a> for Scanner<'a> {
    fn visit_stmt(&mut self, stmt: &'a Stmt, arena: &'a ExprArena) {
        match &stmt.kind {
            StmtKind::Function(func) => {
                let saved = std::mem::replace(&mut self.owner, Owner::Function(func.name.clone()));
                walk_stmt(self, stmt, arena);
                self.owner = saved;
            }
            StmtKind::Method(method) => {
                let key = format!("{}.{}", method.bound_type, method.name);
                let saved = std::mem::replace(&mut self.owner, Owner::Function(key));
                walk_stmt(self, stmt, arena);
                self.owner = saved;
            }
            StmtKind::VarDecl(decl) => {
                if decl.persistence.is_persistent() {
                    let binding = self.binding(&decl.name);
                    self.facts.persistent.insert(binding);
                }
                self.with_root(decl.value, Some(decl.name.clone()));
            }
            StmtKind::Reassign(re) => {
                if let Some(name) = arena.ident(re.target) {
                    let binding = self.binding(name);
                    if reads_own_history(arena, re.value, name) {
                        self.facts.recursive.insert(binding.clone());
                    }
                    if self.loop_depth == 0 && self.facts.persistent.contains(&binding) {
                        self.facts.carried.insert(binding.clone());
                    }
                    self.facts.reassigned.insert(binding);
                }
                self.visit_expr(re.target, arena);
                self.with_root(re.value, None);
            }
            StmtKind::Expr(id) => self.with_root(*id, None),
            StmtKind::For(_) | StmtKind::ForIn(_) | StmtKind::While(_) => {
                self.loop_depth += 1;
                walk_stmt(self, stmt, arena);
                self.loop_depth -= 1;
            }
            _ => walk_stmt(self, stmt, arena),
        }
    }

    fn visit_block(&mut self, block: &'a Block, arena: &'a ExprArena) {
        self.block_depth += 1;
        walk_block(self, block, arena);
        self.block_depth -= 1;
    }

    fn visit_expr(&mut self, id: ExprId, arena: &'a ExprArena) {
        match arena.kind(id) {
            ExprKind::Ident(name) => {
                if let Some(&canonical) = builtin_series_name(name) {
                    if self.binding(name).owner == Owner::Module
                        && !self.facts.module_names.contains(name)
                    {
                        self.used_series.insert(canonical);
                    }
                }
            }
            ExprKind::Call { callee, args } => {
                if let Some(path) = arena.path(*callee) {
                    self.call(id, &path, args);
                }
            }
            _ => {}
        }
        walk_expr(self, id, arena);
    }
}

fn builtin_series_name(name: &str) -> Option<&'static &'static str> {
    builtins::PRICE_SERIES
        .iter()
        .chain(builtins::DERIVED_SERIES)
        .chain(builtins::CALENDAR_SERIES)
        .find(|candidate| **candidate == name)
}

/// Names declared anywhere below a statement: variables, destructured
/// names and loop variables.
#[derive(Default)]
struct LocalNames(FxHashSet<String>);

impl<'ast> Visitor<'ast> for LocalNames {
    fn visit_stmt(&mut self, stmt: &'ast Stmt, arena: &'ast ExprArena) {
        match &stmt.kind {
            StmtKind::VarDecl(decl) => {
                self.0.insert(decl.name.clone());
            }
            StmtKind::TupleDestructure(td) => {
                self.0.extend(td.names.iter().map(|(name, _)| name.clone()));
            }
            StmtKind::For(f) => {
                self.0.insert(f.var.clone());
            }
            StmtKind::ForIn(f) => {
                self.0.insert(f.item.0.clone());
                if let Some((index, _)) = &f.index {
                    self.0.insert(index.clone());
                }
            }
            _ => {}
        }
        walk_stmt(self, stmt, arena);
    }
}

fn local_names(block: &Block, arena: &ExprArena) -> FxHashSet<String> {
    let mut names = LocalNames::default();
    names.visit_block(block, arena);
    names.0
}

/// Whether `id` contains `name[n]`.
fn reads_own_history(arena: &ExprArena, id: ExprId, name: &str) -> bool {
    struct SelfHistory<'n> {
        name: &'n str,
        found: bool,
    }

    impl<'ast> Visitor<'ast> for SelfHistory<'_> {
        fn visit_expr(&mut self, id: ExprId, arena: &'ast ExprArena) {
            if let ExprKind::History { base, .. } = arena.kind(id) {
                if arena.ident(*base) == Some(self.name) {
                    self.found = true;
                    return;
                }
            }
            walk_expr(self, id, arena);
        }
    }

    let mut finder = SelfHistory { name, found: false };
    finder.visit_expr(id, arena);
    finder.found
}
