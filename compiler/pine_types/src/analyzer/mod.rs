//! Semantic analysis.
//!
//! One walk over the module resolves every name against a [`ScopeTree`],
//! enforces the scope rules, checks built-in call arity and infers a
//! [`Type`] for every expression. Diagnostics accumulate; the walk never
//! stops early.

mod expr;
mod stmt;

use pine_diagnostic::{Diagnostic, ErrorCode};
use pine_ir::{ExprArena, ExprId, Module, Span, StmtKind};
use pine_parse::ParseOutput;
use rustc_hash::FxHashMap;

use crate::{ScopeKind, ScopeTree, Symbol, Type};

/// Result of [`analyze`].
#[derive(Clone, Debug)]
pub struct Analysis {
    /// No errors were reported. Warnings do not count.
    pub valid: bool,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    /// Every scope created during the walk, built-ins at the root.
    pub symbols: ScopeTree,
    /// Inferred type per expression, indexed by [`ExprId`].
    pub expr_types: Vec<Type>,
}

impl Analysis {
    pub fn expr_type(&self, id: ExprId) -> &Type {
        static UNKNOWN: Type = Type::Unknown;
        self.expr_types.get(id.index()).unwrap_or(&UNKNOWN)
    }

    /// Symbol declared at module level (or a built-in) named `name`.
    pub fn global(&self, name: &str) -> Option<&Symbol> {
        self.symbols.lookup(name)
    }
}

/// Analyze a parsed module.
pub fn analyze(parsed: &ParseOutput) -> Analysis {
    analyze_module(&parsed.module, &parsed.arena)
}

#[tracing::instrument(level = "debug", skip_all)]
pub fn analyze_module(module: &Module, arena: &ExprArena) -> Analysis {
    let mut analyzer = Analyzer::new(arena);
    analyzer.symbols.enter(ScopeKind::Global);
    analyzer.hoist(module);
    analyzer.check_stmts(&module.stmts);

    let Analyzer {
        symbols,
        expr_types,
        diagnostics,
        ..
    } = analyzer;
    let (errors, warnings): (Vec<_>, Vec<_>) =
        diagnostics.into_iter().partition(Diagnostic::is_error);
    tracing::debug!(
        errors = errors.len(),
        warnings = warnings.len(),
        scopes = symbols.len(),
        "analyzed"
    );
    Analysis {
        valid: errors.is_empty(),
        errors,
        warnings,
        symbols,
        expr_types,
    }
}

struct Analyzer<'a> {
    arena: &'a ExprArena,
    symbols: ScopeTree,
    expr_types: Vec<Type>,
    diagnostics: Vec<Diagnostic>,
    /// User type name to its fields, in declaration order.
    types: FxHashMap<String, Vec<(String, Type)>>,
    /// `(bound type, method name)` to the method's return type.
    methods: FxHashMap<(String, String), Type>,
}

impl<'a> Analyzer<'a> {
    fn new(arena: &'a ExprArena) -> Self {
        Analyzer {
            arena,
            symbols: ScopeTree::with_builtins(),
            expr_types: vec![Type::Unknown; arena.len()],
            diagnostics: Vec::new(),
            types: FxHashMap::default(),
            methods: FxHashMap::default(),
        }
    }

    fn error(&mut self, code: ErrorCode, span: Span, message: String, label: &str) {
        self.diagnostics.push(
            Diagnostic::error(code)
                .with_message(message)
                .with_label(span, label),
        );
    }

    fn warning(&mut self, code: ErrorCode, span: Span, message: String) {
        self.diagnostics.push(
            Diagnostic::warning(code)
                .with_message(message)
                .with_label(span, "here"),
        );
    }

    /// Declare in the current scope, reporting a same-scope clash.
    fn declare(&mut self, symbol: Symbol, span: Span) {
        let name = symbol.name.clone();
        if let Err(previous) = self.symbols.declare(symbol) {
            let mut diag = Diagnostic::error(ErrorCode::DuplicateDeclaration)
                .with_message(format!("`{name}` is already declared in this scope"))
                .with_label(span, "redeclared here");
            if previous != Span::DUMMY {
                diag = diag.with_secondary_label(previous, "first declared here");
            }
            self.diagnostics.push(diag);
        }
    }

    /// Make module-level functions, types and imports visible before the
    /// statements that use them.
    fn hoist(&mut self, module: &Module) {
        for stmt in &module.stmts {
            match &stmt.kind {
                StmtKind::Function(func) => {
                    let ty = Type::Function {
                        params: vec![Type::Unknown; func.params.len()],
                        ret: Box::new(Type::Unknown),
                    };
                    self.declare(Symbol::function(&func.name, ty, func.name_span), func.name_span);
                }
                StmtKind::Type(decl) => {
                    self.declare(Symbol::user_type(&decl.name, decl.name_span), decl.name_span);
                    let fields = decl
                        .fields
                        .iter()
                        .map(|f| (f.name.clone(), Type::from_annotation(&f.ty)))
                        .collect();
                    self.types.insert(decl.name.clone(), fields);
                }
                StmtKind::Import(import) => {
                    self.declare(Symbol::namespace(import.namespace(), stmt.span), stmt.span);
                }
                _ => {}
            }
        }
    }

    fn set_type(&mut self, id: ExprId, ty: Type) {
        if let Some(slot) = self.expr_types.get_mut(id.index()) {
            *slot = ty;
        }
    }

    fn type_of(&self, id: ExprId) -> Type {
        self.expr_types
            .get(id.index())
            .cloned()
            .unwrap_or(Type::Unknown)
    }

    fn field_type(&self, udt: &str, field: &str) -> Type {
        self.types
            .get(udt)
            .and_then(|fields| fields.iter().find(|(name, _)| name == field))
            .map_or(Type::Unknown, |(_, ty)| ty.clone())
    }
}

#[cfg(test)]
mod tests;
