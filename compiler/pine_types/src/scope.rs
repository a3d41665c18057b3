//! Lexical scopes and symbols.
//!
//! All scopes of a module live in one [`ScopeTree`]. Entering a scope pushes
//! a child of the current one; exiting moves back to its parent. Nothing is
//! ever removed, so after analysis the tree is the complete symbol table.

use pine_ir::Span;
use rustc_hash::FxHashMap;

use crate::{builtins, Type};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum SymbolKind {
    Variable,
    Function,
    Parameter,
    Type,
    Namespace,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Type,
    /// Fixed built-ins: price series, calendar fields, `na`, `true`, `false`.
    pub is_const: bool,
    pub is_series: bool,
    pub is_reassignable: bool,
    /// `Span::DUMMY` for built-ins.
    pub declared_at: Span,
}

impl Symbol {
    pub fn variable(name: impl Into<String>, ty: Type, declared_at: Span) -> Self {
        Symbol {
            name: name.into(),
            kind: SymbolKind::Variable,
            is_series: ty.is_series(),
            ty,
            is_const: false,
            is_reassignable: true,
            declared_at,
        }
    }

    pub fn parameter(name: impl Into<String>, ty: Type, declared_at: Span) -> Self {
        Symbol {
            kind: SymbolKind::Parameter,
            ..Symbol::variable(name, ty, declared_at)
        }
    }

    pub fn function(name: impl Into<String>, ty: Type, declared_at: Span) -> Self {
        Symbol {
            kind: SymbolKind::Function,
            is_reassignable: false,
            ..Symbol::variable(name, ty, declared_at)
        }
    }

    pub fn user_type(name: impl Into<String>, declared_at: Span) -> Self {
        let name = name.into();
        Symbol {
            kind: SymbolKind::Type,
            is_reassignable: false,
            ..Symbol::variable(name.clone(), Type::Udt(name), declared_at)
        }
    }

    pub fn namespace(name: impl Into<String>, declared_at: Span) -> Self {
        Symbol {
            kind: SymbolKind::Namespace,
            is_reassignable: false,
            ..Symbol::variable(name, Type::Unknown, declared_at)
        }
    }

    fn builtin_const(name: &str, ty: Type) -> Self {
        Symbol {
            is_const: true,
            is_reassignable: false,
            ..Symbol::variable(name, ty, Span::DUMMY)
        }
    }

    /// Record a new value type, promoting the symbol to a series when the
    /// value is one.
    pub fn set_type(&mut self, ty: Type) {
        self.is_series = self.is_series || ty.is_series();
        self.ty = ty;
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ScopeKind {
    Global,
    Function,
    Block,
    Loop,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    /// The root scope holding the built-ins.
    pub const ROOT: ScopeId = ScopeId(0);

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    symbols: FxHashMap<String, Symbol>,
}

impl Scope {
    fn new(kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        Scope {
            kind,
            parent,
            symbols: FxHashMap::default(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl Default for ScopeTree {
    fn default() -> Self {
        ScopeTree::new()
    }
}

impl ScopeTree {
    /// A tree holding only the root scope, without built-ins.
    pub fn new() -> Self {
        ScopeTree {
            scopes: vec![Scope::new(ScopeKind::Global, None)],
            current: ScopeId::ROOT,
        }
    }

    /// A tree whose root scope holds every built-in variable, constant and
    /// namespace.
    pub fn with_builtins() -> Self {
        let mut tree = ScopeTree::new();
        let root = &mut tree.scopes[0].symbols;
        let series = builtins::PRICE_SERIES
            .iter()
            .chain(builtins::DERIVED_SERIES)
            .chain(builtins::CALENDAR_SERIES);
        for &name in series {
            root.insert(
                name.to_string(),
                Symbol::builtin_const(name, builtins::series_type(name)),
            );
        }
        root.insert("na".into(), Symbol::builtin_const("na", Type::Na));
        for name in ["true", "false"] {
            root.insert(name.into(), Symbol::builtin_const(name, Type::Bool));
        }
        for &name in builtins::NAMESPACES {
            root.insert(name.to_string(), Symbol::namespace(name, Span::DUMMY));
        }
        tree
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    pub fn current_kind(&self) -> ScopeKind {
        self.get(self.current).kind
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScopeId, &Scope)> {
        self.scopes
            .iter()
            .enumerate()
            .map(|(i, s)| (ScopeId(u32::try_from(i).unwrap_or(u32::MAX)), s))
    }

    /// Push a child of the current scope and make it current.
    pub fn enter(&mut self, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(u32::try_from(self.scopes.len()).unwrap_or(u32::MAX));
        self.scopes.push(Scope::new(kind, Some(self.current)));
        self.current = id;
        id
    }

    /// Return to the parent of the current scope. The root is never left.
    pub fn exit(&mut self) {
        if let Some(parent) = self.get(self.current).parent {
            self.current = parent;
        }
    }

    /// Declare in the current scope. On a clash within this scope the
    /// existing symbol is kept and its declaration site returned.
    pub fn declare(&mut self, symbol: Symbol) -> Result<(), Span> {
        let scope = &mut self.scopes[self.current.index()];
        if let Some(existing) = scope.symbols.get(&symbol.name) {
            return Err(existing.declared_at);
        }
        scope.symbols.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    fn resolve(&self, name: &str) -> Option<ScopeId> {
        let mut id = Some(self.current);
        while let Some(scope_id) = id {
            let scope = self.get(scope_id);
            if scope.symbols.contains_key(name) {
                return Some(scope_id);
            }
            id = scope.parent;
        }
        None
    }

    /// Innermost visible symbol named `name`.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.resolve(name).and_then(|id| self.get(id).get(name))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        let id = self.resolve(name)?;
        self.scopes[id.index()].symbols.get_mut(name)
    }

    /// Look `name` up starting from `scope` rather than the current scope.
    pub fn lookup_from(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        let mut id = Some(scope);
        while let Some(scope_id) = id {
            let scope = self.get(scope_id);
            if let Some(symbol) = scope.get(name) {
                return Some(symbol);
            }
            id = scope.parent;
        }
        None
    }

    /// Whether an enclosing scope is a loop body, without crossing a
    /// function boundary.
    pub fn in_loop(&self) -> bool {
        let mut id = Some(self.current);
        while let Some(scope_id) = id {
            let scope = self.get(scope_id);
            match scope.kind {
                ScopeKind::Loop => return true,
                ScopeKind::Function => return false,
                ScopeKind::Global | ScopeKind::Block => {}
            }
            id = scope.parent;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lookup_walks_outward_and_exit_restores() {
        let mut tree = ScopeTree::with_builtins();
        tree.enter(ScopeKind::Global);
        tree.declare(Symbol::variable("x", Type::Int, Span::new(0, 1)))
            .unwrap();
        let block = tree.enter(ScopeKind::Block);
        tree.declare(Symbol::variable("x", Type::Float, Span::new(5, 6)))
            .unwrap();
        assert_eq!(tree.lookup("x").map(|s| &s.ty), Some(&Type::Float));
        assert!(tree.lookup("close").is_some_and(|s| s.is_const && s.is_series));
        tree.exit();
        assert_eq!(tree.lookup("x").map(|s| &s.ty), Some(&Type::Int));
        // The block scope survives.
        assert_eq!(tree.get(block).get("x").map(|s| &s.ty), Some(&Type::Float));
    }

    #[test]
    fn test_same_scope_redeclaration_reports_first_site() {
        let mut tree = ScopeTree::new();
        tree.declare(Symbol::variable("a", Type::Int, Span::new(0, 1)))
            .unwrap();
        let err = tree
            .declare(Symbol::variable("a", Type::Int, Span::new(9, 10)))
            .unwrap_err();
        assert_eq!(err, Span::new(0, 1));
    }

    #[test]
    fn test_in_loop_sees_through_blocks() {
        let mut tree = ScopeTree::new();
        assert!(!tree.in_loop());
        tree.enter(ScopeKind::Loop);
        tree.enter(ScopeKind::Block);
        assert!(tree.in_loop());
        tree.exit();
        tree.exit();
        assert!(!tree.in_loop());
        tree.exit();
        assert_eq!(tree.current(), ScopeId::ROOT);
    }

    #[test]
    fn test_in_loop_stops_at_function_boundary() {
        let mut tree = ScopeTree::new();
        tree.enter(ScopeKind::Loop);
        tree.enter(ScopeKind::Function);
        tree.enter(ScopeKind::Block);
        assert!(!tree.in_loop());
        tree.exit();
        tree.enter(ScopeKind::Loop);
        assert!(tree.in_loop());
    }

    #[test]
    fn test_symbol_promotion_is_sticky() {
        let mut sym = Symbol::variable("s", Type::Float, Span::DUMMY);
        assert!(!sym.is_series);
        sym.set_type(Type::series(Type::Float));
        assert!(sym.is_series);
        sym.set_type(Type::Float);
        assert!(sym.is_series);
    }
}
