//! Statements and scopes.

use pine_diagnostic::ErrorCode;
use pine_ir::{
    Block, DeclarationKind, ExprKind, FunctionDecl, MethodDecl, Param, Qualifier, Reassign, Stmt,
    StmtKind, TupleDestructure, TypeAnnotation, TypeDecl, VarDecl,
};

use super::{expr::binary_type, Analyzer};
use crate::{ScopeKind, Symbol, SymbolKind, Type};

impl Analyzer<'_> {
    /// Check a statement list, warning once about anything that follows a
    /// `break` or `continue`.
    pub(super) fn check_stmts(&mut self, stmts: &[Stmt]) {
        let mut terminated = false;
        let mut warned = false;
        for stmt in stmts {
            if terminated && !warned {
                self.warning(
                    ErrorCode::UnreachableCode,
                    stmt.span,
                    "unreachable statement".into(),
                );
                warned = true;
            }
            self.check_stmt(stmt);
            terminated |= matches!(stmt.kind, StmtKind::Break | StmtKind::Continue);
        }
    }

    /// Check `block` in a fresh scope of `kind` and return its value type.
    pub(super) fn check_block(&mut self, block: &Block, kind: ScopeKind) -> Type {
        self.symbols.enter(kind);
        self.check_stmts(&block.stmts);
        let ty = self.block_value(block);
        self.symbols.exit();
        ty
    }

    fn block_value(&self, block: &Block) -> Type {
        block.tail_expr().map_or(Type::Void, |id| self.type_of(id))
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::VarDecl(decl) => self.check_var_decl(decl),
            StmtKind::Reassign(re) => self.check_reassign(re),
            StmtKind::TupleDestructure(td) => self.check_destructure(td),
            StmtKind::If(chain) => {
                self.infer_if_chain(chain);
            }
            StmtKind::For(f) => {
                let bounds = [Some(f.from), Some(f.to), f.step];
                let mut counter = Type::Int;
                for id in bounds.into_iter().flatten() {
                    if matches!(self.infer(id).scalar(), Type::Float) {
                        counter = Type::Float;
                    }
                }
                self.symbols.enter(ScopeKind::Loop);
                self.declare(Symbol::variable(&f.var, counter, f.var_span), f.var_span);
                self.check_stmts(&f.body.stmts);
                self.symbols.exit();
            }
            StmtKind::ForIn(f) => {
                let element = match self.infer(f.iterable).scalar() {
                    Type::Array(inner) => (**inner).clone(),
                    _ => Type::Unknown,
                };
                self.symbols.enter(ScopeKind::Loop);
                if let Some((index, span)) = &f.index {
                    self.declare(Symbol::variable(index, Type::Int, *span), *span);
                }
                let (item, span) = &f.item;
                self.declare(Symbol::variable(item, element, *span), *span);
                self.check_stmts(&f.body.stmts);
                self.symbols.exit();
            }
            StmtKind::While(w) => {
                self.infer(w.cond);
                self.check_block(&w.body, ScopeKind::Loop);
            }
            StmtKind::Break => {
                if !self.symbols.in_loop() {
                    self.error(
                        ErrorCode::BreakOutsideLoop,
                        stmt.span,
                        "`break` outside of a loop".into(),
                        "cannot break here",
                    );
                }
            }
            StmtKind::Continue => {
                if !self.symbols.in_loop() {
                    self.error(
                        ErrorCode::ContinueOutsideLoop,
                        stmt.span,
                        "`continue` outside of a loop".into(),
                        "cannot continue here",
                    );
                }
            }
            StmtKind::Expr(id) => {
                self.infer(*id);
            }
            StmtKind::Function(func) => self.check_function(func),
            StmtKind::Method(method) => self.check_method(method),
            StmtKind::Type(decl) => self.check_type_decl(decl),
            StmtKind::Import(import) => {
                // Module-level imports are hoisted.
                if self.symbols.lookup(import.namespace()).is_none() {
                    self.declare(Symbol::namespace(import.namespace(), stmt.span), stmt.span);
                }
            }
            StmtKind::Declaration(decl) => {
                for arg in &decl.args {
                    self.infer(arg.value);
                }
                if decl.kind == DeclarationKind::Study {
                    self.warning(
                        ErrorCode::DeprecatedDeclaration,
                        stmt.span,
                        "`study` is deprecated; use `indicator`".into(),
                    );
                }
            }
        }
    }

    fn check_var_decl(&mut self, decl: &VarDecl) {
        let value = self.infer(decl.value);
        let ty = match &decl.ty {
            Some(annotation) => {
                let declared = Type::from_annotation(annotation);
                if !value.is_assignable_to(&declared) {
                    self.error(
                        ErrorCode::TypeMismatch,
                        self.arena.span(decl.value),
                        format!(
                            "cannot assign a value of type `{value}` to `{}` declared as `{declared}`",
                            decl.name
                        ),
                        "mismatched type",
                    );
                }
                let as_series = value.is_series() || decl.qualifier == Some(Qualifier::Series);
                Type::series_if(declared, as_series)
            }
            None => value,
        };
        self.declare(Symbol::variable(&decl.name, ty, decl.name_span), decl.name_span);
    }

    fn check_reassign(&mut self, re: &Reassign) {
        let value = self.infer(re.value);
        let arena = self.arena;
        let ExprKind::Ident(name) = arena.kind(re.target) else {
            self.infer(re.target);
            return;
        };
        let span = arena.span(re.target);

        let Some(symbol) = self.symbols.lookup(name) else {
            self.error(
                ErrorCode::UndefinedVariable,
                span,
                format!("cannot reassign undeclared variable `{name}`"),
                "declare it with `=` first",
            );
            return;
        };
        if symbol.is_const {
            self.error(
                ErrorCode::ConstReassignment,
                span,
                format!("cannot reassign built-in `{name}`"),
                "built-in value",
            );
            return;
        }

        let current = symbol.ty.clone();
        let assigned = match re.op.binary_op() {
            Some(op) => binary_type(op, &current, &value),
            None => value,
        };
        let merged = current.unify(&assigned);
        self.set_type(re.target, merged.clone());
        if let Some(symbol) = self.symbols.lookup_mut(name) {
            symbol.set_type(merged);
        }
    }

    fn check_destructure(&mut self, td: &TupleDestructure) {
        let value = self.infer(td.value);
        let elements = match value.scalar() {
            Type::Tuple(items) => {
                if items.len() != td.names.len() {
                    self.error(
                        ErrorCode::TypeMismatch,
                        self.arena.span(td.value),
                        format!(
                            "cannot destructure a tuple of {} values into {} names",
                            items.len(),
                            td.names.len()
                        ),
                        "tuple size differs",
                    );
                }
                items.clone()
            }
            _ => Vec::new(),
        };
        for (i, (name, span)) in td.names.iter().enumerate() {
            let ty = elements.get(i).cloned().unwrap_or(Type::Unknown);
            self.declare(Symbol::variable(name, ty, *span), *span);
        }
    }

    /// Declare parameters in the current (function) scope. Defaults are
    /// inferred by the caller beforehand, in the enclosing scope.
    fn declare_params(&mut self, params: &[Param], defaults: &[Type]) -> Vec<Type> {
        params
            .iter()
            .zip(defaults)
            .map(|(param, default)| {
                let ty = param
                    .ty
                    .as_ref()
                    .map_or_else(|| default.clone(), Type::from_annotation);
                self.declare(Symbol::parameter(&param.name, ty.clone(), param.span), param.span);
                ty
            })
            .collect()
    }

    fn infer_defaults(&mut self, params: &[Param]) -> Vec<Type> {
        params
            .iter()
            .map(|p| p.default.map_or(Type::Unknown, |id| self.infer(id)))
            .collect()
    }

    fn check_function(&mut self, func: &FunctionDecl) {
        // Module-level functions are hoisted.
        if self.symbols.current_kind() != ScopeKind::Global {
            let placeholder = Type::Function {
                params: vec![Type::Unknown; func.params.len()],
                ret: Box::new(Type::Unknown),
            };
            self.declare(Symbol::function(&func.name, placeholder, func.name_span), func.name_span);
        }

        let defaults = self.infer_defaults(&func.params);
        self.symbols.enter(ScopeKind::Function);
        let params = self.declare_params(&func.params, &defaults);
        self.check_stmts(&func.body.stmts);
        let ret = self.block_value(&func.body);
        self.symbols.exit();

        if let Some(symbol) = self.symbols.lookup_mut(&func.name) {
            if symbol.kind == SymbolKind::Function {
                symbol.ty = Type::Function {
                    params,
                    ret: Box::new(ret),
                };
            }
        }
    }

    fn check_method(&mut self, method: &MethodDecl) {
        let defaults = self.infer_defaults(&method.params);
        self.symbols.enter(ScopeKind::Function);
        let receiver = Type::from_annotation(&TypeAnnotation::simple(
            method.bound_type.clone(),
            method.name_span,
        ));
        self.declare(
            Symbol::parameter(&method.self_name, receiver, method.name_span),
            method.name_span,
        );
        self.declare_params(&method.params, &defaults);
        self.check_stmts(&method.body.stmts);
        let ret = self.block_value(&method.body);
        self.symbols.exit();
        self.methods
            .insert((method.bound_type.clone(), method.name.clone()), ret);
    }

    fn check_type_decl(&mut self, decl: &TypeDecl) {
        if !self.types.contains_key(&decl.name) {
            self.declare(Symbol::user_type(&decl.name, decl.name_span), decl.name_span);
            let fields = decl
                .fields
                .iter()
                .map(|f| (f.name.clone(), Type::from_annotation(&f.ty)))
                .collect();
            self.types.insert(decl.name.clone(), fields);
        }
        for field in &decl.fields {
            let Some(default) = field.default else {
                continue;
            };
            let value = self.infer(default);
            let declared = Type::from_annotation(&field.ty);
            if !value.is_assignable_to(&declared) {
                self.error(
                    ErrorCode::TypeMismatch,
                    self.arena.span(default),
                    format!(
                        "default of field `{}` has type `{value}`, expected `{declared}`",
                        field.name
                    ),
                    "mismatched type",
                );
            }
        }
    }
}
