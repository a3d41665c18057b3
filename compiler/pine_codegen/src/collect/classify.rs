//! Series classification.
//!
//! A name is a series when any value bound to it is one, and a value is a
//! series when any of its inputs is. Bindings flow across statements and
//! through function parameters, so the walk repeats until no new series
//! binding or series-returning function appears. Each pass only adds, so
//! the loop terminates.

use pine_ir::stack::ensure_sufficient_stack;
use pine_ir::{Block, CallArg, ExprArena, ExprId, ExprKind, IfChain, Module, Qualifier, StmtKind};
use pine_types::{builtins, Analysis, Type};

use super::{Binding, CallRole, Classification, InputKind, Owner, ProgramFacts, RuntimeFeatures};

pub(super) fn classify(
    facts: &mut ProgramFacts,
    module: &Module,
    arena: &ExprArena,
    analysis: &Analysis,
) {
    let seeds: Vec<Binding> = facts
        .recursive
        .iter()
        .chain(&facts.carried)
        .cloned()
        .collect();
    facts.series.extend(seeds);

    let mut table = vec![Classification::Scalar; arena.len()];
    let mut passes = 0u32;
    let masked = loop {
        passes += 1;
        let before = (facts.series.len(), facts.returns_series.len());
        let mut pass = Classifier {
            facts: &mut *facts,
            arena,
            analysis,
            table: &mut table,
            owner: Owner::Module,
            mask_depth: 0,
            masked: false,
        };
        for stmt in &module.stmts {
            pass.stmt(&stmt.kind);
        }
        let masked = pass.masked;
        if (facts.series.len(), facts.returns_series.len()) == before {
            break masked;
        }
    };
    tracing::trace!(passes, "series classification converged");

    facts.features.set(RuntimeFeatures::MASKED_IF, masked);
    facts.features.set(
        RuntimeFeatures::RECURRENCE,
        !facts.recursive.is_empty() || !facts.carried.is_empty(),
    );
    facts.classification = table;
}

struct Classifier<'f> {
    facts: &'f mut ProgramFacts,
    arena: &'f ExprArena,
    analysis: &'f Analysis,
    table: &'f mut Vec<Classification>,
    owner: Owner,
    /// Number of enclosing `if` branches under a series condition.
    mask_depth: u32,
    masked: bool,
}

impl Classifier<'_> {
    fn mark(&mut self, name: &str) {
        let binding = self.facts.resolve(&self.owner, name);
        self.facts.series.insert(binding);
    }

    fn in_owner<R>(&mut self, owner: Owner, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = std::mem::replace(&mut self.owner, owner);
        let result = f(self);
        self.owner = saved;
        result
    }

    fn stmt(&mut self, kind: &StmtKind) {
        match kind {
            StmtKind::VarDecl(decl) => {
                let series = self.expr(decl.value) || decl.qualifier == Some(Qualifier::Series);
                if series {
                    self.mark(&decl.name);
                }
            }
            StmtKind::Reassign(re) => {
                self.expr(re.target);
                let series = self.expr(re.value);
                if let Some(name) = self.arena.ident(re.target) {
                    if series || self.mask_depth > 0 {
                        self.mark(name);
                    }
                }
            }
            StmtKind::TupleDestructure(td) => {
                if self.expr(td.value) {
                    for (name, _) in &td.names {
                        self.mark(name);
                    }
                }
            }
            StmtKind::If(chain) => {
                self.if_chain(chain);
            }
            StmtKind::For(f) => {
                self.expr(f.from);
                self.expr(f.to);
                if let Some(step) = f.step {
                    self.expr(step);
                }
                self.block(&f.body);
            }
            StmtKind::ForIn(f) => {
                self.expr(f.iterable);
                self.block(&f.body);
            }
            StmtKind::While(w) => {
                self.expr(w.cond);
                self.block(&w.body);
            }
            StmtKind::Expr(id) => {
                self.expr(*id);
            }
            StmtKind::Function(func) => {
                let key = func.name.clone();
                let tail = self.in_owner(Owner::Function(key.clone()), |this| {
                    for param in &func.params {
                        if let Some(default) = param.default {
                            this.expr(default);
                        }
                    }
                    this.block(&func.body)
                });
                if tail {
                    self.facts.returns_series.insert(key);
                }
            }
            StmtKind::Method(method) => {
                let key = format!("{}.{}", method.bound_type, method.name);
                let tail = self.in_owner(Owner::Function(key.clone()), |this| {
                    for param in &method.params {
                        if let Some(default) = param.default {
                            this.expr(default);
                        }
                    }
                    this.block(&method.body)
                });
                if tail {
                    self.facts.returns_series.insert(key);
                }
            }
            StmtKind::Type(ty) => {
                for field in &ty.fields {
                    if let Some(default) = field.default {
                        self.expr(default);
                    }
                }
            }
            StmtKind::Declaration(decl) => {
                self.args(&decl.args);
            }
            StmtKind::Break | StmtKind::Continue | StmtKind::Import(_) => {}
        }
    }

    /// Classify a block; returns whether its value is a series.
    fn block(&mut self, block: &Block) -> bool {
        for stmt in &block.stmts {
            self.stmt(&stmt.kind);
        }
        block
            .tail_expr()
            .is_some_and(|tail| self.table[tail.index()].is_series())
    }

    /// Branches from the first series condition on are masked.
    fn if_chain(&mut self, chain: &IfChain) -> bool {
        let mut masked = false;
        let mut series = false;
        for branch in &chain.branches {
            let cond = self.expr(branch.cond);
            masked |= cond;
            series |= cond;
            series |= self.masked_block(&branch.body, masked);
        }
        if let Some(else_block) = &chain.else_block {
            series |= self.masked_block(else_block, masked);
        }
        self.masked |= masked;
        series
    }

    fn masked_block(&mut self, block: &Block, masked: bool) -> bool {
        if masked {
            self.mask_depth += 1;
        }
        let series = self.block(block);
        if masked {
            self.mask_depth -= 1;
        }
        series
    }

    fn args(&mut self, args: &[CallArg]) -> Vec<bool> {
        args.iter().map(|arg| self.expr(arg.value)).collect()
    }

    fn expr(&mut self, id: ExprId) -> bool {
        let series = ensure_sufficient_stack(|| self.classify_expr(id));
        self.table[id.index()] = Classification::of(series);
        series
    }

    fn classify_expr(&mut self, id: ExprId) -> bool {
        match self.arena.kind(id) {
            ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::Bool(_)
            | ExprKind::Str(_)
            | ExprKind::Color(_)
            | ExprKind::Na => false,
            ExprKind::Ident(name) => self.ident(name),
            ExprKind::Member { object, .. } => {
                if self.namespace_of(*object).is_some() {
                    self.arena
                        .path(id)
                        .is_some_and(|path| builtins::member_type(&path).is_series())
                } else {
                    self.expr(*object)
                }
            }
            ExprKind::Call { callee, args } => {
                let arg_series = self.args(args);
                self.call(id, *callee, args, &arg_series)
            }
            ExprKind::Binary { left, right, .. } => {
                let left = self.expr(*left);
                let right = self.expr(*right);
                left || right
            }
            ExprKind::Unary { operand, .. } => self.expr(*operand),
            ExprKind::Ternary {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.expr(*cond);
                let then_branch = self.expr(*then_branch);
                let else_branch = self.expr(*else_branch);
                cond || then_branch || else_branch
            }
            ExprKind::History { base, offset } => {
                self.expr(*base);
                self.expr(*offset);
                true
            }
            ExprKind::Tuple(items) => items
                .iter()
                .fold(false, |any, item| self.expr(*item) || any),
            ExprKind::If(chain) => self.if_chain(chain),
            ExprKind::Switch(switch) => {
                let mut masked = switch.subject.is_some_and(|subject| self.expr(subject));
                for arm in &switch.arms {
                    masked |= self.expr(arm.pattern);
                }
                self.masked |= masked;
                let mut series = masked;
                for arm in &switch.arms {
                    series |= self.masked_block(&arm.body, masked);
                }
                if let Some(default) = &switch.default {
                    series |= self.masked_block(default, masked);
                }
                series
            }
        }
    }

    fn ident(&self, name: &str) -> bool {
        let binding = self.facts.resolve(&self.owner, name);
        if self.facts.is_series(&binding) {
            return true;
        }
        binding.owner == Owner::Module
            && !self.facts.declares_at_module(name)
            && builtins::is_builtin_series(name)
    }

    /// The built-in namespace an expression names, unless a user name
    /// shadows it.
    fn namespace_of(&self, id: ExprId) -> Option<&str> {
        let name = self.arena.ident(id)?;
        self.facts.is_namespace(&self.owner, name).then_some(name)
    }

    fn call(&mut self, id: ExprId, callee: ExprId, args: &[CallArg], arg_series: &[bool]) -> bool {
        let any = arg_series.iter().any(|s| *s);
        if let Some(role) = self.facts.call_role(id) {
            return match role {
                CallRole::Input(index) => self
                    .facts
                    .inputs
                    .get(index)
                    .is_some_and(|input| input.kind == InputKind::Source),
                CallRole::Plot(_) | CallRole::Hline(_) | CallRole::Fill | CallRole::Unsupported => {
                    false
                }
            };
        }

        match self.arena.kind(callee) {
            ExprKind::Ident(name) => {
                if let Some(params) = self.facts.function(name).map(|f| f.params.clone()) {
                    self.bind_params(name, &params, args, arg_series);
                    any || self.facts.returns_series(name)
                } else {
                    builtins::lookup(name).map_or(any, |b| b.returns.is_series(any))
                }
            }
            ExprKind::Member { object, field } => {
                if self.namespace_of(*object).is_some() {
                    return self
                        .arena
                        .path(callee)
                        .and_then(|path| builtins::lookup(&path))
                        .map_or(any, |b| b.returns.is_series(any));
                }
                if let Some(namespace) = self.arena.ident(*object) {
                    let is_type = field == "new" && self.facts.user_type(namespace).is_some();
                    if is_type || self.facts.import(namespace).is_some() {
                        return any;
                    }
                }
                let receiver = self.expr(*object);
                self.method_call(*object, field, receiver, args, arg_series)
            }
            _ => self.expr(callee) || any,
        }
    }

    fn method_call(
        &mut self,
        receiver_id: ExprId,
        name: &str,
        receiver: bool,
        args: &[CallArg],
        arg_series: &[bool],
    ) -> bool {
        let any = receiver || arg_series.iter().any(|s| *s);
        let receiver_ty = self.analysis.expr_type(receiver_id).scalar().clone();
        let method = match &receiver_ty {
            Type::Udt(type_name) => self.facts.method(type_name, name),
            Type::Array(_) => None,
            _ => self.facts.unique_method(name),
        }
        .cloned();

        if let Some(method) = method {
            let key = method.owner_key();
            if receiver {
                self.facts
                    .series
                    .insert(Binding::local(key.as_str(), method.self_name.as_str()));
            }
            self.bind_params(&key, &method.params, args, arg_series);
            return any || self.facts.returns_series(&key);
        }
        if matches!(receiver_ty, Type::Array(_)) {
            return builtins::lookup(&format!("array.{name}"))
                .map_or(any, |b| b.returns.is_series(any));
        }
        any
    }

    /// Mark the parameters of `key` that receive a series argument.
    fn bind_params(&mut self, key: &str, params: &[String], args: &[CallArg], arg_series: &[bool]) {
        let mut positional = params.iter();
        for (arg, &series) in args.iter().zip(arg_series) {
            let param = match &arg.name {
                Some(name) => params.iter().find(|p| *p == name),
                None => positional.next(),
            };
            if let (Some(param), true) = (param, series) {
                self.facts
                    .series
                    .insert(Binding::local(key, param.as_str()));
            }
        }
    }
}
