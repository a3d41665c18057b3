//! Expression inference.

use pine_diagnostic::ErrorCode;
use pine_ir::{
    stack::ensure_sufficient_stack, BinaryOp, CallArg, ExprArena, ExprId, ExprKind, IfChain, Span,
    SwitchExpr, UnaryOp,
};

use super::Analyzer;
use crate::builtins::{self, Returns};
use crate::{ScopeKind, SymbolKind, Type};

/// Result type of `left op right`.
pub(super) fn binary_type(op: BinaryOp, left: &Type, right: &Type) -> Type {
    let as_series = left.is_series() || right.is_series();
    let scalar = if op.is_arithmetic() {
        match (left.scalar(), right.scalar()) {
            (Type::Str, Type::Str) if op == BinaryOp::Add => Type::Str,
            _ if op == BinaryOp::Div => Type::Float,
            (Type::Int, Type::Int) => Type::Int,
            (Type::Int | Type::Float | Type::Na, Type::Int | Type::Float | Type::Na) => Type::Float,
            _ => Type::Unknown,
        }
    } else {
        Type::Bool
    };
    Type::series_if(scalar, as_series)
}

/// Leftmost identifier of a member chain.
fn root_ident(arena: &ExprArena, id: ExprId) -> Option<&str> {
    match arena.kind(id) {
        ExprKind::Ident(name) => Some(name),
        ExprKind::Member { object, .. } => root_ident(arena, *object),
        _ => None,
    }
}

impl Analyzer<'_> {
    /// Infer and record the type of `id`.
    pub(super) fn infer(&mut self, id: ExprId) -> Type {
        let ty = ensure_sufficient_stack(|| self.infer_kind(id));
        self.set_type(id, ty.clone());
        ty
    }

    fn infer_kind(&mut self, id: ExprId) -> Type {
        let arena = self.arena;
        let span = arena.span(id);
        match arena.kind(id) {
            ExprKind::Int(_) => Type::Int,
            ExprKind::Float(_) => Type::Float,
            ExprKind::Bool(_) => Type::Bool,
            ExprKind::Str(_) => Type::Str,
            ExprKind::Color(_) => Type::Color,
            ExprKind::Na => Type::Na,
            ExprKind::Ident(name) => self.infer_ident(name, span),
            ExprKind::Member { object, field } => self.infer_member(id, *object, field),
            ExprKind::Call { callee, args } => self.infer_call(*callee, args, span),
            ExprKind::Binary { op, left, right } => {
                let left = self.infer(*left);
                let right = self.infer(*right);
                binary_type(*op, &left, &right)
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.infer(*operand);
                match op {
                    UnaryOp::Not => Type::series_if(Type::Bool, operand.is_series()),
                    UnaryOp::Neg | UnaryOp::Plus => operand,
                }
            }
            ExprKind::Ternary {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.infer(*cond);
                let then_ty = self.infer(*then_branch);
                let else_ty = self.infer(*else_branch);
                Type::series_if(then_ty.unify(&else_ty), cond.is_series())
            }
            ExprKind::History { base, offset } => {
                let base = self.infer(*base);
                self.infer(*offset);
                self.check_history_offset(*offset);
                Type::series(base.scalar().clone())
            }
            ExprKind::Tuple(items) => Type::Tuple(items.iter().map(|item| self.infer(*item)).collect()),
            ExprKind::If(chain) => self.infer_if_chain(chain),
            ExprKind::Switch(switch) => self.infer_switch(switch),
        }
    }

    fn infer_ident(&mut self, name: &str, span: Span) -> Type {
        if let Some(symbol) = self.symbols.lookup(name) {
            return symbol.ty.clone();
        }
        self.error(
            ErrorCode::UndefinedVariable,
            span,
            format!("undefined variable `{name}`"),
            "not found in this scope",
        );
        Type::Unknown
    }

    fn resolves_to_namespace(&self, name: &str) -> bool {
        self.symbols
            .lookup(name)
            .is_some_and(|s| s.kind == SymbolKind::Namespace)
    }

    fn infer_member(&mut self, id: ExprId, object: ExprId, field: &str) -> Type {
        let arena = self.arena;
        if root_ident(arena, object).is_some_and(|root| self.resolves_to_namespace(root)) {
            return arena
                .path(id)
                .map_or(Type::Unknown, |path| builtins::member_type(&path));
        }
        let object = self.infer(object);
        match object.scalar() {
            Type::Udt(name) => Type::series_if(self.field_type(name, field), object.is_series()),
            _ => Type::Unknown,
        }
    }

    fn infer_call(&mut self, callee: ExprId, args: &[CallArg], span: Span) -> Type {
        let arg_types: Vec<Type> = args.iter().map(|arg| self.infer(arg.value)).collect();
        let arena = self.arena;

        match arena.kind(callee) {
            ExprKind::Ident(name) => {
                let user_fn = self.symbols.lookup(name).and_then(|s| match &s.ty {
                    Type::Function { ret, .. } if s.kind == SymbolKind::Function => {
                        Some((**ret).clone())
                    }
                    _ => None,
                });
                match user_fn {
                    Some(ret) => ret,
                    None => self.builtin_call(name, &arg_types, span),
                }
            }
            ExprKind::Member { object, field } => {
                let root = root_ident(arena, *object);
                let root_kind = root.and_then(|r| self.symbols.lookup(r)).map(|s| s.kind);
                match root_kind {
                    Some(SymbolKind::Namespace) => arena
                        .path(callee)
                        .map_or(Type::Unknown, |path| self.builtin_call(&path, &arg_types, span)),
                    Some(SymbolKind::Type) if field == "new" => {
                        root.map_or(Type::Unknown, |name| Type::Udt(name.to_string()))
                    }
                    _ => self.infer_method_call(*object, field, arg_types, span),
                }
            }
            _ => {
                self.infer(callee);
                Type::Unknown
            }
        }
    }

    /// `receiver.name(args)`: a user method or an array function called
    /// method-style.
    fn infer_method_call(
        &mut self,
        receiver: ExprId,
        name: &str,
        args: Vec<Type>,
        span: Span,
    ) -> Type {
        let receiver = self.infer(receiver);
        match receiver.scalar() {
            Type::Udt(ty) => self
                .methods
                .get(&(ty.clone(), name.to_string()))
                .cloned()
                .unwrap_or(Type::Unknown),
            Type::Array(_) => {
                let mut all = Vec::with_capacity(args.len() + 1);
                all.push(receiver.clone());
                all.extend(args);
                self.builtin_call(&format!("array.{name}"), &all, span)
            }
            _ => Type::Unknown,
        }
    }

    /// Arity check and return type of a cataloged built-in. Unknown callees
    /// are tolerated.
    fn builtin_call(&mut self, path: &str, args: &[Type], span: Span) -> Type {
        let Some(function) = builtins::lookup(path) else {
            return Type::Unknown;
        };
        if !function.accepts(args.len()) {
            let expected = if function.optional == 0 {
                function.required.to_string()
            } else {
                format!("{} to {}", function.required, function.max_args())
            };
            self.error(
                ErrorCode::WrongArgumentCount,
                span,
                format!(
                    "`{path}` takes {expected} argument(s) but {} were supplied",
                    args.len()
                ),
                "wrong number of arguments",
            );
        }
        if function.returns == Returns::Opaque && path.starts_with("array.") {
            if let Some(Type::Array(element)) = args.first().map(Type::scalar) {
                return (**element).clone();
            }
        }
        function.returns.resolve(args)
    }

    fn check_history_offset(&mut self, offset: ExprId) {
        let arena = self.arena;
        let negative = match arena.kind(offset) {
            ExprKind::Int(n) => *n < 0,
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand,
            } => match arena.kind(*operand) {
                ExprKind::Int(n) => *n > 0,
                ExprKind::Float(f) => *f > 0.0,
                _ => false,
            },
            _ => false,
        };
        if negative {
            self.warning(
                ErrorCode::NegativeHistoryOffset,
                arena.span(offset),
                "negative history offset refers to a future bar".into(),
            );
        }
    }

    pub(super) fn infer_if_chain(&mut self, chain: &IfChain) -> Type {
        let mut series_cond = false;
        let mut result: Option<Type> = None;
        for branch in &chain.branches {
            series_cond |= self.infer(branch.cond).is_series();
            let ty = self.check_block(&branch.body, ScopeKind::Block);
            result = Some(match result {
                Some(acc) => acc.unify(&ty),
                None => ty,
            });
        }
        let else_ty = match &chain.else_block {
            Some(block) => self.check_block(block, ScopeKind::Block),
            None => Type::Na,
        };
        let ty = result.map_or_else(|| else_ty.clone(), |acc| acc.unify(&else_ty));
        Type::series_if(ty, series_cond)
    }

    fn infer_switch(&mut self, switch: &SwitchExpr) -> Type {
        let mut as_series = switch
            .subject
            .is_some_and(|subject| self.infer(subject).is_series());
        let mut result = Type::Na;
        for arm in &switch.arms {
            as_series |= self.infer(arm.pattern).is_series();
            let ty = self.check_block(&arm.body, ScopeKind::Block);
            result = result.unify(&ty);
        }
        if let Some(default) = &switch.default {
            let ty = self.check_block(default, ScopeKind::Block);
            result = result.unify(&ty);
        }
        Type::series_if(result, as_series)
    }
}
