//! Statement nodes.

use crate::{AssignOp, CallArg, ExprId, IfChain, Span};

/// A sequence of statements.
///
/// The value of a block used as an expression (function bodies, `if` and
/// `switch` branches) is the value of its last expression statement.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>, span: Span) -> Self {
        Block { stmts, span }
    }

    /// The trailing expression, if the last statement is one.
    pub fn tail_expr(&self) -> Option<ExprId> {
        match self.stmts.last().map(|s| &s.kind) {
            Some(StmtKind::Expr(id)) => Some(*id),
            _ => None,
        }
    }

    /// Whether the block is exactly one expression statement.
    pub fn single_expr(&self) -> Option<ExprId> {
        if self.stmts.len() == 1 {
            self.tail_expr()
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    /// `x = ...`, `var x = ...`, `float x = ...`
    VarDecl(VarDecl),
    /// `x := ...`, `x += ...`, `p.x := ...`
    Reassign(Reassign),
    /// `[a, b] = f()`
    TupleDestructure(TupleDestructure),
    If(IfChain),
    For(ForLoop),
    ForIn(ForInLoop),
    While(WhileLoop),
    Break,
    Continue,
    Expr(ExprId),
    Function(FunctionDecl),
    Type(TypeDecl),
    Method(MethodDecl),
    Import(ImportDecl),
    Declaration(Declaration),
}

/// Whether a declaration keeps its value across bars.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Persistence {
    /// Re-evaluated on every bar.
    #[default]
    Bar,
    /// `var`: initialised once, then carried forward.
    Var,
    /// `varip`: like `var`, also across intrabar updates.
    Varip,
}

impl Persistence {
    pub fn is_persistent(self) -> bool {
        !matches!(self, Persistence::Bar)
    }
}

/// Type qualifiers accepted before a declaration.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Qualifier {
    Const,
    Input,
    Simple,
    Series,
}

impl Qualifier {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "const" => Some(Qualifier::Const),
            "input" => Some(Qualifier::Input),
            "simple" => Some(Qualifier::Simple),
            "series" => Some(Qualifier::Series),
            _ => None,
        }
    }
}

/// Written type: `float`, `array<float>`, `float[]` (stored as `array<float>`),
/// `map<string, int>`, or a user type name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeAnnotation {
    pub name: String,
    pub args: Vec<TypeAnnotation>,
    pub span: Span,
}

impl TypeAnnotation {
    pub fn simple(name: impl Into<String>, span: Span) -> Self {
        TypeAnnotation {
            name: name.into(),
            args: Vec::new(),
            span,
        }
    }
}

impl std::fmt::Display for TypeAnnotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub name_span: Span,
    pub persistence: Persistence,
    pub qualifier: Option<Qualifier>,
    pub ty: Option<TypeAnnotation>,
    pub value: ExprId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Reassign {
    /// An identifier or a member access.
    pub target: ExprId,
    pub op: AssignOp,
    pub value: ExprId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TupleDestructure {
    pub names: Vec<(String, Span)>,
    pub value: ExprId,
}

/// `for var = from to to [by step]`, bounds inclusive.
#[derive(Clone, Debug, PartialEq)]
pub struct ForLoop {
    pub var: String,
    pub var_span: Span,
    pub from: ExprId,
    pub to: ExprId,
    pub step: Option<ExprId>,
    pub body: Block,
}

/// `for item in xs` / `for [index, item] in xs`
#[derive(Clone, Debug, PartialEq)]
pub struct ForInLoop {
    pub index: Option<(String, Span)>,
    pub item: (String, Span),
    pub iterable: ExprId,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WhileLoop {
    pub cond: ExprId,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeAnnotation>,
    pub default: Option<ExprId>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub name_span: Span,
    pub params: Vec<Param>,
    pub body: Block,
    pub exported: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeAnnotation,
    pub default: Option<ExprId>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypeDecl {
    pub name: String,
    pub name_span: Span,
    pub fields: Vec<FieldDecl>,
    pub exported: bool,
}

/// `method name(Type self, params) => body`
#[derive(Clone, Debug, PartialEq)]
pub struct MethodDecl {
    pub name: String,
    pub name_span: Span,
    pub bound_type: String,
    pub self_name: String,
    pub params: Vec<Param>,
    pub body: Block,
    pub exported: bool,
}

/// `import owner/library/version [as alias]`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportDecl {
    pub owner: String,
    pub library: String,
    pub version: u32,
    pub alias: Option<String>,
}

impl ImportDecl {
    /// Namespace the library's exports are reached through.
    pub fn namespace(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.library)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DeclarationKind {
    Indicator,
    Library,
    Strategy,
    /// Older spelling of `indicator`.
    Study,
}

impl DeclarationKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "indicator" => Some(DeclarationKind::Indicator),
            "library" => Some(DeclarationKind::Library),
            "strategy" => Some(DeclarationKind::Strategy),
            "study" => Some(DeclarationKind::Study),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeclarationKind::Indicator => "indicator",
            DeclarationKind::Library => "library",
            DeclarationKind::Strategy => "strategy",
            DeclarationKind::Study => "study",
        }
    }
}

/// Script header: `indicator("Title", overlay = true)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub args: Vec<CallArg>,
}

/// A parsed source file.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Module {
    pub stmts: Vec<Stmt>,
}

impl Module {
    pub fn declaration(&self) -> Option<&Declaration> {
        self.stmts.iter().find_map(|s| match &s.kind {
            StmtKind::Declaration(d) => Some(d),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExprArena, ExprKind};

    #[test]
    fn test_block_tail_expr() {
        let mut arena = ExprArena::new();
        let one = arena.alloc(ExprKind::Int(1), Span::new(0, 1));
        let block = Block::new(vec![Stmt::new(StmtKind::Expr(one), Span::new(0, 1))], Span::new(0, 1));
        assert_eq!(block.tail_expr(), Some(one));
        assert_eq!(block.single_expr(), Some(one));

        let block = Block::new(
            vec![
                Stmt::new(StmtKind::Expr(one), Span::new(0, 1)),
                Stmt::new(StmtKind::Break, Span::new(2, 7)),
            ],
            Span::new(0, 7),
        );
        assert_eq!(block.tail_expr(), None);
    }

    #[test]
    fn test_type_annotation_display() {
        let ty = TypeAnnotation {
            name: "map".into(),
            args: vec![
                TypeAnnotation::simple("string", Span::DUMMY),
                TypeAnnotation::simple("float", Span::DUMMY),
            ],
            span: Span::DUMMY,
        };
        assert_eq!(ty.to_string(), "map<string, float>");
    }

    #[test]
    fn test_import_namespace_prefers_alias() {
        let mut import = ImportDecl {
            owner: "acme".into(),
            library: "utils".into(),
            version: 2,
            alias: None,
        };
        assert_eq!(import.namespace(), "utils");
        import.alias = Some("u".into());
        assert_eq!(import.namespace(), "u");
    }
}
