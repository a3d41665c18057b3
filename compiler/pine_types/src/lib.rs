//! Type system and semantic analysis for the pine compiler.
//!
//! - [`Type`]: the closed set of value types and the assignability relation
//! - [`builtins`]: built-in variables, namespaces and the function catalog
//! - [`ScopeTree`]: lexical scopes and the symbols declared in them
//! - [`analyze`]: the semantic pass (name resolution, scope rules, arity
//!   checks, type inference)

pub mod builtins;
mod analyzer;
mod scope;
mod ty;

pub use analyzer::{analyze, analyze_module, Analysis};
pub use scope::{Scope, ScopeId, ScopeKind, ScopeTree, Symbol, SymbolKind};
pub use ty::Type;
