//! Grammar productions, split across files as `impl Parser` blocks.
//!
//! - `stmt.rs`: statement dispatch, declarations and reassignments
//! - `block.rs`: blocks, `if` chains, `switch`, loops
//! - `item.rs`: functions, methods, types, imports, script headers
//! - `ty.rs`: type annotations
//! - `expr/`: the expression precedence chain

mod block;
mod expr;
mod item;
mod stmt;
mod ty;

/// Names that start a script header such as `indicator("RSI")`.
pub(crate) const DECLARATION_NAMES: &[&str] = &["indicator", "library", "strategy", "study"];
