// Test code uses unwrap/expect for clarity - panics provide good test failure messages
#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end compiler tests, organized by the phase whose behavior they
//! pin down.
//!
//! - `analyze/` - scope rules, duplicates and shadowing, arity
//! - `collect/` - series classification and recurrence detection
//! - `codegen/` - generated module shape, loops, determinism
//! - `common/` - shared helpers
//!
//! ```bash
//! cargo test -p pinec --test phases
//! cargo test -p pinec --test phases codegen
//! ```

#[path = "phases/common.rs"]
mod common;

#[path = "phases/analyze.rs"]
mod analyze;

#[path = "phases/collect.rs"]
mod collect;

#[path = "phases/codegen.rs"]
mod codegen;
