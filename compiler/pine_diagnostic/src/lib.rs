//! Diagnostics for the pine compiler.
//!
//! Every problem the pipeline reports is a [`Diagnostic`] carrying:
//! - an [`ErrorCode`] (stable, upper-snake-case, searchable)
//! - a severity
//! - a message and a primary span
//! - optional secondary labels and notes
//!
//! Spans are byte ranges; [`LineOffsetTable`] turns them into the 1-based
//! line/column pairs reported to callers.

mod diagnostic;
mod error_code;
pub mod span_utils;

pub use diagnostic::{
    expected_expression, unclosed_delimiter, unexpected_token, Diagnostic, Label, Severity,
};
pub use error_code::{ErrorCode, Tier};
pub use span_utils::LineOffsetTable;
