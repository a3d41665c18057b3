//! Series runtime.
//!
//! A [`Series`] is a lazily computed per-bar value sequence over a
//! [`BarSource`]. Composition (`add`, `gt`, `offset`, `iif`, ...) builds a
//! new series around the operands' per-bar extractors and computes
//! nothing. Reading values computes every bar once and caches the result
//! against the source version; a later read recomputes only if the source
//! was mutated since.
//!
//! Numeric faults never raise: division or modulo by zero, reads before
//! the first bar and out-of-range indices all yield `NaN`.

mod bar;
mod series;
mod source;

pub use bar::{Bar, BarField};
pub use series::{Operand, PlotPoint, Series};
pub use source::{BarSource, SeriesError};

/// `NaN` and zero are false; everything else is true.
#[inline]
pub fn truthy(value: f64) -> bool {
    !value.is_nan() && value != 0.0
}

#[inline]
pub(crate) fn from_bool(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}
