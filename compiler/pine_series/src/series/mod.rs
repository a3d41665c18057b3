//! Lazy, cached per-bar series.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::{from_bool, truthy, Bar, BarField, BarSource};

/// Computes the value of one bar, given every bar of the source.
type Extractor = Arc<dyn Fn(&[Bar], usize) -> f64 + Send + Sync>;

enum Kind {
    Lazy(Extractor),
    /// Values frozen at materialization; never recomputed.
    Materialized(Arc<[f64]>),
}

struct Cache {
    version: u64,
    values: Arc<[f64]>,
}

struct SeriesInner {
    source: BarSource,
    kind: Kind,
    cache: Mutex<Option<Cache>>,
    computations: AtomicU64,
}

/// A per-bar value sequence over a [`BarSource`].
///
/// Cloning is cheap and shares the cache.
#[derive(Clone)]
pub struct Series {
    inner: Arc<SeriesInner>,
}

/// Right-hand side of a series operation.
#[derive(Clone, Debug)]
pub enum Operand {
    Series(Series),
    Value(f64),
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Value(value)
    }
}

impl From<Series> for Operand {
    fn from(series: Series) -> Self {
        Operand::Series(series)
    }
}

impl From<&Series> for Operand {
    fn from(series: &Series) -> Self {
        Operand::Series(series.clone())
    }
}

impl Operand {
    fn extractor(&self) -> Extractor {
        match self {
            Operand::Series(series) => series.extractor(),
            Operand::Value(value) => {
                let value = *value;
                Arc::new(move |_, _| value)
            }
        }
    }
}

/// One plotted value, as handed to a charting layer.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct PlotPoint {
    pub time: i64,
    pub value: f64,
}

#[allow(clippy::should_implement_trait)]
impl Series {
    fn with_kind(source: &BarSource, kind: Kind) -> Self {
        Series {
            inner: Arc::new(SeriesInner {
                source: source.clone(),
                kind,
                cache: Mutex::new(None),
                computations: AtomicU64::new(0),
            }),
        }
    }

    /// A series computed by `f(bars, i)` for each bar index `i`.
    pub fn from_fn<F>(source: &BarSource, f: F) -> Self
    where
        F: Fn(&[Bar], usize) -> f64 + Send + Sync + 'static,
    {
        Series::with_kind(source, Kind::Lazy(Arc::new(f)))
    }

    pub fn field(source: &BarSource, field: BarField) -> Self {
        Series::from_fn(source, move |bars, i| field.extract(&bars[i]))
    }

    pub fn constant(source: &BarSource, value: f64) -> Self {
        Series::from_fn(source, move |_, _| value)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn bar_index(source: &BarSource) -> Self {
        Series::from_fn(source, |_, i| i as f64)
    }

    /// A materialized series holding `values` as given.
    pub fn from_values(source: &BarSource, values: Vec<f64>) -> Self {
        Series::with_kind(source, Kind::Materialized(values.into()))
    }

    pub fn source(&self) -> &BarSource {
        &self.inner.source
    }

    pub fn is_materialized(&self) -> bool {
        matches!(self.inner.kind, Kind::Materialized(_))
    }

    /// How many times the values have been computed.
    pub fn computations(&self) -> u64 {
        self.inner.computations.load(Ordering::Relaxed)
    }

    /// Every value, one per bar.
    ///
    /// Computed on first read and cached against the source version; later
    /// reads recompute only after the source changed.
    pub fn values(&self) -> Arc<[f64]> {
        let inner = &*self.inner;
        let extract = match &inner.kind {
            Kind::Materialized(values) => return Arc::clone(values),
            Kind::Lazy(extract) => extract,
        };

        // The snapshot pairs a version with its bars, and the source lock is
        // released before any extractor runs. Extractors may read other
        // series on the same source while a writer is waiting.
        let state = inner.source.current();
        let mut cache = inner.cache.lock();
        if let Some(cached) = cache.as_ref() {
            if cached.version == state.version {
                return Arc::clone(&cached.values);
            }
        }

        tracing::trace!(version = state.version, len = state.bars.len(), "computing series");
        let values: Arc<[f64]> = (0..state.bars.len())
            .map(|i| extract(state.bars.as_slice(), i))
            .collect();
        inner.computations.fetch_add(1, Ordering::Relaxed);
        *cache = Some(Cache {
            version: state.version,
            values: Arc::clone(&values),
        });
        values
    }

    /// Value at bar `index`, `NaN` when out of range.
    pub fn get(&self, index: usize) -> f64 {
        self.values().get(index).copied().unwrap_or(f64::NAN)
    }

    /// Value on the most recent bar, `NaN` when there are no bars.
    pub fn last(&self) -> f64 {
        self.values().last().copied().unwrap_or(f64::NAN)
    }

    pub fn len(&self) -> usize {
        self.values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Per-bar view of this series for composition. A lazy series composes
    /// its extractor directly; a materialized one reads its frozen values.
    fn extractor(&self) -> Extractor {
        match &self.inner.kind {
            Kind::Lazy(extract) => Arc::clone(extract),
            Kind::Materialized(values) => {
                let values = Arc::clone(values);
                Arc::new(move |_, i| values.get(i).copied().unwrap_or(f64::NAN))
            }
        }
    }

    fn map(&self, f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Series {
        let this = self.extractor();
        Series::from_fn(&self.inner.source, move |bars, i| f(this(bars, i)))
    }

    fn zip(
        &self,
        other: impl Into<Operand>,
        f: impl Fn(f64, f64) -> f64 + Send + Sync + 'static,
    ) -> Series {
        let left = self.extractor();
        let right = other.into().extractor();
        Series::from_fn(&self.inner.source, move |bars, i| {
            f(left(bars, i), right(bars, i))
        })
    }

    pub fn add(&self, other: impl Into<Operand>) -> Series {
        self.zip(other, |a, b| a + b)
    }

    pub fn sub(&self, other: impl Into<Operand>) -> Series {
        self.zip(other, |a, b| a - b)
    }

    pub fn mul(&self, other: impl Into<Operand>) -> Series {
        self.zip(other, |a, b| a * b)
    }

    /// Division; `NaN` where the divisor is zero.
    pub fn div(&self, other: impl Into<Operand>) -> Series {
        self.zip(other, |a, b| if b == 0.0 { f64::NAN } else { a / b })
    }

    /// Remainder; `NaN` where the divisor is zero.
    pub fn rem(&self, other: impl Into<Operand>) -> Series {
        self.zip(other, |a, b| if b == 0.0 { f64::NAN } else { a % b })
    }

    pub fn neg(&self) -> Series {
        self.map(|a| -a)
    }

    pub fn gt(&self, other: impl Into<Operand>) -> Series {
        self.zip(other, |a, b| from_bool(a > b))
    }

    pub fn lt(&self, other: impl Into<Operand>) -> Series {
        self.zip(other, |a, b| from_bool(a < b))
    }

    pub fn gte(&self, other: impl Into<Operand>) -> Series {
        self.zip(other, |a, b| from_bool(a >= b))
    }

    pub fn lte(&self, other: impl Into<Operand>) -> Series {
        self.zip(other, |a, b| from_bool(a <= b))
    }

    #[allow(clippy::float_cmp)]
    pub fn eq(&self, other: impl Into<Operand>) -> Series {
        self.zip(other, |a, b| from_bool(a == b))
    }

    /// Inequality; false when either side is `NaN`.
    #[allow(clippy::float_cmp)]
    pub fn neq(&self, other: impl Into<Operand>) -> Series {
        self.zip(other, |a, b| {
            from_bool(!a.is_nan() && !b.is_nan() && a != b)
        })
    }

    pub fn and(&self, other: impl Into<Operand>) -> Series {
        self.zip(other, |a, b| from_bool(truthy(a) && truthy(b)))
    }

    pub fn or(&self, other: impl Into<Operand>) -> Series {
        self.zip(other, |a, b| from_bool(truthy(a) || truthy(b)))
    }

    pub fn not(&self) -> Series {
        self.map(|a| from_bool(!truthy(a)))
    }

    /// The value `n` bars back; `NaN` before the first bar.
    pub fn offset(&self, n: usize) -> Series {
        let this = self.extractor();
        Series::from_fn(&self.inner.source, move |bars, i| {
            i.checked_sub(n).map_or(f64::NAN, |j| this(bars, j))
        })
    }

    /// Per bar: `then` where this series is truthy, `otherwise` elsewhere.
    pub fn iif(&self, then: impl Into<Operand>, otherwise: impl Into<Operand>) -> Series {
        let cond = self.extractor();
        let then = then.into().extractor();
        let otherwise = otherwise.into().extractor();
        Series::from_fn(&self.inner.source, move |bars, i| {
            if truthy(cond(bars, i)) {
                then(bars, i)
            } else {
                otherwise(bars, i)
            }
        })
    }

    /// `NaN` values replaced by `replacement`.
    pub fn nz(&self, replacement: impl Into<Operand>) -> Series {
        self.zip(replacement, |a, r| if a.is_nan() { r } else { a })
    }

    /// A frozen copy of the current values, detached from later source
    /// mutations.
    pub fn materialize(&self) -> Series {
        Series::from_values(&self.inner.source, self.values().to_vec())
    }

    /// Values paired with their bar times.
    pub fn to_points(&self) -> Vec<PlotPoint> {
        let values = self.values();
        let bars = self.inner.source.current();
        values
            .iter()
            .zip(bars.bars.iter())
            .map(|(&value, bar)| PlotPoint {
                time: bar.time,
                value,
            })
            .collect()
    }
}

impl fmt::Debug for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Series")
            .field("materialized", &self.is_materialized())
            .field("computations", &self.computations())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
