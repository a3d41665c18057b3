//! Versioned bar storage.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::Bar;

/// Failed mutation of a [`BarSource`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SeriesError {
    #[error("bar index {index} is out of range for {len} bars")]
    OutOfRange { index: usize, len: usize },
    #[error("the bar source is empty")]
    Empty,
}

#[derive(Debug, Default)]
struct SourceState {
    bars: Arc<Vec<Bar>>,
    version: u64,
}

/// The bars of one version, readable without holding the source lock.
#[derive(Clone, Debug)]
pub(crate) struct Snapshot {
    pub(crate) version: u64,
    pub(crate) bars: Arc<Vec<Bar>>,
}

/// Shared, versioned bar array.
///
/// Clones share the same bars. Every successful mutation bumps the version,
/// which is what series caches are checked against. Mutation is meant for a
/// single writer; any number of readers may compute over a stable version.
#[derive(Clone, Debug, Default)]
pub struct BarSource {
    state: Arc<RwLock<SourceState>>,
}

impl BarSource {
    pub fn new(bars: Vec<Bar>) -> Self {
        BarSource {
            state: Arc::new(RwLock::new(SourceState {
                bars: Arc::new(bars),
                version: 0,
            })),
        }
    }

    /// Version and bars taken together under one short read lock.
    pub(crate) fn current(&self) -> Snapshot {
        let state = self.state.read();
        Snapshot {
            version: state.version,
            bars: Arc::clone(&state.bars),
        }
    }

    pub fn len(&self) -> usize {
        self.state.read().bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().bars.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.state.read().version
    }

    pub fn get(&self, index: usize) -> Option<Bar> {
        self.state.read().bars.get(index).copied()
    }

    /// Copy of the current bars.
    pub fn snapshot(&self) -> Vec<Bar> {
        self.state.read().bars.to_vec()
    }

    /// Whether both handles share the same storage.
    pub fn same_source(&self, other: &BarSource) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut Vec<Bar>) -> Result<R, SeriesError>) -> Result<R, SeriesError> {
        let mut state = self.state.write();
        // Copies the bars only while a snapshot of them is still alive.
        let result = f(Arc::make_mut(&mut state.bars))?;
        state.version += 1;
        tracing::trace!(version = state.version, len = state.bars.len(), "bar source mutated");
        Ok(result)
    }

    /// Append a bar.
    pub fn push(&self, bar: Bar) {
        // Appending cannot fail.
        let _ = self.mutate(|bars| {
            bars.push(bar);
            Ok(())
        });
    }

    pub fn remove(&self, index: usize) -> Result<Bar, SeriesError> {
        self.mutate(|bars| {
            if index < bars.len() {
                Ok(bars.remove(index))
            } else {
                Err(SeriesError::OutOfRange {
                    index,
                    len: bars.len(),
                })
            }
        })
    }

    pub fn replace_at(&self, index: usize, bar: Bar) -> Result<(), SeriesError> {
        self.mutate(|bars| {
            let len = bars.len();
            let slot = bars
                .get_mut(index)
                .ok_or(SeriesError::OutOfRange { index, len })?;
            *slot = bar;
            Ok(())
        })
    }

    /// Replace the most recent bar, e.g. on an intrabar update.
    pub fn replace_last(&self, bar: Bar) -> Result<(), SeriesError> {
        self.mutate(|bars| {
            let slot = bars.last_mut().ok_or(SeriesError::Empty)?;
            *slot = bar;
            Ok(())
        })
    }

    pub fn replace_all(&self, new_bars: Vec<Bar>) {
        let _ = self.mutate(|bars| {
            *bars = new_bars;
            Ok(())
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bar(close: f64) -> Bar {
        Bar::new(0, close, close, close, close, 0.0)
    }

    #[test]
    fn test_every_mutation_bumps_the_version() {
        let source = BarSource::new(vec![bar(1.0), bar(2.0)]);
        assert_eq!(source.version(), 0);
        source.push(bar(3.0));
        assert_eq!(source.version(), 1);
        source.replace_at(0, bar(9.0)).unwrap();
        assert_eq!(source.version(), 2);
        source.replace_last(bar(8.0)).unwrap();
        assert_eq!(source.version(), 3);
        assert_eq!(source.remove(1).unwrap(), bar(2.0));
        assert_eq!(source.version(), 4);
        source.replace_all(vec![bar(5.0)]);
        assert_eq!(source.version(), 5);
        assert_eq!(source.snapshot(), vec![bar(5.0)]);
    }

    #[test]
    fn test_failed_mutations_leave_the_version() {
        let source = BarSource::default();
        assert_eq!(source.replace_last(bar(1.0)), Err(SeriesError::Empty));
        assert_eq!(
            source.remove(3),
            Err(SeriesError::OutOfRange { index: 3, len: 0 })
        );
        assert_eq!(source.version(), 0);
        assert_eq!(
            SeriesError::OutOfRange { index: 3, len: 0 }.to_string(),
            "bar index 3 is out of range for 0 bars"
        );
    }

    #[test]
    fn test_clones_share_storage() {
        let a = BarSource::new(vec![bar(1.0)]);
        let b = a.clone();
        b.push(bar(2.0));
        assert_eq!(a.len(), 2);
        assert!(a.same_source(&b));
        assert!(!a.same_source(&BarSource::default()));
    }
}
