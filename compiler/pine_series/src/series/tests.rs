#![allow(clippy::unwrap_used, clippy::float_cmp)]

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::{Bar, BarField, BarSource, Operand, PlotPoint, Series};

fn bar(time: i64, open: f64, close: f64) -> Bar {
    Bar::new(time, open, open.max(close) + 1.0, open.min(close) - 1.0, close, 100.0)
}

/// Five bars with closes 10, 11, 12, 13, 14 and opens one below.
fn five_bars() -> BarSource {
    BarSource::new(
        (0..5)
            .map(|i| {
                let close = 10.0 + f64::from(i);
                bar(i64::from(i) * 60_000, close - 1.0, close)
            })
            .collect(),
    )
}

fn close(source: &BarSource) -> Series {
    Series::field(source, BarField::Close)
}

fn assert_values(series: &Series, expected: &[f64]) {
    let values = series.values();
    assert_eq!(values.len(), expected.len(), "{values:?}");
    for (i, (got, want)) in values.iter().zip(expected).enumerate() {
        if want.is_nan() {
            assert!(got.is_nan(), "bar {i}: expected NaN, got {got}");
        } else {
            assert_eq!(got, want, "bar {i}");
        }
    }
}

#[test]
fn test_composition_is_lazy() {
    let source = five_bars();
    let spread = close(&source).sub(Series::field(&source, BarField::Open));
    assert_eq!(spread.computations(), 0);
    assert_values(&spread, &[1.0; 5]);
    assert_eq!(spread.computations(), 1);
}

#[test]
fn test_values_are_cached_until_the_source_changes() {
    let source = five_bars();
    let derived = close(&source).mul(2.0).add(1.0);

    let first = derived.values();
    let second = derived.values();
    assert_eq!(first.len(), 5);
    assert_eq!(first, second);
    assert_eq!(derived.computations(), 1);

    source.push(bar(300_000, 14.0, 15.0));
    let third = derived.values();
    assert_eq!(third.len(), 6);
    assert_eq!(&third[..5], &first[..]);
    assert_eq!(third[5], 31.0);
    assert_eq!(derived.computations(), 2);

    derived.values();
    assert_eq!(derived.computations(), 2);
}

#[test]
fn test_clones_share_the_cache() {
    let source = five_bars();
    let a = close(&source).add(1.0);
    let b = a.clone();
    a.values();
    b.values();
    assert_eq!(b.computations(), 1);
}

#[test]
fn test_replacing_a_bar_recomputes() {
    let source = five_bars();
    let series = close(&source);
    assert_eq!(series.last(), 14.0);
    source.replace_last(bar(240_000, 13.0, 20.0)).unwrap();
    assert_eq!(series.last(), 20.0);
    assert_eq!(series.computations(), 2);
}

#[test]
fn test_materialize_is_isolated_from_later_mutations() {
    let source = five_bars();
    let derived = close(&source).add(Series::field(&source, BarField::Open));
    let frozen = derived.materialize();
    assert!(frozen.is_materialized());
    assert_values(&derived, &[19.0, 21.0, 23.0, 25.0, 27.0]);

    source.push(bar(300_000, 14.0, 15.0));
    source.replace_at(0, bar(0, 0.0, 0.0)).unwrap();

    assert_values(&derived, &[0.0, 21.0, 23.0, 25.0, 27.0, 29.0]);
    assert_values(&frozen, &[19.0, 21.0, 23.0, 25.0, 27.0]);
    assert_eq!(frozen.computations(), 0);
}

#[test]
fn test_nested_reads_do_not_block_a_waiting_writer() {
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    let source = five_bars();
    let inner = close(&source);
    let outer = Series::from_fn(&source, move |_, i| {
        if i == 0 {
            thread::sleep(Duration::from_millis(200));
        }
        inner.get(i)
    });

    let writer = {
        let source = source.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            source.push(bar(300_000, 14.0, 15.0));
        })
    };
    let (done, finished) = mpsc::channel();
    thread::spawn(move || {
        let _ = done.send(outer.values());
    });

    let values = finished
        .recv_timeout(Duration::from_secs(5))
        .expect("values() returned while a writer was queued");
    writer.join().unwrap();
    assert!(matches!(values.len(), 5 | 6), "{values:?}");
    assert_eq!(values[0], 10.0);
    assert_eq!(source.len(), 6);
}

#[test]
fn test_from_values_composes_by_index() {
    let source = five_bars();
    let weights = Series::from_values(&source, vec![1.0, 2.0, 3.0]);
    assert_values(&close(&source).mul(&weights), &[10.0, 22.0, 36.0, f64::NAN, f64::NAN]);
}

#[test]
fn test_division_and_remainder_by_zero_are_nan() {
    let source = five_bars();
    let zero = Series::constant(&source, 0.0);
    assert!(close(&source).div(&zero).values().iter().all(|v| v.is_nan()));
    assert!(close(&source).rem(0.0).values().iter().all(|v| v.is_nan()));
    assert_values(&close(&source).rem(4.0), &[2.0, 3.0, 0.0, 1.0, 2.0]);
}

#[test]
fn test_offset_reads_earlier_bars() {
    let source = five_bars();
    assert_values(
        &close(&source).offset(2),
        &[f64::NAN, f64::NAN, 10.0, 11.0, 12.0],
    );
    assert_values(&close(&source).offset(0), &[10.0, 11.0, 12.0, 13.0, 14.0]);
    assert!(close(&source).offset(9).values().iter().all(|v| v.is_nan()));
}

#[test]
fn test_comparisons_with_nan_are_false() {
    let source = five_bars();
    let prev = close(&source).offset(1);
    assert_values(&close(&source).gt(&prev), &[0.0, 1.0, 1.0, 1.0, 1.0]);
    assert_values(&close(&source).lte(&prev), &[0.0, 0.0, 0.0, 0.0, 0.0]);
    assert_values(&close(&source).neq(&prev), &[0.0, 1.0, 1.0, 1.0, 1.0]);
    assert_values(&prev.eq(&prev), &[0.0, 1.0, 1.0, 1.0, 1.0]);
    assert_values(&close(&source).gte(12.0), &[0.0, 0.0, 1.0, 1.0, 1.0]);
    assert_values(&close(&source).lt(12.0), &[1.0, 1.0, 0.0, 0.0, 0.0]);
}

#[test]
fn test_logic_uses_truthiness() {
    let source = five_bars();
    let up = close(&source).gt(11.0);
    let even = close(&source).rem(2.0).eq(0.0);
    assert_values(&up.and(&even), &[0.0, 0.0, 1.0, 0.0, 1.0]);
    assert_values(&up.or(&even), &[1.0, 0.0, 1.0, 1.0, 1.0]);
    assert_values(&up.not(), &[1.0, 1.0, 0.0, 0.0, 0.0]);
    // NaN is false.
    assert_values(&close(&source).offset(1).not(), &[1.0, 0.0, 0.0, 0.0, 0.0]);
}

#[test]
fn test_iif_and_nz() {
    let source = five_bars();
    let up = close(&source).gt(11.0);
    assert_values(&up.iif(1.0, close(&source).neg()), &[-10.0, -11.0, 1.0, 1.0, 1.0]);
    assert_values(
        &close(&source).offset(1).nz(0.0),
        &[0.0, 10.0, 11.0, 12.0, 13.0],
    );
}

#[test]
fn test_bar_index_and_constant() {
    let source = five_bars();
    assert_values(&Series::bar_index(&source), &[0.0, 1.0, 2.0, 3.0, 4.0]);
    assert_values(&Series::constant(&source, 7.5), &[7.5; 5]);
}

#[test]
fn test_get_out_of_range_is_nan() {
    let source = five_bars();
    let series = close(&source);
    assert_eq!(series.get(1), 11.0);
    assert!(series.get(5).is_nan());
    assert!(close(&BarSource::default()).last().is_nan());
    assert!(close(&BarSource::default()).is_empty());
}

#[test]
fn test_to_points_pairs_values_with_times() {
    let source = BarSource::new(vec![bar(1_000, 1.0, 2.0), bar(2_000, 2.0, 3.0)]);
    assert_eq!(
        close(&source).to_points(),
        vec![
            PlotPoint {
                time: 1_000,
                value: 2.0
            },
            PlotPoint {
                time: 2_000,
                value: 3.0
            },
        ]
    );
    let json = serde_json::to_string(&close(&source).to_points()[0]).unwrap();
    assert_eq!(json, r#"{"time":1000,"value":2.0}"#);
}

#[test]
fn test_series_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Series>();
    assert_send_sync::<Operand>();
    assert_send_sync::<BarSource>();
}

#[test]
fn test_readers_on_other_threads_share_the_cache() {
    let source = five_bars();
    let series = close(&source).add(1.0);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let series = series.clone();
            std::thread::spawn(move || series.values().iter().sum::<f64>())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 65.0);
    }
    assert_eq!(series.computations(), 1);
}

fn finite() -> impl Strategy<Value = f64> {
    -1.0e6..1.0e6f64
}

proptest! {
    #[test]
    fn prop_arithmetic_matches_scalar_math(
        closes in prop::collection::vec(finite(), 1..40),
        k in finite(),
    ) {
        let source = BarSource::new(
            closes.iter().enumerate().map(|(i, &c)| bar(i64::try_from(i).unwrap(), c, c)).collect(),
        );
        let c = close(&source);
        let sum = c.add(k).values();
        let diff = c.sub(k).values();
        let product = c.mul(k).values();
        for (i, &value) in closes.iter().enumerate() {
            prop_assert_eq!(sum[i], value + k);
            prop_assert_eq!(diff[i], value - k);
            prop_assert_eq!(product[i], value * k);
        }
    }

    #[test]
    fn prop_offset_shifts_by_n(
        closes in prop::collection::vec(finite(), 0..40),
        n in 0usize..50,
    ) {
        let source = BarSource::new(
            closes.iter().map(|&c| bar(0, c, c)).collect(),
        );
        let shifted = close(&source).offset(n).values();
        prop_assert_eq!(shifted.len(), closes.len());
        for (i, value) in shifted.iter().enumerate() {
            if i < n {
                prop_assert!(value.is_nan());
            } else {
                prop_assert_eq!(*value, closes[i - n]);
            }
        }
    }

    #[test]
    fn prop_division_never_panics_and_zero_divisor_is_nan(
        pairs in prop::collection::vec((finite(), prop_oneof![Just(0.0), finite()]), 0..40),
    ) {
        let source = BarSource::new(
            pairs.iter().map(|&(a, b)| Bar::new(0, b, b, b, a, 0.0)).collect(),
        );
        let quotient = close(&source).div(Series::field(&source, BarField::Open)).values();
        for (i, &(_, divisor)) in pairs.iter().enumerate() {
            if divisor == 0.0 {
                prop_assert!(quotient[i].is_nan());
            }
        }
    }
}
