//! Property-based tests for aggregation invariants
//!
//! Verifies that candle aggregation maintains its structural guarantees
//! under arbitrary inputs:
//!
//! - Record count is always ceil(n / factor)
//! - The OHLC envelope (high >= open/close >= low) survives aggregation
//! - Volume is conserved across windows
//! - Passthrough timeframes are the identity

use proptest::prelude::*;
use services_common::{Candle, Interval, RawTimestamp};
use strategy_engine::aggregate_candles;

/// Generate a series of well-formed candles: each candle's high is the
/// maximum of its four price points and its low the minimum, with
/// monotonically increasing timestamps
fn arb_series() -> impl Strategy<Value = Vec<Candle>> {
    prop::collection::vec(
        (100.0f64..10_000.0, 0.0f64..50.0, 0.0f64..50.0, 0.0f64..100_000.0),
        0..400,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (mid, up, down, volume))| Candle {
                ts: RawTimestamp::Millis(1_704_771_900_000 + i as i64 * 60_000),
                open: Some(mid),
                high: Some(mid + up),
                low: Some(mid - down),
                close: Some(mid + up - down),
                volume: Some(volume),
                open_interest: Some(0.0),
            })
            .collect()
    })
}

fn arb_factor_interval() -> impl Strategy<Value = (Interval, usize)> {
    prop_oneof![
        Just((Interval::Minute5, 5)),
        Just((Interval::Minute15, 15)),
        Just((Interval::Minute30, 30)),
        Just((Interval::Minute60, 60)),
        Just((Interval::Minute75, 75)),
    ]
}

proptest! {
    #[test]
    fn prop_record_count_is_ceil(candles in arb_series(), (interval, factor) in arb_factor_interval()) {
        let aggregated = aggregate_candles(&candles, interval);
        prop_assert_eq!(aggregated.len(), candles.len().div_ceil(factor));
    }

    #[test]
    fn prop_ohlc_envelope_survives(candles in arb_series(), (interval, _factor) in arb_factor_interval()) {
        for record in aggregate_candles(&candles, interval) {
            let high = record.high.unwrap();
            let low = record.low.unwrap();
            let open = record.open.unwrap();
            let close = record.close.unwrap();
            prop_assert!(high >= open.max(close));
            prop_assert!(low <= open.min(close));
        }
    }

    #[test]
    fn prop_volume_is_conserved(candles in arb_series(), (interval, _factor) in arb_factor_interval()) {
        let input_total: f64 = candles.iter().filter_map(|c| c.volume).sum();
        let output_total: f64 = aggregate_candles(&candles, interval)
            .iter()
            .filter_map(|c| c.volume)
            .sum();
        prop_assert!((input_total - output_total).abs() < 1e-6 * input_total.max(1.0));
    }

    #[test]
    fn prop_passthrough_is_identity(candles in arb_series()) {
        prop_assert_eq!(aggregate_candles(&candles, Interval::Minute1), candles.clone());
        prop_assert_eq!(aggregate_candles(&candles, Interval::Day), candles);
    }
}
