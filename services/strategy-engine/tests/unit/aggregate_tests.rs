//! Aggregation contract tests

use crate::common::{date, minute_candle, session_minutes};
use pretty_assertions::assert_eq;
use rstest::*;
use services_common::Interval;
use strategy_engine::aggregate_candles;

#[rstest]
#[case(Interval::Minute5, 5)]
#[case(Interval::Minute15, 15)]
#[case(Interval::Minute30, 30)]
#[case(Interval::Minute60, 60)]
#[case(Interval::Minute75, 75)]
fn test_record_count_is_ceil_n_over_f(#[case] interval: Interval, #[case] factor: usize) {
    let day = date(2024, 1, 9);
    for n in [1usize, factor - 1, factor, factor + 1, 2 * factor, 375] {
        let candles: Vec<_> = (0..n)
            .map(|i| minute_candle(day, 9, 15, 100.0 + i as f64, 99.0))
            .collect();
        let aggregated = aggregate_candles(&candles, interval);
        assert_eq!(aggregated.len(), n.div_ceil(factor), "n={n} factor={factor}");
    }
}

#[rstest]
fn test_final_short_window_consumes_remainder() {
    let day = date(2024, 1, 9);
    // 7 candles at factor 5: windows of 5 and 2
    let candles: Vec<_> = (0..7)
        .map(|i| minute_candle(day, 9, 15 + i, 100.0, 99.0))
        .collect();
    let aggregated = aggregate_candles(&candles, Interval::Minute5);

    assert_eq!(aggregated.len(), 2);
    // Each source candle carries volume 100
    assert_eq!(aggregated[0].volume, Some(500.0));
    assert_eq!(aggregated[1].volume, Some(200.0));
}

#[rstest]
fn test_noop_granularity_is_identity() {
    let day = date(2024, 1, 9);
    let candles: Vec<_> = (0..10)
        .map(|i| minute_candle(day, 9, 15 + i, 100.0 + i as f64, 99.0))
        .collect();

    assert_eq!(aggregate_candles(&candles, Interval::Minute1), candles);
    assert_eq!(aggregate_candles(&candles, Interval::Day), candles);
    assert_eq!(aggregate_candles(&candles, Interval::Week), candles);
}

#[rstest]
fn test_ohlc_envelope_holds_after_aggregation() {
    let day = date(2024, 1, 9);
    let candles = session_minutes(day, 21_000.0);

    for aggregated in aggregate_candles(&candles, Interval::Minute75) {
        let open = aggregated.open.unwrap();
        let close = aggregated.close.unwrap();
        let high = aggregated.high.unwrap();
        let low = aggregated.low.unwrap();
        assert!(high >= open.max(close));
        assert!(low <= open.min(close));
    }
}

#[rstest]
fn test_full_session_aggregates_to_five_75m_candles() {
    let day = date(2024, 1, 9);
    let candles = session_minutes(day, 21_000.0);
    let aggregated = aggregate_candles(&candles, Interval::Minute75);

    assert_eq!(aggregated.len(), 5);
    // Highs drift upward one point per minute
    assert_eq!(aggregated[0].high, Some(21_074.0));
    assert_eq!(aggregated[4].high, Some(21_374.0));
    assert_eq!(aggregated[4].low, Some(21_290.0));
}
