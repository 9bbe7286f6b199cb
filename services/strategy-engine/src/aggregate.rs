//! Candle timeframe aggregation

use services_common::{Candle, Interval};

/// Aggregate 1-minute candles into a coarser timeframe
///
/// Folds consecutive windows of `factor` candles into one: first candle's
/// timestamp and open, last candle's close and open interest, max/min of
/// the non-missing highs/lows, summed volume. The final window may be
/// short and is emitted with the same rule. Timeframes without an
/// aggregation factor pass the input through unchanged.
///
/// Windows are positional from the start of the sequence, not aligned to
/// wall-clock boundaries; callers pass input that starts at the session
/// open.
#[must_use]
pub fn aggregate_candles(candles: &[Candle], target: Interval) -> Vec<Candle> {
    let Some(factor) = target.aggregation_factor() else {
        return candles.to_vec();
    };

    if candles.is_empty() {
        return Vec::new();
    }

    candles.chunks(factor).map(fold_window).collect()
}

/// Fold one window of source candles into a single candle
fn fold_window(window: &[Candle]) -> Candle {
    let first = &window[0];
    let last = &window[window.len() - 1];

    let high = window.iter().filter_map(|c| c.high).reduce(f64::max);
    let low = window.iter().filter_map(|c| c.low).reduce(f64::min);
    let volume: f64 = window.iter().filter_map(|c| c.volume).sum();

    Candle {
        ts: first.ts.clone(),
        open: first.open,
        high,
        low,
        close: last.close,
        volume: Some(volume),
        open_interest: last.open_interest,
    }
}
