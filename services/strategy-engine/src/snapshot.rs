//! Multi-timeframe underlying snapshot

use crate::chain::StrategyKind;
use crate::conditions::evaluate_conditions;
use crate::levels::{compute_box_levels, compute_pl3, session_first_candle};
use chrono::NaiveDate;
use serde::Serialize;
use services_common::{
    BoxStrategyValues, Interval, M75Conditions, MarketDataProvider, Ohlc, Pl3Levels,
};

/// Timeframe ladder rendered in the underlying table
pub const SNAPSHOT_TIMEFRAMES: [Interval; 6] = [
    Interval::Minute1,
    Interval::Minute5,
    Interval::Minute15,
    Interval::Minute30,
    Interval::Minute60,
    Interval::Day,
];

/// First-candle data of one timeframe
#[derive(Debug, Clone, Serialize)]
pub struct TimeframeOhlc {
    /// Short display label ("5m", "1D", ...)
    pub timeframe: &'static str,
    /// Timeframe
    pub interval: Interval,
    /// First candle of the session at this timeframe
    pub ohlc: Ohlc,
    /// Box values for this timeframe (box strategy only)
    pub box_values: Option<BoxStrategyValues>,
}

/// Underlying state across the timeframe ladder
#[derive(Debug, Clone, Serialize)]
pub struct UnderlyingSnapshot {
    /// Vendor instrument key
    pub instrument_key: String,
    /// Live price, when available
    pub ltp: Option<f64>,
    /// Strategy the snapshot was built for
    pub strategy: StrategyKind,
    /// M75 levels (M75 strategy)
    pub pl3: Option<Pl3Levels>,
    /// M75 conditions (M75 strategy)
    pub m75_conditions: Option<M75Conditions>,
    /// Per-timeframe first-candle data
    pub timeframes: Vec<TimeframeOhlc>,
}

/// Build the underlying snapshot: first-candle OHLC for every ladder
/// timeframe, plus the per-strategy level sets
pub async fn underlying_snapshot(
    provider: &dyn MarketDataProvider,
    instrument_key: &str,
    strategy: StrategyKind,
    today: NaiveDate,
    ltp: Option<f64>,
) -> UnderlyingSnapshot {
    let mut snapshot = UnderlyingSnapshot {
        instrument_key: instrument_key.to_string(),
        ltp,
        strategy,
        pl3: None,
        m75_conditions: None,
        timeframes: Vec::with_capacity(SNAPSHOT_TIMEFRAMES.len()),
    };

    if strategy == StrategyKind::M75 {
        let pl3 = compute_pl3(provider, instrument_key, today).await;
        snapshot.m75_conditions = Some(evaluate_conditions(ltp, None, &pl3));
        snapshot.pl3 = Some(pl3);
    }

    for interval in SNAPSHOT_TIMEFRAMES {
        let ohlc = session_first_candle(provider, instrument_key, interval, today).await;

        let box_values = if strategy == StrategyKind::Box && ltp.is_some() {
            Some(compute_box_levels(provider, instrument_key, interval, today, None).await)
        } else {
            None
        };

        snapshot.timeframes.push(TimeframeOhlc {
            timeframe: interval.label(),
            interval,
            ohlc,
            box_values,
        });
    }

    snapshot
}
