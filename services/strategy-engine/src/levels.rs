//! Strategy level calculators
//!
//! Every calculator degrades to null-valued output instead of raising:
//! an exhausted fetch plan, a missing previous day, or a batch with no
//! usable highs/lows all produce default records the caller treats as
//! "temporarily unavailable".

use crate::aggregate::aggregate_candles;
use crate::trading_day::{group_by_trading_day, select_previous_day, sort_by_timestamp};
use chrono::{Duration, NaiveDate};
use services_common::constants::strategy;
use services_common::{
    BoxStrategyValues, Candle, Interval, MarketDataProvider, Ohlc, Pl3Levels, round2,
};
use tracing::{debug, warn};

/// One step of a calculator's ordered fetch plan
///
/// Fallback policy is an explicit strategy list rather than nested
/// control flow; the alternate key-encoding retry lives inside the
/// vendor adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Live session endpoint
    Intraday,
    /// Historical range ending at the target day
    Historical {
        /// Calendar days back from the target day
        days_back: i64,
    },
}

/// Walk a fetch plan until a step yields candles
///
/// Errors and empty batches both mean "try the next source"; an
/// exhausted plan returns an empty batch.
pub async fn run_fetch_plan(
    provider: &dyn MarketDataProvider,
    instrument_key: &str,
    interval: Interval,
    today: NaiveDate,
    plan: &[FetchStrategy],
) -> Vec<Candle> {
    for step in plan {
        let result = match step {
            FetchStrategy::Intraday => provider.intraday_candles(instrument_key, interval).await,
            FetchStrategy::Historical { days_back } => {
                let from = today - Duration::days(*days_back);
                provider
                    .historical_candles(instrument_key, interval, from, today)
                    .await
            }
        };

        match result {
            Ok(candles) if !candles.is_empty() => {
                debug!(
                    "Received {} candles for {instrument_key} via {step:?}",
                    candles.len()
                );
                return candles;
            }
            Ok(_) => {
                warn!("{step:?} returned no candles for {instrument_key}, trying next source");
            }
            Err(e) => {
                warn!("{step:?} failed for {instrument_key}: {e}, trying next source");
            }
        }
    }

    Vec::new()
}

/// Compute the M75 previous-day range levels
///
/// Fetches ~10 days of 1-minute candles, groups them by trading day,
/// aggregates the previous day to 75-minute candles and reads the last
/// three (the final 225 minutes of that session).
pub async fn compute_pl3(
    provider: &dyn MarketDataProvider,
    instrument_key: &str,
    today: NaiveDate,
) -> Pl3Levels {
    let plan = [FetchStrategy::Historical {
        days_back: strategy::PL3_LOOKBACK_DAYS,
    }];
    let candles = run_fetch_plan(provider, instrument_key, Interval::Minute1, today, &plan).await;
    pl3_from_minute_candles(&candles, today)
}

/// PL3 levels from an already-fetched 1-minute series
///
/// Aggregation happens per day, after grouping; windows never span a day
/// boundary.
#[must_use]
pub fn pl3_from_minute_candles(candles: &[Candle], today: NaiveDate) -> Pl3Levels {
    if candles.is_empty() {
        return Pl3Levels::default();
    }

    let mut sorted = candles.to_vec();
    sort_by_timestamp(&mut sorted);

    let groups = group_by_trading_day(&sorted);
    let days: Vec<NaiveDate> = groups.keys().copied().collect();

    let Some(previous_day) = select_previous_day(&days, today) else {
        warn!("No previous trading day found (today: {today}, days available: {})", days.len());
        return Pl3Levels::default();
    };

    let Some(day_candles) = groups.get(&previous_day) else {
        return Pl3Levels::default();
    };

    let mut day_candles = day_candles.clone();
    sort_by_timestamp(&mut day_candles);

    let aggregated = aggregate_candles(&day_candles, Interval::Minute75);

    // Last 3 x 75-minute candles; fewer is fine when the session was short
    let window_start = aggregated.len().saturating_sub(strategy::PL3_WINDOW_CANDLES);
    let window = &aggregated[window_start..];

    let high = window.iter().filter_map(|c| c.high).reduce(f64::max);
    let low = window.iter().filter_map(|c| c.low).reduce(f64::min);

    match (high, low) {
        (Some(high), Some(low)) => {
            let pl3h = round2(high);
            let pl3l = round2(low);
            let levels = Pl3Levels {
                pl3h: Some(pl3h),
                pl3m: Some(round2((pl3h + pl3l) / 2.0)),
                pl3l: Some(pl3l),
            };
            debug!(
                "PL3 for {previous_day}: H={pl3h:.2} M={:.2} L={pl3l:.2} (from {} candles)",
                levels.pl3m.unwrap_or_default(),
                window.len()
            );
            levels
        }
        _ => {
            warn!("No valid high/low data in the last {} candles of {previous_day}", window.len());
            Pl3Levels::default()
        }
    }
}

/// First candle of the current session at the requested timeframe
///
/// Intraday timeframes are synthesized from 1-minute data, preferring the
/// live intraday endpoint with a short historical fallback; day/week/
/// month are fetched directly. When the target day is absent from the
/// batch (market closed), the most recent available day substitutes with
/// a downgrade notice.
pub async fn session_first_candle(
    provider: &dyn MarketDataProvider,
    instrument_key: &str,
    interval: Interval,
    today: NaiveDate,
) -> Ohlc {
    let intraday_plan = [
        FetchStrategy::Intraday,
        FetchStrategy::Historical {
            days_back: strategy::INTRADAY_FALLBACK_DAYS,
        },
    ];
    let daily_plan = [FetchStrategy::Historical {
        days_back: strategy::DAILY_LOOKBACK_DAYS,
    }];
    let plan: &[FetchStrategy] = if interval.is_intraday() {
        &intraday_plan
    } else {
        &daily_plan
    };

    let candles = run_fetch_plan(provider, instrument_key, interval.native(), today, plan).await;
    first_candle_of_latest_day(&candles, interval, today)
}

/// First candle of the target (or most recent) trading day in a batch
#[must_use]
pub fn first_candle_of_latest_day(candles: &[Candle], interval: Interval, today: NaiveDate) -> Ohlc {
    if candles.is_empty() {
        return Ohlc::default();
    }

    let mut sorted = candles.to_vec();
    sort_by_timestamp(&mut sorted);

    let groups = group_by_trading_day(&sorted);
    let Some(most_recent) = groups.keys().copied().max() else {
        return Ohlc::default();
    };

    let target_day = if groups.contains_key(&today) {
        today
    } else {
        warn!("No candles for {today}, using most recent day {most_recent} instead");
        most_recent
    };

    let Some(day_candles) = groups.get(&target_day) else {
        return Ohlc::default();
    };

    let mut day_candles = day_candles.clone();
    sort_by_timestamp(&mut day_candles);

    let aggregated = aggregate_candles(&day_candles, interval);
    aggregated
        .first()
        .map(|candle| round_ohlc(Ohlc::from_candle(candle)))
        .unwrap_or_default()
}

/// Previous trading day's full-day OHLC from daily candles
pub async fn compute_previous_day_ohlc(
    provider: &dyn MarketDataProvider,
    instrument_key: &str,
    today: NaiveDate,
) -> Ohlc {
    let plan = [FetchStrategy::Historical {
        days_back: strategy::PREV_DAY_LOOKBACK_DAYS,
    }];
    let candles = run_fetch_plan(provider, instrument_key, Interval::Day, today, &plan).await;
    previous_day_ohlc_from_daily(&candles, today)
}

/// Previous-day OHLC from an already-fetched daily series
#[must_use]
pub fn previous_day_ohlc_from_daily(candles: &[Candle], today: NaiveDate) -> Ohlc {
    let mut sorted = candles.to_vec();
    sort_by_timestamp(&mut sorted);

    let groups = group_by_trading_day(&sorted);
    let days: Vec<NaiveDate> = groups.keys().copied().collect();

    let Some(previous_day) = select_previous_day(&days, today) else {
        return Ohlc::default();
    };

    groups
        .get(&previous_day)
        .and_then(|day_candles| day_candles.first())
        .map(|candle| round_ohlc(Ohlc::from_candle(candle)))
        .unwrap_or_default()
}

/// Compute the full box strategy record for one instrument
///
/// Callers that already hold the previous day's OHLC (batch paths) pass
/// it in to skip the daily fetch.
pub async fn compute_box_levels(
    provider: &dyn MarketDataProvider,
    instrument_key: &str,
    interval: Interval,
    today: NaiveDate,
    previous_day_ohlc: Option<Ohlc>,
) -> BoxStrategyValues {
    let first_candle = session_first_candle(provider, instrument_key, interval, today).await;
    let pl3 = compute_pl3(provider, instrument_key, today).await;
    let previous_day = match previous_day_ohlc {
        Some(ohlc) => ohlc,
        None => compute_previous_day_ohlc(provider, instrument_key, today).await,
    };

    box_values_from_parts(&first_candle, &pl3, &previous_day)
}

/// Assemble box strategy values from their parts
///
/// Bullish and bearish targets/reversals are always computed together;
/// the directional bias is informational only. Every derived field is
/// null when the first candle's high/low is unavailable.
#[must_use]
pub fn box_values_from_parts(
    first_candle: &Ohlc,
    pl3: &Pl3Levels,
    previous_day: &Ohlc,
) -> BoxStrategyValues {
    let mut values = BoxStrategyValues {
        fch: first_candle.high,
        fcl: first_candle.low,
        pl3h: pl3.pl3h,
        pl3l: pl3.pl3l,
        pl3m: pl3.pl3m,
        pdh: previous_day.high,
        pdl: previous_day.low,
        pdo: previous_day.open,
        pdc: previous_day.close,
        ..Default::default()
    };

    if let (Some(fch), Some(fcl)) = (values.fch, values.fcl) {
        let dist = fch - fcl;
        values.fcm = Some((fch + fcl) / 2.0);

        let br_t = fch + dist * 2.0;
        values.br_t = Some(br_t);
        values.br_r = Some(fcl + (br_t - fcl) * 0.75);

        let be_t = fcl - dist * 2.0;
        values.be_t = Some(be_t);
        values.be_r = Some(fch - (fch - be_t) * 0.75);
    }

    values.fch = values.fch.map(round2);
    values.fcl = values.fcl.map(round2);
    values.fcm = values.fcm.map(round2);
    values.br_t = values.br_t.map(round2);
    values.br_r = values.br_r.map(round2);
    values.be_t = values.be_t.map(round2);
    values.be_r = values.be_r.map(round2);
    values.pdh = values.pdh.map(round2);
    values.pdl = values.pdl.map(round2);
    values.pdo = values.pdo.map(round2);
    values.pdc = values.pdc.map(round2);

    values
}

fn round_ohlc(ohlc: Ohlc) -> Ohlc {
    Ohlc {
        open: ohlc.open.map(round2),
        high: ohlc.high.map(round2),
        low: ohlc.low.map(round2),
        close: ohlc.close.map(round2),
    }
}
