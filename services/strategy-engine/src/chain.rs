//! Option-chain assembly
//!
//! Builds the 3CE + ATM + 3PE view around the underlying's live price:
//! batch quotes for every leg, per-leg first-candle OHLC, and the
//! strategy levels the dashboard renders per side.

use crate::conditions::{box_proximity, evaluate_conditions};
use crate::levels::{compute_box_levels, compute_pl3, session_first_candle};
use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use services_common::constants::strategy;
use services_common::{
    BoxProximity, BoxStrategyValues, Interval, M75Conditions, MarketDataProvider, Ohlc,
    OptionChainInstruments, OptionLeg, Pl3Levels, Quote, QuoteProvider, round2,
};
use std::str::FromStr;
use tracing::{info, warn};

/// Strategy selector for chain and snapshot output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// M75 previous-day range strategy
    M75,
    /// First-candle box strategy
    Box,
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "m75" => Ok(Self::M75),
            "box" => Ok(Self::Box),
            other => Err(format!("unknown strategy: {other}")),
        }
    }
}

/// Chain build parameters
#[derive(Debug, Clone, Copy)]
pub struct ChainRequest {
    /// Timeframe for first-candle data
    pub interval: Interval,
    /// Strategy whose levels are attached per leg
    pub strategy: StrategyKind,
    /// Target trading day
    pub today: NaiveDate,
    /// Strike grid interval of the underlying
    pub strike_step: i64,
}

/// Quote and levels of one option side at one strike
#[derive(Debug, Clone, Default, Serialize)]
pub struct OptionSideQuote {
    /// Last traded price
    pub ltp: Option<f64>,
    /// First candle OHLC at the requested timeframe
    pub ohlc: Ohlc,
    /// M75 levels (M75 strategy only)
    pub pl3: Option<Pl3Levels>,
    /// Box values (box strategy only)
    pub box_values: Option<BoxStrategyValues>,
}

/// One chain row
#[derive(Debug, Clone, Serialize)]
pub struct ChainStrike {
    /// Strike price
    pub strike: i64,
    /// Call side
    pub ce: OptionSideQuote,
    /// Put side
    pub pe: OptionSideQuote,
}

/// Assembled option chain
#[derive(Debug, Clone, Serialize)]
pub struct OptionChain {
    /// Underlying last traded price
    pub ltp: f64,
    /// Expiry of every leg
    pub expiry: NaiveDate,
    /// Strategy the chain was built for
    pub strategy: StrategyKind,
    /// ATM +/- 3 rows
    pub strikes: Vec<ChainStrike>,
    /// Underlying M75 levels (M75 strategy)
    pub underlying_pl3: Option<Pl3Levels>,
    /// Underlying conditions (M75 strategy)
    pub m75_conditions: Option<M75Conditions>,
    /// Underlying box values (box strategy)
    pub box_strategy: Option<BoxStrategyValues>,
    /// Proximity flags (box strategy)
    pub box_proximity: Option<BoxProximity>,
}

/// Round the underlying price to the nearest strike on the grid
#[must_use]
pub fn atm_strike(ltp: f64, step: i64) -> i64 {
    let step_f = step as f64;
    let base = (ltp / step_f).floor() as i64 * step;
    if ltp % step_f >= step_f / 2.0 {
        base + step
    } else {
        base
    }
}

/// Strike ladder around the ATM strike
#[must_use]
pub fn chain_strikes(atm: i64, step: i64) -> Vec<i64> {
    let span = strategy::CHAIN_STRIKE_SPAN;
    (-span..=span).map(|i| atm + i * step).collect()
}

/// Build the option chain around the underlying's live price
///
/// Degrades instead of failing: legs without quotes or candle data come
/// back with null fields.
pub async fn build_option_chain(
    provider: &dyn MarketDataProvider,
    quotes: &dyn QuoteProvider,
    instruments: &OptionChainInstruments,
    ltp: f64,
    request: &ChainRequest,
) -> OptionChain {
    let atm = atm_strike(ltp, request.strike_step);
    let strikes = chain_strikes(atm, request.strike_step);

    // Every leg the batch quote request must cover
    let mut keys = Vec::new();
    for strike in &strikes {
        if let Some(legs) = instruments.legs_at(*strike) {
            if let Some(call) = &legs.call {
                keys.push(call.instrument_key.clone());
            }
            if let Some(put) = &legs.put {
                keys.push(put.instrument_key.clone());
            }
        }
    }

    info!(
        "Building {} option chain: ATM {atm}, {} legs, expiry {}",
        instruments.underlying,
        keys.len(),
        instruments.expiry
    );

    let batch = match quotes.quotes(&keys).await {
        Ok(batch) => batch,
        Err(e) => {
            warn!("Batch quote fetch failed: {e}; continuing without leg prices");
            FxHashMap::default()
        }
    };

    let mut rows = Vec::with_capacity(strikes.len());
    for strike in strikes {
        let legs = instruments.legs_at(strike);
        let ce = match legs.and_then(|l| l.call.as_ref()) {
            Some(leg) => build_side(provider, &batch, leg, request).await,
            None => OptionSideQuote::default(),
        };
        let pe = match legs.and_then(|l| l.put.as_ref()) {
            Some(leg) => build_side(provider, &batch, leg, request).await,
            None => OptionSideQuote::default(),
        };
        rows.push(ChainStrike { strike, ce, pe });
    }

    let mut chain = OptionChain {
        ltp,
        expiry: instruments.expiry,
        strategy: request.strategy,
        strikes: rows,
        underlying_pl3: None,
        m75_conditions: None,
        box_strategy: None,
        box_proximity: None,
    };

    // Underlying-level output depends on the selected strategy
    let underlying_key = underlying_instrument_key(&instruments.underlying);
    match request.strategy {
        StrategyKind::M75 => {
            let pl3 = compute_pl3(provider, &underlying_key, request.today).await;
            chain.m75_conditions = Some(evaluate_conditions(Some(ltp), None, &pl3));
            chain.underlying_pl3 = Some(pl3);
        }
        StrategyKind::Box => {
            let values =
                compute_box_levels(provider, &underlying_key, request.interval, request.today, None)
                    .await;
            chain.box_proximity = Some(box_proximity(Some(ltp), &values));
            chain.box_strategy = Some(values);
        }
    }

    chain
}

/// Build one side of a chain row
async fn build_side(
    provider: &dyn MarketDataProvider,
    batch: &FxHashMap<String, Quote>,
    leg: &OptionLeg,
    request: &ChainRequest,
) -> OptionSideQuote {
    let quote = quote_for_leg(batch, leg);
    let ltp = quote.as_ref().and_then(|q| q.last_price);

    let mut ohlc =
        session_first_candle(provider, &leg.instrument_key, request.interval, request.today).await;

    // Candle endpoints go quiet outside market hours; the quote's daily
    // OHLC is better than an empty row
    if ohlc.is_empty() {
        if let Some(daily) = quote.as_ref().and_then(|q| q.ohlc) {
            warn!(
                "Using daily OHLC fallback for {} (candle data unavailable)",
                leg.tradingsymbol
            );
            ohlc = Ohlc {
                open: daily.open.map(round2),
                high: daily.high.map(round2),
                low: daily.low.map(round2),
                close: daily.close.map(round2).or(ltp),
            };
        }
    }

    let mut side = OptionSideQuote {
        ltp,
        ohlc,
        pl3: None,
        box_values: None,
    };

    match request.strategy {
        StrategyKind::M75 => {
            side.pl3 =
                Some(compute_pl3(provider, &leg.instrument_key, request.today).await);
        }
        StrategyKind::Box => {
            // Box values only make sense when the leg trades
            if ltp.is_some() {
                side.box_values = Some(
                    compute_box_levels(
                        provider,
                        &leg.instrument_key,
                        request.interval,
                        request.today,
                        None,
                    )
                    .await,
                );
            }
        }
    }

    side
}

/// Match a leg against the batch quote response keys
fn quote_for_leg(batch: &FxHashMap<String, Quote>, leg: &OptionLeg) -> Option<Quote> {
    batch
        .get(&leg.response_key())
        .or_else(|| batch.get(&leg.tradingsymbol))
        .or_else(|| batch.get(&leg.instrument_key))
        .cloned()
}

/// Instrument key of an index underlying, for level computation
fn underlying_instrument_key(underlying: &str) -> String {
    services_common::constants::symbols::instrument_key(underlying)
        .map_or_else(|| underlying.to_string(), ToString::to_string)
}
