//! Option-chain assembly tests

use crate::common::{StubProvider, StubQuotes, date, minute_candle, session_minutes};
use pretty_assertions::assert_eq;
use rstest::*;
use rustc_hash::FxHashMap;
use services_common::{
    Interval, Ohlc, OptionChainInstruments, OptionLeg, Quote, StrikeLegs,
};
use strategy_engine::chain::{ChainRequest, StrategyKind, build_option_chain, chain_strikes};
use strategy_engine::atm_strike;

fn leg(key: &str, tradingsymbol: &str) -> OptionLeg {
    OptionLeg {
        instrument_key: key.to_string(),
        tradingsymbol: tradingsymbol.to_string(),
        exchange_token: None,
    }
}

/// NIFTY chain instruments covering the ATM strike for ltp ~21490
fn nifty_instruments() -> OptionChainInstruments {
    let mut by_strike = FxHashMap::default();
    by_strike.insert(
        21_500,
        StrikeLegs {
            call: Some(leg("NSE_FO|40083", "NIFTY24JAN21500CE")),
            put: Some(leg("NSE_FO|40084", "NIFTY24JAN21500PE")),
        },
    );
    by_strike.insert(
        21_450,
        StrikeLegs {
            call: Some(leg("NSE_FO|40081", "NIFTY24JAN21450CE")),
            put: None,
        },
    );

    OptionChainInstruments {
        underlying: "NIFTY".to_string(),
        expiry: date(2024, 1, 25),
        by_strike,
    }
}

fn chain_request(strategy: StrategyKind) -> ChainRequest {
    ChainRequest {
        interval: Interval::Minute5,
        strategy,
        today: date(2024, 1, 10),
        strike_step: 50,
    }
}

#[rstest]
fn test_atm_rounding_and_ladder() {
    assert_eq!(atm_strike(21_490.0, 50), 21_500);
    assert_eq!(atm_strike(21_474.9, 50), 21_450);
    assert_eq!(
        chain_strikes(21_500, 50),
        vec![21_350, 21_400, 21_450, 21_500, 21_550, 21_600, 21_650]
    );
}

#[tokio::test]
async fn test_chain_rows_match_batch_quotes_by_response_key() {
    let today = date(2024, 1, 10);
    let provider = StubProvider::default().with_intraday(
        Interval::Minute1,
        (0..5)
            .map(|i| minute_candle(today, 9, 15 + i, 150.0 + i as f64, 140.0))
            .collect(),
    );

    let mut quotes = StubQuotes::default();
    quotes.by_key.insert(
        "NSE_FO:NIFTY24JAN21500CE".to_string(),
        Quote {
            last_price: Some(145.2),
            ohlc: None,
        },
    );
    quotes.by_key.insert(
        "NSE_FO:NIFTY24JAN21500PE".to_string(),
        Quote {
            last_price: Some(98.4),
            ohlc: None,
        },
    );

    let chain = build_option_chain(
        &provider,
        &quotes,
        &nifty_instruments(),
        21_490.0,
        &chain_request(StrategyKind::M75),
    )
    .await;

    assert_eq!(chain.strikes.len(), 7);
    assert_eq!(chain.expiry, date(2024, 1, 25));

    let atm_row = chain
        .strikes
        .iter()
        .find(|row| row.strike == 21_500)
        .expect("ATM row present");
    assert_eq!(atm_row.ce.ltp, Some(145.2));
    assert_eq!(atm_row.pe.ltp, Some(98.4));
    // Intraday stub answered the first-candle fetch
    assert_eq!(atm_row.ce.ohlc.high, Some(154.0));

    // Strikes without listed legs stay empty rather than erroring
    let far_row = chain
        .strikes
        .iter()
        .find(|row| row.strike == 21_350)
        .expect("far row present");
    assert_eq!(far_row.ce.ltp, None);
    assert!(far_row.ce.ohlc.is_empty());
}

#[tokio::test]
async fn test_m75_chain_attaches_underlying_levels_and_conditions() {
    let previous_day = date(2024, 1, 9);
    let provider = StubProvider::default()
        .with_historical(Interval::Minute1, session_minutes(previous_day, 21_000.0));

    let chain = build_option_chain(
        &provider,
        &StubQuotes::default(),
        &nifty_instruments(),
        21_490.0,
        &chain_request(StrategyKind::M75),
    )
    .await;

    let pl3 = chain.underlying_pl3.expect("pl3 attached");
    assert_eq!(pl3.pl3h, Some(21_374.0));

    // 21490 is above PL3H: bullish breakout on the underlying
    let conditions = chain.m75_conditions.expect("conditions attached");
    assert_eq!(
        conditions.pl3h_condition,
        Some(services_common::LevelCondition::Bullish)
    );
    assert!(chain.box_strategy.is_none());
}

#[tokio::test]
async fn test_box_chain_attaches_box_values_and_proximity() {
    let today = date(2024, 1, 10);
    let provider = StubProvider::default().with_intraday(
        Interval::Minute1,
        (0..5)
            .map(|i| minute_candle(today, 9, 15 + i, 21_510.0, 21_430.0))
            .collect(),
    );

    let chain = build_option_chain(
        &provider,
        &StubQuotes::default(),
        &nifty_instruments(),
        21_490.0,
        &chain_request(StrategyKind::Box),
    )
    .await;

    let values = chain.box_strategy.expect("box values attached");
    assert_eq!(values.fch, Some(21_510.0));
    assert_eq!(values.fcl, Some(21_430.0));
    assert!(chain.box_proximity.is_some());
    assert!(chain.underlying_pl3.is_none());
}

#[tokio::test]
async fn test_leg_ohlc_falls_back_to_quote_daily_ohlc() {
    // No candle data anywhere; the quote's daily OHLC must fill in
    let provider = StubProvider {
        fail_intraday: true,
        fail_historical: true,
        ..Default::default()
    };

    let mut quotes = StubQuotes::default();
    quotes.by_key.insert(
        "NSE_FO:NIFTY24JAN21500CE".to_string(),
        Quote {
            last_price: Some(145.2),
            ohlc: Some(Ohlc {
                open: Some(150.0),
                high: Some(160.0),
                low: Some(140.0),
                close: None,
            }),
        },
    );

    let chain = build_option_chain(
        &provider,
        &quotes,
        &nifty_instruments(),
        21_490.0,
        &chain_request(StrategyKind::M75),
    )
    .await;

    let atm_row = chain
        .strikes
        .iter()
        .find(|row| row.strike == 21_500)
        .expect("ATM row present");
    assert_eq!(atm_row.ce.ohlc.high, Some(160.0));
    // Close falls back to the leg's own LTP
    assert_eq!(atm_row.ce.ohlc.close, Some(145.2));
}
