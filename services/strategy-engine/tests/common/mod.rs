//! Shared fixtures for strategy-engine tests

use async_trait::async_trait;
use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use services_common::{
    Candle, Interval, MarketDataError, MarketDataProvider, Quote, QuoteProvider, RawTimestamp,
};

/// Canned-response provider for calculator tests
///
/// Responses are keyed by the requested interval; instrument keys are
/// ignored so one stub serves underlying and leg fetches alike.
#[derive(Debug, Default)]
pub struct StubProvider {
    pub intraday: FxHashMap<Interval, Vec<Candle>>,
    pub historical: FxHashMap<Interval, Vec<Candle>>,
    pub fail_intraday: bool,
    pub fail_historical: bool,
}

impl StubProvider {
    pub fn with_historical(mut self, interval: Interval, candles: Vec<Candle>) -> Self {
        self.historical.insert(interval, candles);
        self
    }

    pub fn with_intraday(mut self, interval: Interval, candles: Vec<Candle>) -> Self {
        self.intraday.insert(interval, candles);
        self
    }
}

#[async_trait]
impl MarketDataProvider for StubProvider {
    async fn historical_candles(
        &self,
        _instrument_key: &str,
        interval: Interval,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<Vec<Candle>, MarketDataError> {
        if self.fail_historical {
            return Err(MarketDataError::Vendor {
                status: 500,
                message: "stub historical failure".to_string(),
            });
        }
        Ok(self.historical.get(&interval).cloned().unwrap_or_default())
    }

    async fn intraday_candles(
        &self,
        _instrument_key: &str,
        interval: Interval,
    ) -> Result<Vec<Candle>, MarketDataError> {
        if self.fail_intraday {
            return Err(MarketDataError::Vendor {
                status: 500,
                message: "stub intraday failure".to_string(),
            });
        }
        Ok(self.intraday.get(&interval).cloned().unwrap_or_default())
    }
}

/// Canned batch-quote provider
#[derive(Debug, Default)]
pub struct StubQuotes {
    pub by_key: FxHashMap<String, Quote>,
}

#[async_trait]
impl QuoteProvider for StubQuotes {
    async fn ltp(&self, instrument_key: &str) -> Result<Option<f64>, MarketDataError> {
        Ok(self
            .by_key
            .get(instrument_key)
            .and_then(|quote| quote.last_price))
    }

    async fn quotes(
        &self,
        _instrument_keys: &[String],
    ) -> Result<FxHashMap<String, Quote>, MarketDataError> {
        Ok(self.by_key.clone())
    }
}

/// IST-stamped 1-minute candle
pub fn minute_candle(day: NaiveDate, hour: u32, minute: u32, high: f64, low: f64) -> Candle {
    Candle {
        ts: RawTimestamp::Text(format!("{day}T{hour:02}:{minute:02}:00+05:30")),
        open: Some((high + low) / 2.0),
        high: Some(high),
        low: Some(low),
        close: Some((high + low) / 2.0),
        volume: Some(100.0),
        open_interest: Some(0.0),
    }
}

/// Full NSE session (09:15 to 15:29, 375 candles) of 1-minute candles
/// with linearly drifting highs/lows: candle `i` has high `base + i` and
/// low `base - 10 + i`
pub fn session_minutes(day: NaiveDate, base: f64) -> Vec<Candle> {
    (0..375)
        .map(|i| {
            let hour = 9 + (15 + i) / 60;
            let minute = (15 + i) % 60;
            minute_candle(day, hour, minute, base + i as f64, base - 10.0 + i as f64)
        })
        .collect()
}

/// Daily candle stamped at midnight IST
pub fn daily_candle(day: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Candle {
    Candle {
        ts: RawTimestamp::Text(format!("{day}T00:00:00+05:30")),
        open: Some(open),
        high: Some(high),
        low: Some(low),
        close: Some(close),
        volume: Some(1_000_000.0),
        open_interest: Some(0.0),
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}
