//! Market data provider contracts
//!
//! The level calculators consume these traits only; the Upstox REST
//! adapter implements them. Both an error and an empty batch mean
//! "no data" to callers, which then walk their fetch plans.

use crate::errors::MarketDataError;
use crate::types::{Candle, Interval, Quote};
use async_trait::async_trait;
use chrono::NaiveDate;
use rustc_hash::FxHashMap;

/// Candle history access at the vendor's native resolutions
/// (1-minute, 30-minute, day, week, month)
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Candles for `[from, to]`, both dates inclusive, in vendor order
    async fn historical_candles(
        &self,
        instrument_key: &str,
        interval: Interval,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Candle>, MarketDataError>;

    /// Candles of the current live session only
    async fn intraday_candles(
        &self,
        instrument_key: &str,
        interval: Interval,
    ) -> Result<Vec<Candle>, MarketDataError>;
}

/// Live quote access
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Last traded price of one instrument
    async fn ltp(&self, instrument_key: &str) -> Result<Option<f64>, MarketDataError>;

    /// Batch quotes; the returned map is keyed exactly as the vendor keyed
    /// its response (callers match key variations themselves)
    async fn quotes(
        &self,
        instrument_keys: &[String],
    ) -> Result<FxHashMap<String, Quote>, MarketDataError>;
}
