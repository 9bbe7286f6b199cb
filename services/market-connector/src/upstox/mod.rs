//! Upstox v2 REST market data adapter
//!
//! Instrument keys contain a `|` separator ("NSE_INDEX|Nifty 50") that the
//! vendor's routers do not always accept raw; every candle request is
//! retried once with the percent-encoded key before giving up. Quote
//! responses key their payload inconsistently (pipe, colon, bare
//! tradingsymbol), so lookups walk the known variations.

pub mod config;

pub use config::UpstoxApiConfig;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use rustc_hash::FxHashMap;
use serde_json::Value;
use services_common::{Candle, Interval, MarketDataError, MarketDataProvider, Ohlc, Quote, QuoteProvider};
use std::time::Duration;
use tracing::{debug, warn};

/// Upstox v2 REST client for candles and quotes
pub struct UpstoxMarketData {
    client: Client,
    config: UpstoxApiConfig,
    access_token: String,
}

impl UpstoxMarketData {
    /// Create a new adapter holding a ready access token
    pub fn new(access_token: String, config: UpstoxApiConfig) -> Result<Self, MarketDataError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MarketDataError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            config,
            access_token,
        })
    }

    /// GET a vendor endpoint and parse the JSON body
    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, MarketDataError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("Accept", "application/json")
            .header("Api-Version", "2.0")
            .send()
            .await
            .map_err(|e| MarketDataError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(MarketDataError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarketDataError::Vendor {
                status: status.as_u16(),
                message: vendor_error_message(&body),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| MarketDataError::Decode(e.to_string()))
    }

    /// Fetch a candle endpoint, retrying once with the percent-encoded
    /// instrument key when the vendor rejects the raw form
    async fn fetch_candles(
        &self,
        url: String,
        alt_url: String,
    ) -> Result<Vec<Candle>, MarketDataError> {
        match self.get_json(&url, &[]).await {
            Ok(payload) => Ok(parse_candle_payload(&payload)),
            Err(MarketDataError::Vendor { status, message }) => {
                warn!("Candle request failed (HTTP {status}: {message}), retrying with encoded key");
                let payload = self.get_json(&alt_url, &[]).await?;
                Ok(parse_candle_payload(&payload))
            }
            Err(e) => Err(e),
        }
    }

    /// Extract an LTP from a quote data map, walking key variations
    fn ltp_from_data(data: &Value, instrument_key: &str) -> Option<f64> {
        let map = data.as_object()?;

        for variation in key_variations(instrument_key) {
            if let Some(price) = map.get(&variation).and_then(last_price_of) {
                debug!("Found LTP via response key {variation}");
                return Some(price);
            }
        }

        // Last resort: any entry carrying a price
        for (key, item) in map {
            if let Some(price) = last_price_of(item) {
                debug!("Found LTP via fallback response key {key}");
                return Some(price);
            }
        }

        None
    }
}

#[async_trait]
impl MarketDataProvider for UpstoxMarketData {
    async fn historical_candles(
        &self,
        instrument_key: &str,
        interval: Interval,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let base = &self.config.base_url;
        let url = format!(
            "{base}/historical-candle/{instrument_key}/{}/{to}/{from}",
            interval.as_str()
        );
        let alt_url = format!(
            "{base}/historical-candle/{}/{}/{to}/{from}",
            urlencoding::encode(instrument_key),
            interval.as_str()
        );
        self.fetch_candles(url, alt_url).await
    }

    async fn intraday_candles(
        &self,
        instrument_key: &str,
        interval: Interval,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let base = &self.config.base_url;
        let url = format!(
            "{base}/historical-candle/intraday/{instrument_key}/{}",
            interval.as_str()
        );
        let alt_url = format!(
            "{base}/historical-candle/intraday/{}/{}",
            urlencoding::encode(instrument_key),
            interval.as_str()
        );
        self.fetch_candles(url, alt_url).await
    }
}

#[async_trait]
impl QuoteProvider for UpstoxMarketData {
    async fn ltp(&self, instrument_key: &str) -> Result<Option<f64>, MarketDataError> {
        let url = format!("{}/market-quote/ltp", self.config.base_url);
        let payload = self.get_json(&url, &[("symbol", instrument_key)]).await?;

        let data = &payload["data"];
        if let Some(price) = Self::ltp_from_data(data, instrument_key) {
            return Ok(Some(price));
        }

        // The LTP endpoint frequently returns success with an empty data
        // map for equities outside market hours; the quotes endpoints
        // still answer there.
        let empty = data.as_object().is_none_or(serde_json::Map::is_empty);
        if empty && instrument_key.contains("NSE_EQ") {
            warn!("LTP endpoint returned no data for {instrument_key}, trying quote endpoints");
            let colon_key = instrument_key.replace('|', ":");
            let fallback_requests = [
                ("market-quote/quotes", instrument_key),
                ("market-quote/quotes", colon_key.as_str()),
                ("market-quote/full", instrument_key),
                ("market-quote/full", colon_key.as_str()),
            ];

            for (endpoint, symbol) in fallback_requests {
                let url = format!("{}/{endpoint}", self.config.base_url);
                match self.get_json(&url, &[("symbol", symbol)]).await {
                    Ok(fallback) => {
                        if let Some(price) = Self::ltp_from_data(&fallback["data"], instrument_key)
                        {
                            return Ok(Some(price));
                        }
                    }
                    Err(e) => {
                        warn!("Quote fallback {endpoint} failed for {symbol}: {e}");
                    }
                }
            }
        }

        Ok(None)
    }

    async fn quotes(
        &self,
        instrument_keys: &[String],
    ) -> Result<FxHashMap<String, Quote>, MarketDataError> {
        if instrument_keys.is_empty() {
            return Ok(FxHashMap::default());
        }

        let url = format!("{}/market-quote/quotes", self.config.base_url);
        let joined = instrument_keys.join(",");
        let payload = self.get_json(&url, &[("symbol", joined.as_str())]).await?;

        let mut quotes = FxHashMap::default();
        if let Some(map) = payload["data"].as_object() {
            for (key, item) in map {
                quotes.insert(
                    key.clone(),
                    Quote {
                        last_price: last_price_of(item),
                        ohlc: session_ohlc_of(item),
                    },
                );
            }
        }

        Ok(quotes)
    }
}

/// Convert the vendor candle payload `{"data":{"candles":[[...],...]}}`
/// into typed candles, dropping malformed rows
fn parse_candle_payload(payload: &Value) -> Vec<Candle> {
    let Some(rows) = payload["data"]["candles"].as_array() else {
        debug!("Candle payload carried no data.candles array");
        return Vec::new();
    };

    let mut candles = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;
    for row in rows {
        match row.as_array().and_then(|r| Candle::from_row(r)) {
            Some(candle) => candles.push(candle),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        warn!("Dropped {dropped} malformed candle rows from vendor payload");
    }

    candles
}

/// Response-key variations under which the vendor may report an instrument
fn key_variations(instrument_key: &str) -> Vec<String> {
    let mut variations = vec![instrument_key.replace('|', ":"), instrument_key.to_string()];
    if let Some((_, suffix)) = instrument_key.split_once('|') {
        variations.push(suffix.to_string());
    }
    variations.dedup();
    variations
}

/// Pull a last traded price out of a quote item
fn last_price_of(item: &Value) -> Option<f64> {
    item.get("last_price")
        .and_then(Value::as_f64)
        .or_else(|| item.get("ltp").and_then(Value::as_f64))
        .or_else(|| item.get("ltp_price").and_then(Value::as_f64))
}

/// Pull the vendor-reported daily OHLC out of a quote item
fn session_ohlc_of(item: &Value) -> Option<Ohlc> {
    let ohlc = item.get("ohlc")?;
    let field = |name: &str| ohlc.get(name).and_then(Value::as_f64);
    let parsed = Ohlc {
        open: field("open"),
        high: field("high"),
        low: field("low"),
        close: field("close"),
    };
    if parsed.is_empty() { None } else { Some(parsed) }
}

/// Best-effort extraction of the vendor's error message from a body
fn vendor_error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<Value>(body) {
        if let Some(message) = parsed
            .get("message")
            .or_else(|| parsed.get("error"))
            .and_then(Value::as_str)
        {
            return message.to_string();
        }
        if let Some(errors) = parsed.get("errors").and_then(Value::as_array) {
            if let Some(message) = errors
                .first()
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
            {
                return message.to_string();
            }
        }
    }
    body.chars().take(200).collect()
}
