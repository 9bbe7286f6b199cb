//! Candle records and timeframe handling

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Raw candle timestamp as delivered by the vendor
///
/// Historical endpoints return ISO-8601 strings (usually with an explicit
/// `+05:30` offset); intraday endpoints have been observed returning epoch
/// milliseconds. Within one series all timestamps share one encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// Epoch milliseconds, UTC
    Millis(i64),
    /// ISO-8601-ish string, offset semantics resolved at grouping time
    Text(String),
}

impl PartialOrd for RawTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RawTimestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Millis(a), Self::Millis(b)) => a.cmp(b),
            // ISO-8601 strings of a single series order lexicographically
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Millis(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Millis(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for RawTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Millis(ms) => write!(f, "{ms}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// OHLCV candle with nullable fields
///
/// Absent fields are missing, not zero; the vendor occasionally emits
/// degenerate rows with fewer than the full seven elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Raw vendor timestamp
    pub ts: RawTimestamp,
    /// Open price
    pub open: Option<f64>,
    /// High price
    pub high: Option<f64>,
    /// Low price
    pub low: Option<f64>,
    /// Close price
    pub close: Option<f64>,
    /// Traded volume
    pub volume: Option<f64>,
    /// Open interest (derivatives only)
    pub open_interest: Option<f64>,
}

impl Candle {
    /// Convert a loose vendor row `[ts, o, h, l, c, volume, oi]` into a
    /// typed candle. Returns `None` when the row has no usable timestamp;
    /// short rows yield missing fields rather than an error.
    #[must_use]
    pub fn from_row(row: &[Value]) -> Option<Self> {
        let ts = match row.first()? {
            Value::Number(n) => {
                let millis = n
                    .as_i64()
                    .or_else(|| n.as_f64().map(|f| f.trunc() as i64))?;
                RawTimestamp::Millis(millis)
            }
            Value::String(s) => RawTimestamp::Text(s.clone()),
            _ => return None,
        };

        let num = |idx: usize| row.get(idx).and_then(Value::as_f64);

        Some(Self {
            ts,
            open: num(1),
            high: num(2),
            low: num(3),
            close: num(4),
            volume: num(5),
            open_interest: num(6),
        })
    }
}

/// Session OHLC extract (first candle of a session, daily OHLC, ...)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Ohlc {
    /// Open price
    #[serde(rename = "o")]
    pub open: Option<f64>,
    /// High price
    #[serde(rename = "h")]
    pub high: Option<f64>,
    /// Low price
    #[serde(rename = "l")]
    pub low: Option<f64>,
    /// Close price
    #[serde(rename = "c")]
    pub close: Option<f64>,
}

impl Ohlc {
    /// Extract the OHLC fields of a candle
    #[must_use]
    pub fn from_candle(candle: &Candle) -> Self {
        Self {
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
        }
    }

    /// True when every field is missing
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.open.is_none() && self.high.is_none() && self.low.is_none() && self.close.is_none()
    }
}

/// Live quote extract from the market-quote endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Last traded price
    pub last_price: Option<f64>,
    /// Vendor-reported daily OHLC, used as a fallback when the candle
    /// endpoints have no data for the session
    pub ohlc: Option<Ohlc>,
}

/// Candle timeframe
///
/// The vendor serves 1-minute, 30-minute, day, week and month natively;
/// every other intraday timeframe is synthesized from 1-minute data by the
/// aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    /// 1 minute bars
    #[serde(rename = "1minute")]
    Minute1,
    /// 5 minute bars
    #[serde(rename = "5minute")]
    Minute5,
    /// 15 minute bars
    #[serde(rename = "15minute")]
    Minute15,
    /// 30 minute bars
    #[serde(rename = "30minute")]
    Minute30,
    /// 60 minute bars
    #[serde(rename = "60minute")]
    Minute60,
    /// 75 minute bars (M75 strategy granularity)
    #[serde(rename = "75minute")]
    Minute75,
    /// Daily bars
    #[serde(rename = "day")]
    Day,
    /// Weekly bars
    #[serde(rename = "week")]
    Week,
    /// Monthly bars
    #[serde(rename = "month")]
    Month,
}

impl Interval {
    /// Vendor API path segment for this timeframe
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Minute1 => "1minute",
            Self::Minute5 => "5minute",
            Self::Minute15 => "15minute",
            Self::Minute30 => "30minute",
            Self::Minute60 => "60minute",
            Self::Minute75 => "75minute",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Short display label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Minute1 => "1m",
            Self::Minute5 => "5m",
            Self::Minute15 => "15m",
            Self::Minute30 => "30m",
            Self::Minute60 => "1h",
            Self::Minute75 => "75m",
            Self::Day => "1D",
            Self::Week => "1W",
            Self::Month => "1M",
        }
    }

    /// Number of 1-minute source candles folded into one bucket, for
    /// timeframes the aggregator synthesizes. `None` means no aggregation.
    #[must_use]
    pub const fn aggregation_factor(&self) -> Option<usize> {
        match self {
            Self::Minute5 => Some(5),
            Self::Minute15 => Some(15),
            Self::Minute30 => Some(30),
            Self::Minute60 => Some(60),
            Self::Minute75 => Some(75),
            _ => None,
        }
    }

    /// True for sub-day timeframes
    #[must_use]
    pub const fn is_intraday(&self) -> bool {
        matches!(
            self,
            Self::Minute1
                | Self::Minute5
                | Self::Minute15
                | Self::Minute30
                | Self::Minute60
                | Self::Minute75
        )
    }

    /// Timeframe to request from the vendor when fetching source candles
    /// for this target: intraday targets are built from 1-minute data,
    /// day/week/month are fetched as-is.
    #[must_use]
    pub const fn native(&self) -> Self {
        if self.is_intraday() { Self::Minute1 } else { *self }
    }

    /// Parse a dashboard timeframe code ("1", "5", "15", "30", "60",
    /// "75", "D")
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "1" => Some(Self::Minute1),
            "5" => Some(Self::Minute5),
            "15" => Some(Self::Minute15),
            "30" => Some(Self::Minute30),
            "60" => Some(Self::Minute60),
            "75" => Some(Self::Minute75),
            "D" | "d" => Some(Self::Day),
            _ => None,
        }
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1minute" => Ok(Self::Minute1),
            "5minute" => Ok(Self::Minute5),
            "15minute" => Ok(Self::Minute15),
            "30minute" => Ok(Self::Minute30),
            "60minute" => Ok(Self::Minute60),
            "75minute" => Ok(Self::Minute75),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(format!("unknown interval: {other}")),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
