//! Strategy level sets and condition results

use serde::{Deserialize, Serialize};

/// Round a price to 2 decimal places at the output boundary
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// M75 previous-day range levels
///
/// PL3H/PL3L are the highest high and lowest low of the last 225 minutes
/// (3 x 75-minute candles) of the previous trading day; PL3M is their
/// midpoint. All fields are null when no previous trading day or no valid
/// high/low data exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pl3Levels {
    /// Highest high of the window
    pub pl3h: Option<f64>,
    /// Midpoint (pl3h + pl3l) / 2
    pub pl3m: Option<f64>,
    /// Lowest low of the window
    pub pl3l: Option<f64>,
}

impl Pl3Levels {
    /// True when no level could be computed
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pl3h.is_none() && self.pl3m.is_none() && self.pl3l.is_none()
    }
}

/// Informational directional bias attached to box strategy output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bias {
    /// No directional read
    #[default]
    Neutral,
    /// Upward bias
    Bullish,
    /// Downward bias
    Bearish,
}

/// Box strategy values derived from the first candle of the session,
/// combined with the M75 levels and the previous day's full OHLC
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxStrategyValues {
    /// First candle high
    pub fch: Option<f64>,
    /// First candle low
    pub fcl: Option<f64>,
    /// First candle midpoint
    pub fcm: Option<f64>,
    /// Bullish target: fch + 2 * (fch - fcl)
    pub br_t: Option<f64>,
    /// Bullish reversal: fcl + 0.75 * (br_t - fcl)
    pub br_r: Option<f64>,
    /// Bearish target: fcl - 2 * (fch - fcl)
    pub be_t: Option<f64>,
    /// Bearish reversal: fch - 0.75 * (fch - be_t)
    pub be_r: Option<f64>,
    /// M75 high level
    pub pl3h: Option<f64>,
    /// M75 low level
    pub pl3l: Option<f64>,
    /// M75 midpoint
    pub pl3m: Option<f64>,
    /// Previous day high
    pub pdh: Option<f64>,
    /// Previous day low
    pub pdl: Option<f64>,
    /// Previous day open
    pub pdo: Option<f64>,
    /// Previous day close
    pub pdc: Option<f64>,
    /// Informational bias
    pub bias: Bias,
}

/// Discrete condition of the live price relative to an M75 level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelCondition {
    /// Price above PL3H
    Bullish,
    /// Price below PL3L
    Bearish,
    /// Crossed down through PL3M
    BearishBreak,
    /// Crossed up through PL3M
    BullishBreak,
    /// Holding below PL3M
    Below,
    /// Holding above PL3M
    Above,
}

/// Trade signal code attached to a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    /// Buy
    #[serde(rename = "B")]
    Buy,
    /// Buy the opposite side
    #[serde(rename = "BO-S")]
    BuyOpposite,
    /// Watch
    #[serde(rename = "W")]
    Watch,
}

/// Per-level condition/signal/alert triples for the M75 strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct M75Conditions {
    /// PL3H condition
    pub pl3h_condition: Option<LevelCondition>,
    /// PL3M condition
    pub pl3m_condition: Option<LevelCondition>,
    /// PL3L condition
    pub pl3l_condition: Option<LevelCondition>,
    /// PL3H signal
    pub pl3h_signal: Option<Signal>,
    /// PL3M signal
    pub pl3m_signal: Option<Signal>,
    /// PL3L signal
    pub pl3l_signal: Option<Signal>,
    /// Price is within 0.5% of PL3H
    pub pl3h_alert: bool,
    /// Price is within 0.5% of PL3M
    pub pl3m_alert: bool,
    /// Price is within 0.5% of PL3L
    pub pl3l_alert: bool,
}

/// Proximity flags for box strategy targets and reversal zones
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxProximity {
    /// Within 0.2% of the bullish reversal zone
    pub is_near_bull_zone: bool,
    /// Within 0.2% of the bearish reversal zone
    pub is_near_bear_zone: bool,
    /// Within 0.2% of the bullish target
    pub is_near_bull_target: bool,
    /// Within 0.2% of the bearish target
    pub is_near_bear_target: bool,
}
