//! Option-chain instrument records
//!
//! Plain data extracted from the instrument master, shaped for the chain
//! assembler: per-strike CE/PE legs of a single expiry.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// One tradeable option leg
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionLeg {
    /// Vendor instrument key (e.g. "NSE_FO|40083")
    pub instrument_key: String,
    /// Exchange tradingsymbol (e.g. "NIFTY24JAN21500CE")
    pub tradingsymbol: String,
    /// Exchange token, preferred by some endpoints
    pub exchange_token: Option<u32>,
}

impl OptionLeg {
    /// Key under which the batch quote endpoint reports this leg
    #[must_use]
    pub fn response_key(&self) -> String {
        format!("NSE_FO:{}", self.tradingsymbol)
    }
}

/// CE/PE legs available at one strike
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikeLegs {
    /// Call leg
    pub call: Option<OptionLeg>,
    /// Put leg
    pub put: Option<OptionLeg>,
}

/// Option instruments of one underlying at its nearest expiry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionChainInstruments {
    /// Underlying option symbol prefix (NIFTY, BANKNIFTY, ...)
    pub underlying: String,
    /// Expiry shared by every leg in this set
    pub expiry: NaiveDate,
    /// Legs keyed by integer strike
    pub by_strike: FxHashMap<i64, StrikeLegs>,
}

impl OptionChainInstruments {
    /// Legs at a strike, if the instrument master listed any
    #[must_use]
    pub fn legs_at(&self, strike: i64) -> Option<&StrikeLegs> {
        self.by_strike.get(&strike)
    }
}
