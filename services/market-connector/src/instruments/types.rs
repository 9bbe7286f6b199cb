//! Instrument master record types
//!
//! The Upstox master ships as a CSV with loosely-typed columns; rows are
//! converted into the typed `Instrument` record at parse time and the raw
//! CSV shape never leaves this module.

use chrono::NaiveDate;
use serde::Deserialize;

/// Instrument classification derived from the vendor's type column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentType {
    /// Equity/stock instrument
    Equity,
    /// Index instrument
    Index,
    /// Future contract
    Future,
    /// Index option (OPTIDX)
    IndexOption,
    /// Stock option (OPTSTK)
    StockOption,
    /// Anything else in the master
    Other,
}

impl InstrumentType {
    /// Map the vendor's instrument type column
    #[must_use]
    pub fn from_vendor(raw: &str) -> Self {
        match raw {
            "EQ" | "EQUITY" => Self::Equity,
            "INDEX" => Self::Index,
            "FUTIDX" | "FUTSTK" | "FUT" => Self::Future,
            "OPTIDX" => Self::IndexOption,
            "OPTSTK" => Self::StockOption,
            _ => Self::Other,
        }
    }

    /// True for option contracts of either kind
    #[must_use]
    pub const fn is_option(&self) -> bool {
        matches!(self, Self::IndexOption | Self::StockOption)
    }
}

/// Option side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKind {
    /// Call option
    Call,
    /// Put option
    Put,
}

/// One instrument master entry
#[derive(Debug, Clone)]
pub struct Instrument {
    /// Vendor instrument key (e.g. "NSE_FO|40083")
    pub instrument_key: String,
    /// Exchange token
    pub exchange_token: Option<u32>,
    /// Exchange tradingsymbol
    pub tradingsymbol: String,
    /// Display name
    pub name: String,
    /// Exchange segment (NSE_EQ, NSE_FO, NSE_INDEX, ...)
    pub exchange: String,
    /// Instrument classification
    pub instrument_type: InstrumentType,
    /// Option side, for options
    pub option_type: Option<OptionKind>,
    /// Expiry date, for derivatives
    pub expiry: Option<NaiveDate>,
    /// Strike price, for options
    pub strike: Option<f64>,
    /// Lot size
    pub lot_size: u32,
}

/// Raw CSV row of the Upstox instrument master
///
/// Numeric columns arrive as floats or empty strings; everything optional
/// so one odd row never sinks the batch.
#[derive(Debug, Deserialize)]
pub struct UpstoxInstrumentCsv {
    /// Vendor instrument key
    pub instrument_key: String,
    /// Exchange token
    #[serde(default)]
    pub exchange_token: Option<f64>,
    /// Tradingsymbol
    #[serde(default)]
    pub tradingsymbol: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Expiry date string (YYYY-MM-DD)
    #[serde(default)]
    pub expiry: Option<String>,
    /// Strike price
    #[serde(default)]
    pub strike: Option<f64>,
    /// Lot size
    #[serde(default)]
    pub lot_size: Option<f64>,
    /// Vendor instrument type code
    #[serde(default)]
    pub instrument_type: String,
    /// Option type code ("CE"/"PE")
    #[serde(default)]
    pub option_type: Option<String>,
    /// Exchange segment
    #[serde(default)]
    pub exchange: String,
}

impl From<UpstoxInstrumentCsv> for Instrument {
    fn from(row: UpstoxInstrumentCsv) -> Self {
        let instrument_type = InstrumentType::from_vendor(&row.instrument_type);

        // Some masters leave option_type blank and encode the side in the
        // tradingsymbol suffix instead
        let option_type = match row.option_type.as_deref() {
            Some("CE") => Some(OptionKind::Call),
            Some("PE") => Some(OptionKind::Put),
            _ if instrument_type.is_option() => {
                if row.tradingsymbol.ends_with("CE") {
                    Some(OptionKind::Call)
                } else if row.tradingsymbol.ends_with("PE") {
                    Some(OptionKind::Put)
                } else {
                    None
                }
            }
            _ => None,
        };

        let expiry = row
            .expiry
            .as_deref()
            .filter(|e| !e.is_empty())
            .and_then(|e| NaiveDate::parse_from_str(e, "%Y-%m-%d").ok());

        Self {
            instrument_key: row.instrument_key,
            exchange_token: row.exchange_token.map(|t| t as u32),
            tradingsymbol: row.tradingsymbol,
            name: row.name,
            exchange: row.exchange,
            instrument_type,
            option_type,
            expiry,
            strike: row.strike.filter(|s| *s > 0.0),
            lot_size: row.lot_size.map_or(1, |l| l as u32),
        }
    }
}
