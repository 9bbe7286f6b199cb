//! Upstox market data connector
//!
//! REST adapter for the Upstox v2 API: candle history, live quotes, and
//! the instrument master. Implements the provider contracts consumed by
//! the strategy engine; all vendor payloads are converted to the typed
//! records in `services-common` at this boundary.

pub mod instruments;
pub mod upstox;

pub use instruments::{Instrument, InstrumentService, InstrumentType, OptionKind};
pub use upstox::{UpstoxApiConfig, UpstoxMarketData};
