//! Instrument master access and option-chain filtering

pub mod service;
pub mod types;

pub use service::InstrumentService;
pub use types::{Instrument, InstrumentType, OptionKind};
