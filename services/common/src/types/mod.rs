//! Strongly-typed domain records

pub mod candle;
pub mod instrument;
pub mod levels;

pub use candle::*;
pub use instrument::*;
pub use levels::*;
