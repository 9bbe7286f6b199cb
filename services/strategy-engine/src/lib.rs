//! Strategy Levels Engine
//!
//! Turns raw vendor candles into the M75 and Box strategy levels:
//! - Timeframe aggregation (1-minute source into 5/15/30/60/75-minute)
//! - Trading-day grouping in IST with heterogeneous timestamp handling
//! - Previous-trading-day selection
//! - PL3 / first-candle / previous-day level calculators
//! - Per-level condition evaluation against the live price
//!
//! The computation core is pure; all vendor I/O is injected through the
//! provider traits in `services-common`.

pub mod aggregate;
pub mod chain;
pub mod conditions;
pub mod levels;
pub mod snapshot;
pub mod trading_day;

pub use aggregate::aggregate_candles;
pub use chain::{ChainRequest, OptionChain, StrategyKind, atm_strike, build_option_chain};
pub use conditions::{box_proximity, evaluate_conditions};
pub use levels::{
    compute_box_levels, compute_pl3, compute_previous_day_ohlc, session_first_candle,
};
pub use snapshot::{UnderlyingSnapshot, underlying_snapshot};
pub use trading_day::{
    group_by_trading_day, resolve_trading_day, select_previous_day, sort_by_timestamp, today_ist,
};
