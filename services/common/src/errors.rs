//! Common error types for market data access

use thiserror::Error;

/// Market data access error types
///
/// Every variant is recoverable for the level calculators: the fetch plan
/// treats an error the same as an empty candle batch and degrades to
/// null-valued levels.
#[derive(Debug, Error)]
pub enum MarketDataError {
    /// Network-level failure before a vendor response was received
    #[error("transport error: {0}")]
    Transport(String),

    /// Vendor rejected the request
    #[error("vendor returned HTTP {status}: {message}")]
    Vendor {
        /// HTTP status code
        status: u16,
        /// Vendor error message, if any
        message: String,
    },

    /// Vendor response did not match the expected payload shape
    #[error("malformed vendor payload: {0}")]
    Decode(String),

    /// Access token missing, expired, or rejected
    #[error("authorization required")]
    Unauthorized,
}
