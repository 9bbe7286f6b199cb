//! Authentication module for brokerage API access
//!
//! Handles the Upstox OAuth2 flow: authorization URL construction,
//! code-to-token exchange, refresh-token grants, and on-disk session
//! caching so a restart does not force a fresh browser login.

pub mod upstox;

pub use upstox::{SessionCache, UpstoxAuth, UpstoxConfig};
