//! Domain constants shared across services

/// Market/calendar constants
pub mod market {
    /// IST offset from UTC in seconds (+05:30)
    pub const IST_UTC_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;
}

/// Strategy parameters
pub mod strategy {
    /// Relative distance below which a price is "nearing" an M75 level (0.5%)
    pub const NEAR_LEVEL_THRESHOLD: f64 = 0.005;

    /// Relative distance for box target/reversal proximity flags (0.2%)
    pub const BOX_PROXIMITY_THRESHOLD: f64 = 0.002;

    /// PL3 uses the last N aggregated candles of the previous trading day
    pub const PL3_WINDOW_CANDLES: usize = 3;

    /// Calendar days of 1-minute history fetched to cover the PL3 window
    pub const PL3_LOOKBACK_DAYS: i64 = 10;

    /// Historical fallback range when the intraday endpoint has no data
    pub const INTRADAY_FALLBACK_DAYS: i64 = 2;

    /// Historical range for day/week/month first-candle fetches
    pub const DAILY_LOOKBACK_DAYS: i64 = 5;

    /// Daily-candle range used to locate the previous trading day's OHLC
    pub const PREV_DAY_LOOKBACK_DAYS: i64 = 10;

    /// Option chain spans ATM plus/minus this many strikes
    pub const CHAIN_STRIKE_SPAN: i64 = 3;
}

/// Upstox vendor endpoints and cache policy
pub mod vendor {
    /// v2 REST base URL
    pub const BASE_URL: &str = "https://api.upstox.com/v2";

    /// Complete instrument master, gzipped CSV
    pub const INSTRUMENT_MASTER_URL: &str =
        "https://assets.upstox.com/market-quote/instruments/exchange/complete.csv.gz";

    /// Instrument master cache time-to-live in seconds
    pub const INSTRUMENT_CACHE_TTL_SECS: u64 = 3600;
}

/// Friendly symbol to vendor instrument key mapping
pub mod symbols {
    /// Resolve a friendly symbol (NIFTY, RELIANCE, ...) to its Upstox
    /// instrument key. Unknown symbols are passed through by callers.
    #[must_use]
    pub fn instrument_key(friendly: &str) -> Option<&'static str> {
        let key = match friendly {
            "NIFTY" => "NSE_INDEX|Nifty 50",
            "BANKNIFTY" => "NSE_INDEX|Nifty Bank",
            "FINNIFTY" => "NSE_INDEX|Nifty Fin Service",
            "RELIANCE" => "NSE_EQ|RELIANCE",
            "TCS" => "NSE_EQ|TCS",
            "INFY" => "NSE_EQ|INFY",
            "HDFCBANK" => "NSE_EQ|HDFCBANK",
            "HINDUNILVR" => "NSE_EQ|HINDUNILVR",
            "ICICIBANK" => "NSE_EQ|ICICIBANK",
            "BHARTIARTL" => "NSE_EQ|BHARTIARTL",
            "SBIN" => "NSE_EQ|SBIN",
            "BAJFINANCE" => "NSE_EQ|BAJFINANCE",
            "ITC" => "NSE_EQ|ITC",
            "KOTAKBANK" => "NSE_EQ|KOTAKBANK",
            "LT" => "NSE_EQ|LT",
            "AXISBANK" => "NSE_EQ|AXISBANK",
            "ASIANPAINT" => "NSE_EQ|ASIANPAINT",
            "MARUTI" => "NSE_EQ|MARUTI",
            "TITAN" => "NSE_EQ|TITAN",
            "ULTRACEMCO" => "NSE_EQ|ULTRACEMCO",
            "SUNPHARMA" => "NSE_EQ|SUNPHARMA",
            "NESTLEIND" => "NSE_EQ|NESTLEIND",
            "ONGC" => "NSE_EQ|ONGC",
            "WIPRO" => "NSE_EQ|WIPRO",
            "HCLTECH" => "NSE_EQ|HCLTECH",
            "POWERGRID" => "NSE_EQ|POWERGRID",
            "NTPC" => "NSE_EQ|NTPC",
            "TATAMOTORS" => "NSE_EQ|TATAMOTORS",
            "INDUSINDBK" => "NSE_EQ|INDUSINDBK",
            "JSWSTEEL" => "NSE_EQ|JSWSTEEL",
            "TECHM" => "NSE_EQ|TECHM",
            "ADANIENT" => "NSE_EQ|ADANIENT",
            "TATASTEEL" => "NSE_EQ|TATASTEEL",
            "BAJAJFINSV" => "NSE_EQ|BAJAJFINSV",
            "DIVISLAB" => "NSE_EQ|DIVISLAB",
            "HDFCLIFE" => "NSE_EQ|HDFCLIFE",
            "DRREDDY" => "NSE_EQ|DRREDDY",
            "CIPLA" => "NSE_EQ|CIPLA",
            "APOLLOHOSP" => "NSE_EQ|APOLLOHOSP",
            "M&M" => "NSE_EQ|M&M",
            "COALINDIA" => "NSE_EQ|COALINDIA",
            "BPCL" => "NSE_EQ|BPCL",
            "HEROMOTOCO" => "NSE_EQ|HEROMOTOCO",
            "EICHERMOT" => "NSE_EQ|EICHERMOT",
            "ADANIPORTS" => "NSE_EQ|ADANIPORTS",
            "GRASIM" => "NSE_EQ|GRASIM",
            "MARICO" => "NSE_EQ|MARICO",
            "VEDL" => "NSE_EQ|VEDL",
            "PIDILITIND" => "NSE_EQ|PIDILITIND",
            "GODREJCP" => "NSE_EQ|GODREJCP",
            "DABUR" => "NSE_EQ|DABUR",
            _ => return None,
        };
        Some(key)
    }

    /// Strike interval for the option chain of an underlying
    #[must_use]
    pub fn strike_step(friendly: &str) -> i64 {
        let upper = friendly.to_uppercase();
        if upper.contains("BANK") {
            100
        } else {
            // NIFTY, FINNIFTY and most stock options trade on 50-point grids
            50
        }
    }

    /// Option tradingsymbol prefix used to filter the instrument master
    #[must_use]
    pub fn index_code(friendly: &str) -> String {
        let upper = friendly.to_uppercase();
        if upper.contains("NIFTY") && !upper.contains("BANK") && !upper.contains("FIN") {
            "NIFTY".to_string()
        } else if upper.contains("BANK") {
            "BANKNIFTY".to_string()
        } else if upper.contains("FIN") {
            "FINNIFTY".to_string()
        } else {
            upper
        }
    }
}
