//! Trading-day resolution, grouping and previous-day selection
//!
//! All grouping happens on the IST (UTC+5:30) civil date. Vendor
//! timestamps arrive in several encodings; `resolve_trading_day` applies
//! the documented precedence and malformed timestamps drop their candle
//! with a warning instead of aborting the batch.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use rustc_hash::FxHashMap;
use services_common::constants::market;
use services_common::{Candle, RawTimestamp};
use tracing::warn;

/// The fixed IST offset (UTC+5:30)
#[must_use]
pub fn ist_offset() -> FixedOffset {
    FixedOffset::east_opt(market::IST_UTC_OFFSET_SECS).expect("IST offset is a valid offset")
}

/// Current civil date in IST
#[must_use]
pub fn today_ist() -> NaiveDate {
    Utc::now().with_timezone(&ist_offset()).date_naive()
}

/// Resolve a raw vendor timestamp to an IST wall-clock datetime
///
/// Precedence: numeric values are epoch milliseconds UTC shifted to IST;
/// strings carrying `+05:30` are already IST wall time (offset stripped);
/// strings in UTC (`Z`/`+00:00`) are shifted; anything else parses as
/// naive local time with no shift.
#[must_use]
pub fn resolve_ist_datetime(ts: &RawTimestamp) -> Option<NaiveDateTime> {
    match ts {
        RawTimestamp::Millis(millis) => DateTime::from_timestamp_millis(*millis)
            .map(|dt| dt.with_timezone(&ist_offset()).naive_local()),
        RawTimestamp::Text(text) => resolve_text_timestamp(text),
    }
}

/// Trading day (IST civil date) of a raw vendor timestamp
#[must_use]
pub fn resolve_trading_day(ts: &RawTimestamp) -> Option<NaiveDate> {
    resolve_ist_datetime(ts).map(|dt| dt.date())
}

fn resolve_text_timestamp(text: &str) -> Option<NaiveDateTime> {
    if text.contains("+05:30") {
        let wall_time = text.replace("+05:30", "");
        parse_naive(wall_time.trim())
    } else if text.ends_with('Z') || text.contains("+00:00") {
        DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|dt| dt.with_timezone(&ist_offset()).naive_local())
    } else {
        parse_naive(text)
    }
}

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];

    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            // Daily candles sometimes carry a bare date
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Sort candles ascending by raw timestamp
pub fn sort_by_timestamp(candles: &mut [Candle]) {
    candles.sort_by(|a, b| a.ts.cmp(&b.ts));
}

/// Group candles by IST trading day
///
/// Candles with unparseable timestamps are skipped with a warning. Group
/// members keep insertion order, which is only chronological if the input
/// was sorted; callers re-sort each group before positional processing.
#[must_use]
pub fn group_by_trading_day(candles: &[Candle]) -> FxHashMap<NaiveDate, Vec<Candle>> {
    let mut groups: FxHashMap<NaiveDate, Vec<Candle>> = FxHashMap::default();

    for candle in candles {
        match resolve_trading_day(&candle.ts) {
            Some(day) => groups.entry(day).or_default().push(candle.clone()),
            None => {
                warn!("Skipping candle with unparseable timestamp: {}", candle.ts);
            }
        }
    }

    groups
}

/// Select the previous trading day relative to `today`
///
/// Preferred: the most recent date strictly before today. Near midnight
/// the caller's clock can disagree with the vendor's day boundaries, so
/// when the preferred pick is absent the selector degrades: the most
/// recent available date if it is before today, else the second-most
/// recent when at least two distinct dates exist. Returns `None` when
/// nothing qualifies; callers propagate null levels.
#[must_use]
pub fn select_previous_day(days: &[NaiveDate], today: NaiveDate) -> Option<NaiveDate> {
    let mut sorted = days.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.dedup();

    if let Some(day) = sorted.iter().copied().find(|day| *day < today) {
        return Some(day);
    }

    match sorted.first() {
        Some(most_recent) if *most_recent < today => Some(*most_recent),
        _ if sorted.len() >= 2 => Some(sorted[1]),
        _ => None,
    }
}
