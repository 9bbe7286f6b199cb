//! Instrument master download, caching and option-chain filtering

use crate::instruments::types::{Instrument, OptionKind, UpstoxInstrumentCsv};
use flate2::read::GzDecoder;
use reqwest::Client;
use rustc_hash::FxHashMap;
use services_common::constants::vendor;
use services_common::{MarketDataError, OptionChainInstruments, OptionLeg, StrikeLegs};
use std::io::Read;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Cached snapshot of the instrument master
struct MasterCache {
    fetched_at: Instant,
    instruments: Arc<Vec<Instrument>>,
}

/// Instrument master service with a TTL cache
///
/// The master is a few hundred thousand rows and changes at most daily;
/// one download per TTL window is plenty. A stale snapshot is served when
/// a refresh fails.
pub struct InstrumentService {
    client: Client,
    master_url: String,
    cache_ttl: Duration,
    cache: RwLock<Option<MasterCache>>,
}

impl InstrumentService {
    /// Create a service pointing at the vendor's published master
    pub fn new() -> Result<Self, MarketDataError> {
        Self::with_master_url(vendor::INSTRUMENT_MASTER_URL.to_string())
    }

    /// Create a service with an explicit master URL (tests use this)
    pub fn with_master_url(master_url: String) -> Result<Self, MarketDataError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| MarketDataError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            master_url,
            cache_ttl: Duration::from_secs(vendor::INSTRUMENT_CACHE_TTL_SECS),
            cache: RwLock::new(None),
        })
    }

    /// Current instrument master, downloading when the cache is cold or
    /// past its TTL
    pub async fn instruments(&self) -> Result<Arc<Vec<Instrument>>, MarketDataError> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.as_ref() {
                if entry.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(Arc::clone(&entry.instruments));
                }
            }
        }

        match self.download_master().await {
            Ok(instruments) => {
                let instruments = Arc::new(instruments);
                let mut cache = self.cache.write().await;
                *cache = Some(MasterCache {
                    fetched_at: Instant::now(),
                    instruments: Arc::clone(&instruments),
                });
                Ok(instruments)
            }
            Err(e) => {
                let cache = self.cache.read().await;
                if let Some(entry) = cache.as_ref() {
                    warn!("Instrument master refresh failed ({e}), serving stale snapshot");
                    Ok(Arc::clone(&entry.instruments))
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Option instruments of an underlying at the nearest expiry, shaped
    /// for the chain assembler. `None` when the master lists no options
    /// for the symbol (most equities).
    pub async fn option_chain_instruments(
        &self,
        underlying: &str,
    ) -> Result<Option<OptionChainInstruments>, MarketDataError> {
        let instruments = self.instruments().await?;

        let options: Vec<&Instrument> = instruments
            .iter()
            .filter(|i| {
                i.exchange == "NSE_FO"
                    && i.instrument_type.is_option()
                    && i.tradingsymbol.starts_with(underlying)
                    && i.expiry.is_some()
                    && i.strike.is_some()
            })
            .collect();

        if options.is_empty() {
            warn!("No options found for {underlying} in the instrument master");
            return Ok(None);
        }

        // Nearest expiry only; further expiries are a different chain
        let Some(nearest_expiry) = options.iter().filter_map(|i| i.expiry).min() else {
            return Ok(None);
        };

        let mut by_strike: FxHashMap<i64, StrikeLegs> = FxHashMap::default();
        let mut leg_count = 0usize;
        for instrument in options {
            if instrument.expiry != Some(nearest_expiry) {
                continue;
            }
            let Some(strike) = instrument.strike else {
                continue;
            };

            let leg = OptionLeg {
                instrument_key: instrument.instrument_key.clone(),
                tradingsymbol: instrument.tradingsymbol.clone(),
                exchange_token: instrument.exchange_token,
            };

            let legs = by_strike.entry(strike.round() as i64).or_default();
            match instrument.option_type {
                Some(OptionKind::Call) => legs.call = Some(leg),
                Some(OptionKind::Put) => legs.put = Some(leg),
                None => continue,
            }
            leg_count += 1;
        }

        info!("Found {leg_count} {underlying} option legs for expiry {nearest_expiry}");

        Ok(Some(OptionChainInstruments {
            underlying: underlying.to_string(),
            expiry: nearest_expiry,
            by_strike,
        }))
    }

    /// Download and parse the master CSV
    async fn download_master(&self) -> Result<Vec<Instrument>, MarketDataError> {
        info!("Downloading instrument master from {}", self.master_url);
        let start = Instant::now();

        let response = self
            .client
            .get(&self.master_url)
            .send()
            .await
            .map_err(|e| MarketDataError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::Vendor {
                status: status.as_u16(),
                message: "instrument master download failed".to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| MarketDataError::Transport(e.to_string()))?;

        let csv_data = inflate_if_gzipped(&body)?;
        let instruments = parse_master_csv(&csv_data);

        info!(
            "Loaded {} instruments from master CSV in {:?}",
            instruments.len(),
            start.elapsed()
        );
        Ok(instruments)
    }
}

/// The published master is gzipped; mock servers in tests serve it plain
fn inflate_if_gzipped(body: &[u8]) -> Result<String, MarketDataError> {
    if body.starts_with(&[0x1f, 0x8b]) {
        let mut decoder = GzDecoder::new(body);
        let mut csv_data = String::new();
        decoder
            .read_to_string(&mut csv_data)
            .map_err(|e| MarketDataError::Decode(format!("gzip inflate failed: {e}")))?;
        Ok(csv_data)
    } else {
        String::from_utf8(body.to_vec())
            .map_err(|e| MarketDataError::Decode(format!("master CSV is not UTF-8: {e}")))
    }
}

/// Parse master CSV rows, tolerating bad rows
fn parse_master_csv(csv_data: &str) -> Vec<Instrument> {
    let mut reader = csv::Reader::from_reader(csv_data.as_bytes());
    let mut instruments = Vec::new();
    let mut error_count = 0usize;

    for result in reader.deserialize::<UpstoxInstrumentCsv>() {
        match result {
            Ok(row) => instruments.push(row.into()),
            Err(_e) => {
                error_count += 1;
                if error_count <= 10 {
                    warn!("Failed to parse instrument CSV row");
                }
            }
        }
    }

    if error_count > 0 {
        warn!("Total CSV parse errors: {error_count}");
    }

    instruments
}
