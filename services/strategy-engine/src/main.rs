//! Strategy Levels Service
//!
//! Authenticates against Upstox, then computes and logs the M75/Box
//! strategy levels for the configured symbols, optionally on a polling
//! loop. The one-time OAuth authorization code is exchanged with
//! `--auth-code`; afterwards the cached session token is reused until it
//! expires.

use anyhow::{Context, Result};
use auth::{UpstoxAuth, UpstoxConfig};
use clap::Parser;
use market_connector::{InstrumentService, UpstoxApiConfig, UpstoxMarketData};
use services_common::QuoteProvider;
use services_common::constants::symbols;
use std::str::FromStr;
use std::time::Duration;
use strategy_engine::chain::{ChainRequest, StrategyKind, build_option_chain};
use strategy_engine::snapshot::underlying_snapshot;
use strategy_engine::trading_day::today_ist;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SERVICE_NAME: &str = "strategy-engine";

/// Strategy level computation service
#[derive(Debug, Parser)]
#[command(name = SERVICE_NAME, about = "Compute M75/Box strategy levels from Upstox market data")]
struct Args {
    /// Friendly symbols to track (comma separated)
    #[arg(long, value_delimiter = ',', default_value = "NIFTY")]
    symbols: Vec<String>,

    /// Dashboard timeframe code: 1, 5, 15, 30, 60, 75 or D
    #[arg(long, default_value = "5")]
    timeframe: String,

    /// Strategy: m75 or box
    #[arg(long, default_value = "box")]
    strategy: String,

    /// Poll interval in seconds; compute once and exit when 0
    #[arg(long, default_value_t = 0)]
    poll_secs: u64,

    /// One-time OAuth authorization code to exchange and cache
    #[arg(long)]
    auth_code: Option<String>,

    /// Also build the option chain for symbols with listed options
    #[arg(long, default_value_t = false)]
    chain: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    info!("Starting Strategy Levels Service v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let strategy = StrategyKind::from_str(&args.strategy)
        .map_err(|e| anyhow::anyhow!(e))
        .context("invalid --strategy")?;
    let interval = match strategy {
        // The M75 strategy is defined on 75-minute candles
        StrategyKind::M75 => services_common::Interval::Minute75,
        StrategyKind::Box => services_common::Interval::from_code(&args.timeframe)
            .context("invalid --timeframe (expected 1, 5, 15, 30, 60, 75 or D)")?,
    };

    let auth = UpstoxAuth::new(UpstoxConfig::from_env()?)?;

    if let Some(code) = &args.auth_code {
        info!("Exchanging authorization code for an access token");
        auth.exchange_code(code).await?;
    }

    let access_token = match auth.authenticate().await {
        Ok(token) => token,
        Err(e) => {
            error!("{e:#}");
            return Err(e);
        }
    };

    let market_data = UpstoxMarketData::new(access_token, UpstoxApiConfig::default())?;
    let instruments = InstrumentService::new()?;

    loop {
        let today = today_ist();

        for symbol in &args.symbols {
            let instrument_key = symbols::instrument_key(symbol)
                .map_or_else(|| symbol.clone(), ToString::to_string);

            let ltp = match market_data.ltp(&instrument_key).await {
                Ok(ltp) => ltp,
                Err(e) => {
                    warn!("LTP fetch failed for {symbol}: {e}");
                    None
                }
            };

            let snapshot =
                underlying_snapshot(&market_data, &instrument_key, strategy, today, ltp).await;

            info!(
                "{symbol}: ltp={:?} pl3={:?} conditions={:?}",
                snapshot.ltp, snapshot.pl3, snapshot.m75_conditions
            );
            for timeframe in &snapshot.timeframes {
                info!(
                    "{symbol} [{}]: ohlc={:?} box={:?}",
                    timeframe.timeframe, timeframe.ohlc, timeframe.box_values
                );
            }

            if args.chain {
                if let Some(ltp) = ltp {
                    log_option_chain(&market_data, &instruments, symbol, ltp, interval, strategy, today)
                        .await;
                } else {
                    warn!("Skipping option chain for {symbol}: no LTP");
                }
            }
        }

        if args.poll_secs == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_secs(args.poll_secs)).await;
    }

    Ok(())
}

/// Build and log the option chain of one underlying
async fn log_option_chain(
    market_data: &UpstoxMarketData,
    instruments: &InstrumentService,
    symbol: &str,
    ltp: f64,
    interval: services_common::Interval,
    strategy: StrategyKind,
    today: chrono::NaiveDate,
) {
    let index_code = symbols::index_code(symbol);

    let chain_instruments = match instruments.option_chain_instruments(&index_code).await {
        Ok(Some(chain_instruments)) => chain_instruments,
        Ok(None) => {
            warn!("No option chain available for {symbol}");
            return;
        }
        Err(e) => {
            warn!("Instrument master unavailable for {symbol}: {e}");
            return;
        }
    };

    let request = ChainRequest {
        interval,
        strategy,
        today,
        strike_step: symbols::strike_step(symbol),
    };

    let chain =
        build_option_chain(market_data, market_data, &chain_instruments, ltp, &request).await;

    info!(
        "{symbol} chain (expiry {}): {} strikes around ATM",
        chain.expiry,
        chain.strikes.len()
    );
    for row in &chain.strikes {
        info!(
            "  {}: CE ltp={:?} ohlc={:?} | PE ltp={:?} ohlc={:?}",
            row.strike, row.ce.ltp, row.ce.ohlc, row.pe.ltp, row.pe.ohlc
        );
    }
}

/// Initialize tracing with environment filter
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=info", SERVICE_NAME.replace('-', "_")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
