//! Run configuration assembled once at startup from CLI arguments.
//!
//! Everything is parsed and validated up front into an immutable
//! [`SniperConfig`] that is passed by reference to each component; nothing
//! downstream reads flags or global state.

use chrono::{Local, NaiveDateTime, TimeZone};
use clap::Parser;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::domain::value_objects::price::Price;

/// Quote asset spent by every order; the CLI takes only the base asset.
pub const QUOTE_ASSET: &str = "USDT";

/// Production REST endpoint, overridable with `--api_server`.
pub const BINANCE_API_BASE: &str = "https://api.binance.com";

const ORDER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Parser)]
#[command(
    name = "listing-sniper",
    about = "Buy a symbol with the full free USDT balance at an exact instant"
)]
pub struct Args {
    /// Binance API key (falls back to BINANCE_API_KEY).
    #[arg(long = "api_key")]
    pub api_key: Option<String>,

    /// Binance API secret (falls back to BINANCE_API_SECRET).
    #[arg(long = "api_secret")]
    pub api_secret: Option<String>,

    /// Base asset to buy, e.g. BTC; the pair is formed against USDT.
    #[arg(long)]
    pub symbol: String,

    /// Local time to fire at, format `YYYY-MM-DD HH:MM:SS`.
    #[arg(long = "order_time")]
    pub order_time: String,

    /// REST endpoint override.
    #[arg(long = "api_server")]
    pub api_server: Option<String>,

    /// Place a limit order instead of a market order.
    #[arg(long, requires = "price")]
    pub limit: bool,

    /// Limit price in the quote asset; required with --limit.
    #[arg(long)]
    pub price: Option<f64>,

    /// Submit to the live order endpoint; without this flag orders go to the
    /// exchange's test endpoint.
    #[arg(long)]
    pub real: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid --order_time {0:?}: expected YYYY-MM-DD HH:MM:SS local time")]
    InvalidOrderTime(String),

    #[error("--order_time {0:?} is ambiguous or nonexistent in the local timezone")]
    AmbiguousOrderTime(String),

    #[error("--limit requires --price")]
    MissingLimitPrice,

    #[error("invalid --price: {0}")]
    InvalidPrice(String),

    #[error("missing API credentials: pass --api_key/--api_secret or set BINANCE_API_KEY/BINANCE_API_SECRET")]
    MissingCredentials,
}

/// Order flavor selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderMode {
    /// Spend the quote balance at whatever the book gives.
    Market,
    /// Rest at a fixed price, GTC.
    Limit { price: Price },
}

/// Immutable run configuration.
#[derive(Debug)]
pub struct SniperConfig {
    pub api_key: String,
    pub api_secret: Zeroizing<String>,
    pub base_asset: String,
    pub quote_asset: String,
    /// Full trading pair, e.g. `BTCUSDT`.
    pub symbol: String,
    /// Raw `--order_time` string, kept for logging.
    pub order_time: String,
    /// Target instant as epoch milliseconds.
    pub target_ms: i64,
    pub mode: OrderMode,
    pub endpoint: String,
    pub live: bool,
}

impl SniperConfig {
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let api_key = args
            .api_key
            .or_else(|| std::env::var("BINANCE_API_KEY").ok())
            .ok_or(ConfigError::MissingCredentials)?;
        let api_secret = args
            .api_secret
            .or_else(|| std::env::var("BINANCE_API_SECRET").ok())
            .map(Zeroizing::new)
            .ok_or(ConfigError::MissingCredentials)?;

        let target_ms = parse_order_time(&args.order_time)?;

        let mode = if args.limit {
            let raw = args.price.ok_or(ConfigError::MissingLimitPrice)?;
            let price = Price::new(raw).map_err(ConfigError::InvalidPrice)?;
            if price.value() == 0.0 {
                return Err(ConfigError::InvalidPrice("price must be positive".into()));
            }
            OrderMode::Limit { price }
        } else {
            OrderMode::Market
        };

        let base_asset = args.symbol.trim().to_uppercase();
        let symbol = format!("{base_asset}{QUOTE_ASSET}");

        Ok(Self {
            api_key,
            api_secret,
            base_asset,
            quote_asset: QUOTE_ASSET.to_string(),
            symbol,
            order_time: args.order_time,
            target_ms,
            mode,
            endpoint: args
                .api_server
                .unwrap_or_else(|| BINANCE_API_BASE.to_string()),
            live: args.real,
        })
    }
}

/// Parse a local wall-clock string into epoch milliseconds.
pub fn parse_order_time(raw: &str) -> Result<i64, ConfigError> {
    let naive = NaiveDateTime::parse_from_str(raw, ORDER_TIME_FORMAT)
        .map_err(|_| ConfigError::InvalidOrderTime(raw.to_string()))?;
    let local = Local
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| ConfigError::AmbiguousOrderTime(raw.to_string()))?;
    Ok(local.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            api_key: Some("key".to_string()),
            api_secret: Some("secret".to_string()),
            symbol: "btc".to_string(),
            order_time: "2026-08-07 12:00:00".to_string(),
            api_server: None,
            limit: false,
            price: None,
            real: false,
        }
    }

    #[test]
    fn test_parse_order_time_valid() {
        let ms = parse_order_time("2026-08-07 12:00:00").unwrap();
        let naive = NaiveDateTime::parse_from_str("2026-08-07 12:00:00", ORDER_TIME_FORMAT).unwrap();
        let expected = Local.from_local_datetime(&naive).single().unwrap();
        assert_eq!(ms, expected.timestamp_millis());
    }

    #[test]
    fn test_parse_order_time_rejects_bad_format() {
        assert!(matches!(
            parse_order_time("07/08/2026 12:00"),
            Err(ConfigError::InvalidOrderTime(_))
        ));
        assert!(matches!(
            parse_order_time("2026-08-07T12:00:00Z"),
            Err(ConfigError::InvalidOrderTime(_))
        ));
    }

    #[test]
    fn test_symbol_pair_assembly() {
        let config = SniperConfig::from_args(base_args()).unwrap();
        assert_eq!(config.base_asset, "BTC");
        assert_eq!(config.symbol, "BTCUSDT");
        assert_eq!(config.quote_asset, "USDT");
    }

    #[test]
    fn test_defaults_to_dry_run_and_production_endpoint() {
        let config = SniperConfig::from_args(base_args()).unwrap();
        assert!(!config.live);
        assert_eq!(config.endpoint, BINANCE_API_BASE);
        assert_eq!(config.mode, OrderMode::Market);
    }

    #[test]
    fn test_limit_mode_requires_price() {
        let mut args = base_args();
        args.limit = true;
        assert!(matches!(
            SniperConfig::from_args(args),
            Err(ConfigError::MissingLimitPrice)
        ));
    }

    #[test]
    fn test_limit_mode_carries_price() {
        let mut args = base_args();
        args.limit = true;
        args.price = Some(3.0001);
        let config = SniperConfig::from_args(args).unwrap();
        match config.mode {
            OrderMode::Limit { price } => assert_eq!(price.value(), 3.0001),
            OrderMode::Market => panic!("expected limit mode"),
        }
    }

    #[test]
    fn test_limit_mode_rejects_zero_price() {
        let mut args = base_args();
        args.limit = true;
        args.price = Some(0.0);
        assert!(matches!(
            SniperConfig::from_args(args),
            Err(ConfigError::InvalidPrice(_))
        ));
    }

    #[test]
    fn test_cli_limit_requires_price_flag() {
        let err = Args::try_parse_from([
            "listing-sniper",
            "--symbol",
            "BTC",
            "--order_time",
            "2026-08-07 12:00:00",
            "--limit",
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn test_cli_full_parse() {
        let args = Args::try_parse_from([
            "listing-sniper",
            "--api_key",
            "k",
            "--api_secret",
            "s",
            "--symbol",
            "NEW",
            "--order_time",
            "2026-08-07 08:00:00",
            "--limit",
            "--price",
            "0.52",
            "--real",
        ])
        .unwrap();
        assert_eq!(args.symbol, "NEW");
        assert!(args.limit);
        assert_eq!(args.price, Some(0.52));
        assert!(args.real);
    }
}
