//! Command-line arguments and their validation
//!
//! Everything that can be checked without the network is checked here, so
//! a bad invocation never reaches the signing client.

use clap::{ArgGroup, Parser, ValueEnum};
use std::path::PathBuf;
use tracing::warn;
use tradebot_core::Fixed;
use tradebot_exchanges::binance::auth::{API_KEY_ENV, API_SECRET_ENV};
use tradebot_exchanges::binance::DEFAULT_TIMEOUT_MS;
use tradebot_exchanges::{BinanceConfig, Environment, ExchangeError, OrderRequest, OrderSide, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliOrderType {
    #[value(name = "MARKET")]
    Market,
    #[value(name = "LIMIT")]
    Limit,
    #[value(name = "STOP_LIMIT")]
    StopLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliSide {
    #[value(name = "BUY")]
    Buy,
    #[value(name = "SELL")]
    Sell,
}

impl From<CliSide> for OrderSide {
    fn from(side: CliSide) -> Self {
        match side {
            CliSide::Buy => OrderSide::Buy,
            CliSide::Sell => OrderSide::Sell,
        }
    }
}

/// Binance USDT-M futures trading CLI
#[derive(Debug, Parser)]
#[command(name = "tradebot", version, about = "Place signed orders on Binance USDT-M futures")]
#[command(group(ArgGroup::new("environment").required(true).args(["testnet", "mainnet"])))]
pub struct Cli {
    /// Order type
    #[arg(value_enum, ignore_case = true)]
    pub order_type: CliOrderType,

    /// Symbol, e.g. BTCUSDT
    pub symbol: String,

    /// BUY or SELL
    #[arg(value_enum, ignore_case = true)]
    pub side: CliSide,

    /// Quantity (in contract size)
    #[arg(allow_negative_numbers = true)]
    pub quantity: Fixed,

    /// Limit price for LIMIT or STOP_LIMIT
    #[arg(long)]
    pub price: Option<Fixed>,

    /// Stop (trigger) price for STOP_LIMIT
    #[arg(long)]
    pub stop: Option<Fixed>,

    /// Binance API key
    #[arg(long = "api_key", env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Binance API secret
    #[arg(long = "api_secret", env = API_SECRET_ENV, hide_env_values = true)]
    pub api_secret: Option<String>,

    /// Trade on the futures testnet
    #[arg(long)]
    pub testnet: bool,

    /// Trade on the live futures exchange
    #[arg(long)]
    pub mainnet: bool,

    /// Override the exchange base URL
    #[arg(long = "base-url")]
    pub base_url: Option<String>,

    /// Append-only request/response log
    #[arg(long = "log-file", default_value = "bot.log")]
    pub log_file: PathBuf,

    /// Per-request timeout in milliseconds
    #[arg(long = "timeout-ms", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,
}

impl Cli {
    pub fn environment(&self) -> Environment {
        if self.mainnet {
            Environment::Production
        } else {
            Environment::Testnet
        }
    }

    /// Check the invocation and produce the client config and order
    pub fn validate(&self) -> Result<(BinanceConfig, OrderRequest)> {
        let (api_key, api_secret) = match (non_empty(&self.api_key), non_empty(&self.api_secret)) {
            (Some(key), Some(secret)) => (key, secret),
            _ => {
                return Err(ExchangeError::validation(format!(
                    "API key/secret required. Set {API_KEY_ENV} and {API_SECRET_ENV} env vars or pass --api_key/--api_secret."
                )));
            }
        };

        if !self.quantity.is_positive() {
            return Err(ExchangeError::validation("Quantity must be > 0"));
        }

        let order = self.order()?;
        order.validate()?;

        let mut config = BinanceConfig::new(self.environment())
            .with_credentials(api_key, api_secret)
            .with_timeout_ms(self.timeout_ms);
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone());
        }

        Ok((config, order))
    }

    fn order(&self) -> Result<OrderRequest> {
        let side = OrderSide::from(self.side);

        match self.order_type {
            CliOrderType::Market => {
                if self.price.is_some() || self.stop.is_some() {
                    warn!("MARKET orders ignore --price and --stop");
                }
                Ok(OrderRequest::market(&self.symbol, side, self.quantity))
            }
            CliOrderType::Limit => {
                let price = self
                    .price
                    .ok_or_else(|| ExchangeError::validation("LIMIT orders require --price"))?;
                if self.stop.is_some() {
                    warn!("LIMIT orders ignore --stop");
                }
                Ok(OrderRequest::limit(&self.symbol, side, self.quantity, price))
            }
            CliOrderType::StopLimit => match (self.price, self.stop) {
                (Some(price), Some(stop)) => {
                    Ok(OrderRequest::stop_limit(&self.symbol, side, self.quantity, price, stop))
                }
                _ => Err(ExchangeError::validation("STOP_LIMIT requires --price and --stop")),
            },
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
