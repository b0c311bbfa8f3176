//! Binance USDT-M futures integration
//!
//! A signed REST client on the single-threaded monoio runtime, with exact
//! decimal order fields and HMAC-SHA256 request signing.

pub mod rest;
pub mod auth;
pub mod types;

pub use rest::{BinanceConfig, BinanceFuturesClient, Environment, DEFAULT_TIMEOUT_MS};
pub use auth::{BinanceCredentials, BinanceSigner, SignedParams};
pub use types::*;
