//! # Tradebot Exchange Integrations
//!
//! Signed order placement against Binance USDT-M futures.
//!
//! ## Architecture
//!
//! - **monoio-based HTTP client** - single-threaded async, rustls for HTTPS
//! - **Injected seams** - `HttpTransport` for the wire, `RequestObserver` for logging
//! - **Fixed-point arithmetic** - quantities and prices sent exactly as given
//! - **Structured failures** - validation, transport and HTTP errors kept apart

pub mod binance;
pub mod traits;
pub mod types;
pub mod errors;
pub mod http;

// Re-export main types
pub use binance::{BinanceConfig, BinanceFuturesClient, Environment};
pub use traits::{HttpTransport, NoopObserver, RequestKind, RequestObserver, TracingObserver};
pub use types::*;
pub use errors::{ExchangeError, Result, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, MonoioHttpsClient};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::binance::{BinanceConfig, BinanceCredentials, BinanceFuturesClient, Environment};
    pub use crate::traits::{HttpTransport, RequestObserver};
    pub use crate::types::*;
    pub use crate::errors::{ExchangeError, Result, TransportError};
    pub use crate::http::{HttpMethod, HttpRequest, HttpResponse, MonoioHttpsClient};
    pub use tradebot_core::prelude::*;
}
