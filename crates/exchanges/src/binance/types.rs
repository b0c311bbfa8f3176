//! Binance USDT-M futures endpoints and response shapes

use serde::{Deserialize, Serialize};

pub const TESTNET_BASE_URL: &str = "https://testnet.binancefuture.com";
pub const PRODUCTION_BASE_URL: &str = "https://fapi.binance.com";

/// REST paths
pub mod endpoints {
    pub const PING: &str = "/fapi/v1/ping";
    pub const SERVER_TIME: &str = "/fapi/v1/time";
    pub const ORDER: &str = "/fapi/v1/order";
}

/// `GET /fapi/v1/time`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerTime {
    #[serde(rename = "serverTime")]
    pub server_time: u64,
}
