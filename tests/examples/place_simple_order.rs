//! Place and cancel a resting LIMIT order on the Binance futures testnet
//!
//! Reads BINANCE_API_KEY / BINANCE_API_SECRET from the environment or `.env`.

use tradebot_core::prelude::*;
use tradebot_exchanges::binance::{BinanceConfig, BinanceFuturesClient};
use tradebot_exchanges::types::{OrderRequest, OrderSide};
use anyhow::Context;
use tracing::{error, info};

#[monoio::main(enable_timer = true)]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Setup logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("🚀 Starting simple Binance futures order placement");

    let config = match BinanceConfig::testnet().with_env_credentials() {
        Ok(config) => {
            info!("✅ API credentials loaded");
            config
        }
        Err(e) => {
            error!("❌ Failed to load API credentials: {}", e);
            return Err(e.into());
        }
    };

    let client = BinanceFuturesClient::new(config).context("Failed to create client")?;
    info!("✅ Client initialized");

    let ticker = client
        .public_request("/fapi/v1/ticker/price", &[("symbol", "BTCUSDT")])
        .await
        .context("Failed to fetch BTCUSDT price")?;
    let current_price = ticker["price"]
        .as_str()
        .and_then(|p| Fixed::from_str_exact(p).ok())
        .unwrap_or(Fixed::ZERO);
    info!("📈 Current price: ${}", current_price);

    // 10% below market so the order rests instead of filling
    let buy_price = (current_price * Fixed::from_str_exact("0.90")?).round_dp(1);
    info!("🎯 Buy order price: ${}", buy_price);

    let order = OrderRequest::limit("BTCUSDT", OrderSide::Buy, Fixed::from_str_exact("0.002")?, buy_price);

    match client.place_order(&order).await {
        Ok(placed) => {
            info!("✅ Order placed: {}", placed);

            let Some(order_id) = placed["orderId"].as_u64() else {
                error!("❌ Response has no orderId");
                return Ok(());
            };

            monoio::time::sleep(std::time::Duration::from_secs(2)).await;

            match client.cancel_order("BTCUSDT", order_id).await {
                Ok(canceled) => info!("✅ Order canceled: {}", canceled["status"]),
                Err(e) => error!("❌ Failed to cancel: {}", e),
            }
        }
        Err(e) => {
            error!("❌ Failed to place order: {}", e);
            if let Some(api) = e.api_error() {
                error!("   Exchange code {}: {}", api.code, api.msg);
            }
        }
    }

    Ok(())
}
