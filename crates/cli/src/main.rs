//! `tradebot` - place a single order on Binance USDT-M futures
//!
//! ```text
//! tradebot LIMIT BTCUSDT BUY 0.01 --price 60000 --testnet
//! ```

mod args;

use anyhow::Context;
use args::Cli;
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tradebot_core::{init_logging, LogConfig, TradingRuntime, FILE_ONLY_TARGET};
use tradebot_exchanges::BinanceFuturesClient;

const EXIT_FAILURE: u8 = 1;
const EXIT_VALIDATION: u8 = 2;

fn main() -> ExitCode {
    // Credentials may live in a local .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    setup_logging(&cli);

    let (config, order) = match cli.validate() {
        Ok(validated) => validated,
        Err(e) => {
            error!(target: FILE_ONLY_TARGET, "{}", e);
            eprintln!("{e}");
            return ExitCode::from(EXIT_VALIDATION);
        }
    };

    info!(
        "Placing {} {} {} qty={} on {}",
        order.order_type,
        order.side,
        order.symbol,
        order.quantity,
        config.environment
    );

    match run(config, order) {
        Ok(response) => {
            info!("Order placed: {}", response);
            println!("Order placed. Exchange response:");
            println!("{response}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            // The console gets the eprintln below
            error!(target: FILE_ONLY_TARGET, "Error placing order: {:#}", e);
            eprintln!("Error placing order: {e:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn setup_logging(cli: &Cli) {
    let config = LogConfig::default().with_file(&cli.log_file);
    if let Err(e) = init_logging(&config) {
        // Still log to the console when the file cannot be opened
        eprintln!("{e}; logging to console only");
        if let Err(e) = init_logging(&LogConfig::default()) {
            eprintln!("{e}");
        }
        warn!("Log file {} unavailable", cli.log_file.display());
    }
}

fn run(
    config: tradebot_exchanges::BinanceConfig,
    order: tradebot_exchanges::OrderRequest,
) -> anyhow::Result<serde_json::Value> {
    let client = BinanceFuturesClient::new(config).context("Failed to create client")?;
    let runtime = TradingRuntime::new();

    let response = runtime
        .block_on(async { client.place_order(&order).await })
        .context("Failed to start runtime")??;

    Ok(response)
}
