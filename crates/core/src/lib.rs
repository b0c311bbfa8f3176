//! # Tradebot Core
//!
//! Shared building blocks for the tradebot order client.
//!
//! - **Single-threaded runtime** - monoio, driven through a blocking `block_on`
//! - **Fixed-point decimals** - exact quantities and prices, positional rendering
//! - **Timestamps** - millisecond epoch values for request signing
//! - **Unified logging** - tracing with console and append-only file output

pub mod runtime;
pub mod timing;
pub mod fixed;
pub mod logging;

// Re-export commonly used items
pub use runtime::{RuntimeConfig, RuntimeError, TradingRuntime};
pub use timing::{millis, nanos, PerfTimer, Timestamp};
pub use fixed::{Fixed, FixedError};
pub use logging::{init_logging, LogConfig, LoggingError, FILE_ONLY_TARGET};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::runtime::TradingRuntime;
    pub use crate::timing::{millis, nanos, PerfTimer, Timestamp};
    pub use crate::fixed::Fixed;
    pub use crate::logging::{init_logging, LogConfig};

    // Common external types
    pub use monoio;
    pub use serde::{Deserialize, Serialize};
    pub use chrono::{DateTime, Utc};
}
