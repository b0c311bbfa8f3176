//! Single-threaded runtime based on monoio
//!
//! Requests are async internally but callers get a blocking model: each
//! `block_on` drives one future to completion on the current thread. The
//! timer driver is always enabled because request timeouts depend on it.

use monoio::{FusionDriver, RuntimeBuilder};
use std::future::Future;
use tracing::debug;

/// Runtime construction errors
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("Failed to build runtime: {0}")]
    Build(#[from] std::io::Error),
}

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Name used in log lines
    pub name: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            name: "tradebot-main".to_string(),
        }
    }
}

/// Blocking entry point into the monoio runtime
pub struct TradingRuntime {
    config: RuntimeConfig,
}

impl TradingRuntime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self { config }
    }

    /// Run a future to completion on the current thread
    pub fn block_on<F>(&self, future: F) -> Result<F::Output, RuntimeError>
    where
        F: Future,
    {
        let mut runtime = RuntimeBuilder::<FusionDriver>::new()
            .enable_timer()
            .build()?;
        debug!("{} runtime started", self.config.name);
        let output = runtime.block_on(future);
        debug!("{} runtime stopped", self.config.name);
        Ok(output)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}

impl Default for TradingRuntime {
    fn default() -> Self {
        Self::new()
    }
}
