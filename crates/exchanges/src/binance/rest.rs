//! Binance USDT-M futures REST client
//!
//! - Single-threaded async with monoio, one request at a time
//! - Every signed request is timestamped and HMAC-signed right before sending
//! - Responses are passed through as raw JSON; non-2xx statuses become
//!   `ExchangeError::Http` with the exchange's body untouched
//! - No retries: every failure goes straight back to the caller

use crate::binance::auth::{API_KEY_HEADER, BinanceCredentials, BinanceSigner, build_query_string};
use crate::binance::types::{endpoints, ServerTime, PRODUCTION_BASE_URL, TESTNET_BASE_URL};
use crate::errors::{ExchangeError, Result};
use crate::http::{HttpMethod, HttpRequest, MonoioHttpsClient};
use crate::traits::{HttpTransport, RequestKind, RequestObserver, TracingObserver};
use crate::types::OrderRequest;
use tradebot_core::PerfTimer;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Which exchange deployment to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Testnet,
    Production,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Testnet => TESTNET_BASE_URL,
            Environment::Production => PRODUCTION_BASE_URL,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Testnet => f.write_str("testnet"),
            Environment::Production => f.write_str("production"),
        }
    }
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Binance futures client configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct BinanceConfig {
    pub api_key: String,
    #[serde(skip_serializing, default)]
    pub api_secret: String,
    pub environment: Environment,
    /// Overrides the environment's base URL
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Sent as `recvWindow` on signed requests when set
    #[serde(default)]
    pub recv_window: Option<u64>,
}

impl BinanceConfig {
    pub fn new(environment: Environment) -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            environment,
            base_url: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            recv_window: None,
        }
    }

    pub fn testnet() -> Self {
        Self::new(Environment::Testnet)
    }

    pub fn production() -> Self {
        Self::new(Environment::Production)
    }

    pub fn with_credentials(mut self, api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self.api_secret = api_secret.into();
        self
    }

    pub fn with_env_credentials(self) -> Result<Self> {
        let credentials = BinanceCredentials::from_env()?;
        Ok(self.with_credentials(credentials.api_key, credentials.secret_key))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_recv_window(mut self, recv_window: u64) -> Self {
        self.recv_window = Some(recv_window);
        self
    }

    /// The override if present, otherwise the environment's endpoint
    pub fn resolved_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl std::fmt::Debug for BinanceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("environment", &self.environment)
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("recv_window", &self.recv_window)
            .finish()
    }
}

/// Signed trading client for Binance USDT-M futures
pub struct BinanceFuturesClient<T = MonoioHttpsClient> {
    config: BinanceConfig,
    base_url: String,
    signer: BinanceSigner,
    transport: T,
    observer: Box<dyn RequestObserver>,
}

impl BinanceFuturesClient<MonoioHttpsClient> {
    /// Create a client on the monoio HTTPS transport
    pub fn new(config: BinanceConfig) -> Result<Self> {
        let transport = MonoioHttpsClient::new()?;
        Self::with_transport(config, transport)
    }

    /// Create a client from raw credentials. `base_url` overrides the
    /// environment's endpoint.
    pub fn from_credentials(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        environment: Environment,
        base_url: Option<&str>,
    ) -> Result<Self> {
        let mut config = BinanceConfig::new(environment).with_credentials(api_key, api_secret);
        if let Some(base_url) = base_url {
            config = config.with_base_url(base_url);
        }
        Self::new(config)
    }
}

impl<T: HttpTransport> BinanceFuturesClient<T> {
    /// Create a client on a caller-supplied transport. No I/O happens here.
    pub fn with_transport(config: BinanceConfig, transport: T) -> Result<Self> {
        let credentials = BinanceCredentials::new(config.api_key.clone(), config.api_secret.clone());
        let signer = BinanceSigner::new(credentials).map_err(|_| {
            ExchangeError::ConfigurationError("API key and secret must both be non-empty".to_string())
        })?;

        let base_url = config.resolved_base_url().trim_end_matches('/').to_string();
        let parsed = Url::parse(&base_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ExchangeError::ConfigurationError(format!(
                "base URL must be http or https, got {base_url:?}"
            )));
        }
        if config.timeout_ms == 0 {
            return Err(ExchangeError::ConfigurationError("timeout must be positive".to_string()));
        }

        info!("🔗 Binance futures client created");
        info!("   Environment: {}", config.environment);
        info!("   Base URL: {}", base_url);

        Ok(Self {
            config,
            base_url,
            signer,
            transport,
            observer: Box::new(TracingObserver),
        })
    }

    /// Replace the request observer
    pub fn with_observer(mut self, observer: impl RequestObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn config(&self) -> &BinanceConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Test connectivity
    pub async fn ping(&self) -> Result<()> {
        self.public_request(endpoints::PING, &[]).await?;
        Ok(())
    }

    /// Exchange server time in epoch milliseconds
    pub async fn server_time(&self) -> Result<u64> {
        let response = self.public_request(endpoints::SERVER_TIME, &[]).await?;
        let time: ServerTime = serde_json::from_value(response)
            .map_err(|e| ExchangeError::InvalidResponse(format!("missing serverTime: {e}")))?;
        Ok(time.server_time)
    }

    /// Place an order. Validation runs before anything is signed or sent.
    ///
    /// # Example
    /// ```rust,ignore
    /// let order = OrderRequest::limit("btcusdt", OrderSide::Buy, "0.001".parse()?, "50000".parse()?);
    /// let response = client.place_order(&order).await?;
    /// println!("{response}");
    /// ```
    pub async fn place_order(&self, order: &OrderRequest) -> Result<Value> {
        if let Err(e) = order.validate() {
            self.observer
                .on_failure(RequestKind::Signed, HttpMethod::Post, endpoints::ORDER, &e);
            return Err(e);
        }

        let params = order.to_params();
        debug!("Placing order with params: {:?}", params);

        let response = self
            .signed_request(HttpMethod::Post, endpoints::ORDER, params)
            .await?;
        info!(
            "📋 ORDER placed: {} {} {} qty={}",
            order.order_type, order.side, order.symbol, order.quantity
        );
        Ok(response)
    }

    /// Cancel an order by exchange order id
    pub async fn cancel_order(&self, symbol: &str, order_id: u64) -> Result<Value> {
        let params = order_lookup_params(symbol, order_id)?;
        self.signed_request(HttpMethod::Delete, endpoints::ORDER, params).await
    }

    /// Query an order by exchange order id
    pub async fn query_order(&self, symbol: &str, order_id: u64) -> Result<Value> {
        let params = order_lookup_params(symbol, order_id)?;
        self.signed_request(HttpMethod::Get, endpoints::ORDER, params).await
    }

    /// Sign `params` and send them: POST in a form body, anything else in
    /// the query string.
    pub async fn signed_request(
        &self,
        method: HttpMethod,
        path: &str,
        mut params: Vec<(String, String)>,
    ) -> Result<Value> {
        check_path(path)?;

        if let Some(recv_window) = self.config.recv_window {
            if !params.iter().any(|(k, _)| k == "recvWindow") {
                params.push(("recvWindow".to_string(), recv_window.to_string()));
            }
        }

        let signed = self.signer.sign(params)?;
        let query = signed.query_string();
        let url = format!("{}{}", self.base_url, path);

        let request = if method.sends_body() {
            HttpRequest::new(method, url, self.config.timeout())
                .header(API_KEY_HEADER, self.signer.api_key())
                .header("Content-Type", FORM_CONTENT_TYPE)
                .body(query.clone())
        } else {
            HttpRequest::new(method, format!("{url}?{query}"), self.config.timeout())
                .header(API_KEY_HEADER, self.signer.api_key())
        };

        self.dispatch(RequestKind::Signed, path, request, &query).await
    }

    /// Unsigned GET; no credential material is attached
    pub async fn public_request(&self, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        check_path(path)?;

        let pairs: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let query = build_query_string(&pairs);

        let mut url = format!("{}{}", self.base_url, path);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }

        let request = HttpRequest::new(HttpMethod::Get, url, self.config.timeout());
        self.dispatch(RequestKind::Public, path, request, &query).await
    }

    async fn dispatch(
        &self,
        kind: RequestKind,
        path: &str,
        request: HttpRequest,
        params: &str,
    ) -> Result<Value> {
        let timer = PerfTimer::start(format!("binance_{}_{}", request.method, path));
        let method = request.method;
        let target = request.url.clone();

        self.observer.on_request(kind, method, &target, params);

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                self.observer.on_failure(kind, method, &target, &e);
                return Err(e);
            }
        };

        self.observer
            .on_response(kind, response.status, &response.body, timer.elapsed());

        let result = if response.is_success() {
            parse_body(&response.body)
        } else {
            Err(ExchangeError::Http {
                status: response.status,
                body: response.body,
            })
        };

        if let Err(e) = &result {
            self.observer.on_failure(kind, method, &target, e);
        }
        result
    }
}

fn check_path(path: &str) -> Result<()> {
    if path.starts_with('/') {
        Ok(())
    } else {
        Err(ExchangeError::InvalidUrl(format!("path must start with '/': {path:?}")))
    }
}

fn order_lookup_params(symbol: &str, order_id: u64) -> Result<Vec<(String, String)>> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(ExchangeError::validation("symbol must not be empty"));
    }
    Ok(vec![
        ("symbol".to_string(), symbol.to_ascii_uppercase()),
        ("orderId".to_string(), order_id.to_string()),
    ])
}

/// 2xx bodies are JSON; an empty body maps to `null`
fn parse_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body)
        .map_err(|e| ExchangeError::SerializationError(format!("{e}: {body}")))
}
