//! Binance authentication and request signing
//!
//! The signature is HMAC-SHA256 over the canonical query string, keyed by
//! the API secret. `SignedParams` keeps the signed bytes and the
//! transmitted bytes identical: the query string is frozen at signing time
//! and the signature is only ever appended.

use crate::errors::{ExchangeError, Result};
use tradebot_core::millis;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the API key on authenticated requests
pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";

pub const API_KEY_ENV: &str = "BINANCE_API_KEY";
pub const API_SECRET_ENV: &str = "BINANCE_API_SECRET";

/// Binance API credentials
#[derive(Clone)]
pub struct BinanceCredentials {
    pub api_key: String,
    pub secret_key: String,
}

impl BinanceCredentials {
    /// Create new credentials
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Load credentials from `BINANCE_API_KEY` / `BINANCE_API_SECRET`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| ExchangeError::MissingCredentials(API_KEY_ENV.to_string()))?;
        let secret_key = std::env::var(API_SECRET_ENV)
            .map_err(|_| ExchangeError::MissingCredentials(API_SECRET_ENV.to_string()))?;

        Ok(Self::new(api_key, secret_key))
    }

    /// Check if credentials are valid (non-empty)
    pub fn is_valid(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.secret_key.trim().is_empty()
    }
}

// The secret must never reach a log line.
impl std::fmt::Debug for BinanceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceCredentials")
            .field("api_key", &self.api_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Parameters after signing: `timestamp` appended, then `signature`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedParams {
    pairs: Vec<(String, String)>,
    payload: String,
    signature: String,
    timestamp: u64,
}

impl SignedParams {
    /// Exactly the bytes that were signed
    pub fn signing_payload(&self) -> &str {
        &self.payload
    }

    /// Lower-case hex HMAC-SHA256 of `signing_payload`
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// The string to transmit, as body or query
    pub fn query_string(&self) -> String {
        format!("{}&signature={}", self.payload, self.signature)
    }

    /// Signed pairs in transmission order, signature last
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain(std::iter::once(("signature", self.signature.as_str())))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Binance request signer
pub struct BinanceSigner {
    credentials: BinanceCredentials,
}

impl BinanceSigner {
    /// Create new signer with credentials
    pub fn new(credentials: BinanceCredentials) -> Result<Self> {
        if !credentials.is_valid() {
            return Err(ExchangeError::InvalidCredentials);
        }

        Ok(Self { credentials })
    }

    pub fn api_key(&self) -> &str {
        &self.credentials.api_key
    }

    /// Sign with a fresh millisecond timestamp
    pub fn sign(&self, params: Vec<(String, String)>) -> Result<SignedParams> {
        self.sign_at(params, millis())
    }

    /// Sign with a caller-supplied timestamp
    pub fn sign_at(&self, mut params: Vec<(String, String)>, timestamp: u64) -> Result<SignedParams> {
        params.retain(|(k, _)| k != "timestamp" && k != "signature");
        params.push(("timestamp".to_string(), timestamp.to_string()));

        let payload = build_query_string(&params);
        let signature = self.create_signature(&payload)?;

        debug!("Signed {} parameters at {}", params.len(), timestamp);

        Ok(SignedParams {
            pairs: params,
            payload,
            signature,
            timestamp,
        })
    }

    /// Create HMAC-SHA256 signature
    pub fn create_signature(&self, payload: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.credentials.secret_key.as_bytes())
            .map_err(|e| ExchangeError::SigningError(format!("HMAC setup failed: {e}")))?;

        mac.update(payload.as_bytes());
        let signature = mac.finalize().into_bytes();

        Ok(hex::encode(signature))
    }

    /// Constant-time check of a signature against a payload
    pub fn validate_signature(&self, payload: &str, signature: &str) -> bool {
        let Ok(expected) = hex::decode(signature) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(self.credentials.secret_key.as_bytes()) else {
            return false;
        };
        mac.update(payload.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }
}

/// Canonical query string: insertion order, values percent-encoded
pub fn build_query_string(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
