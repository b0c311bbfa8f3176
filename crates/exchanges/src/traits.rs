//! Seams of the client: how bytes reach the exchange, and who hears about it
//!
//! Both are injected at construction. Everything runs on a single-threaded
//! monoio runtime, so neither trait requires `Send`.

use crate::errors::{ExchangeError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{error, info};

/// Sends one HTTP request and returns whatever the server answered
///
/// Implementations report connection problems and timeouts as
/// `ExchangeError::Transport`; any status code, including 4xx/5xx, is a
/// successful `HttpResponse`. They must not retry.
#[async_trait(?Send)]
pub trait HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Signed requests carry the API key and a signature; public ones carry neither
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Signed,
    Public,
}

/// Observer notified around every request the client makes
pub trait RequestObserver {
    /// `params` is the transmitted query/body string
    fn on_request(&self, kind: RequestKind, method: HttpMethod, url: &str, params: &str);

    fn on_response(&self, kind: RequestKind, status: u16, body: &str, elapsed: Duration);

    fn on_failure(&self, kind: RequestKind, method: HttpMethod, target: &str, error: &ExchangeError);
}

/// Default observer: request/response lines through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RequestObserver for TracingObserver {
    fn on_request(&self, kind: RequestKind, method: HttpMethod, url: &str, params: &str) {
        match kind {
            RequestKind::Signed => info!("REQUEST -> {} {} | params: {}", method, url, params),
            RequestKind::Public => info!("PUBREQ -> {} {} | params: {}", method, url, params),
        }
    }

    fn on_response(&self, kind: RequestKind, status: u16, body: &str, elapsed: Duration) {
        let millis = elapsed.as_secs_f64() * 1000.0;
        match kind {
            RequestKind::Signed => info!("RESPONSE <- {} {} ({:.1}ms)", status, body, millis),
            RequestKind::Public => info!("PUBRESP <- {} {} ({:.1}ms)", status, body, millis),
        }
    }

    fn on_failure(&self, kind: RequestKind, method: HttpMethod, target: &str, error: &ExchangeError) {
        match kind {
            RequestKind::Signed => error!("Signed request {} {} failed: {}", method, target, error),
            RequestKind::Public => error!("Public request {} {} failed: {}", method, target, error),
        }
    }
}

/// Observer that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RequestObserver for NoopObserver {
    fn on_request(&self, _: RequestKind, _: HttpMethod, _: &str, _: &str) {}

    fn on_response(&self, _: RequestKind, _: u16, _: &str, _: Duration) {}

    fn on_failure(&self, _: RequestKind, _: HttpMethod, _: &str, _: &ExchangeError) {}
}

#[async_trait(?Send)]
impl<T: HttpTransport + ?Sized> HttpTransport for std::rc::Rc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        (**self).send(request).await
    }
}
