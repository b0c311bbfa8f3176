//! Shared fixtures: a scripted in-memory transport and a recording observer

#![allow(dead_code)]

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;
use tradebot_exchanges::prelude::*;
use tradebot_exchanges::RequestKind;

pub const API_KEY: &str = "test_api_key";
pub const API_SECRET: &str = "test_api_secret";

/// What the transport does with the next request
#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, String),
    Timeout(Duration),
    Network(String),
}

impl Reply {
    pub fn ok(body: &str) -> Self {
        Reply::Status(200, body.to_string())
    }
}

/// Records every request and answers from a script; an empty script
/// answers `200 {}`
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    requests: RefCell<Vec<HttpRequest>>,
    replies: RefCell<VecDeque<Reply>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: impl IntoIterator<Item = Reply>) -> Self {
        let transport = Self::new();
        transport.replies.borrow_mut().extend(replies);
        transport
    }

    pub fn calls(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn last(&self) -> HttpRequest {
        self.requests
            .borrow()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

#[async_trait(?Send)]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.borrow_mut().push(request);
        let reply = self
            .replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Reply::ok("{}"));

        match reply {
            Reply::Status(status, body) => Ok(HttpResponse {
                status,
                headers: vec![("Content-Type".to_string(), "application/json".to_string())],
                body,
            }),
            Reply::Timeout(after) => Err(TransportError::Timeout(after).into()),
            Reply::Network(reason) => Err(TransportError::Network(reason).into()),
        }
    }
}

/// Observer event, flattened for assertions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Request { kind: RequestKind, method: HttpMethod, params: String },
    Response { kind: RequestKind, status: u16, body: String },
    Failure { kind: RequestKind, error: String },
}

#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Rc<RefCell<Vec<Event>>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }
}

impl RequestObserver for RecordingObserver {
    fn on_request(&self, kind: RequestKind, method: HttpMethod, _url: &str, params: &str) {
        self.events.borrow_mut().push(Event::Request {
            kind,
            method,
            params: params.to_string(),
        });
    }

    fn on_response(&self, kind: RequestKind, status: u16, body: &str, _elapsed: Duration) {
        self.events.borrow_mut().push(Event::Response {
            kind,
            status,
            body: body.to_string(),
        });
    }

    fn on_failure(&self, kind: RequestKind, _method: HttpMethod, _target: &str, error: &ExchangeError) {
        self.events.borrow_mut().push(Event::Failure {
            kind,
            error: error.to_string(),
        });
    }
}

pub fn test_config() -> BinanceConfig {
    BinanceConfig::testnet().with_credentials(API_KEY, API_SECRET)
}

pub fn client() -> BinanceFuturesClient<ScriptedTransport> {
    client_with(Vec::new())
}

pub fn client_with(replies: impl IntoIterator<Item = Reply>) -> BinanceFuturesClient<ScriptedTransport> {
    BinanceFuturesClient::with_transport(test_config(), ScriptedTransport::with_replies(replies))
        .expect("client construction")
}

/// HMAC-SHA256 computed without going through the signer
pub fn expected_signature(secret: &str, payload: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("any key length");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Split `a=1&b=2&signature=..` into the signed payload and the signature
pub fn split_signature(query: &str) -> (&str, &str) {
    query
        .rsplit_once("&signature=")
        .expect("query carries a signature")
}

/// Ordered key/value pairs of a form or query string
pub fn pairs(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|p| !p.is_empty())
        .map(|p| match p.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (p.to_string(), String::new()),
        })
        .collect()
}

pub fn query_of(url: &str) -> &str {
    url.split_once('?').map(|(_, q)| q).unwrap_or("")
}

pub fn fixed(value: &str) -> Fixed {
    Fixed::from_str_exact(value).expect("valid decimal")
}
