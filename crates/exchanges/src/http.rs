//! Monoio-native HTTP/HTTPS client implementation
//!
//! - Single-threaded async with monoio
//! - Direct TLS integration with rustls, plain TCP for `http://`
//! - One HTTP/1.1 request per connection (`Connection: close`)
//! - The whole exchange runs under the request timeout

use crate::errors::{ExchangeError, Result, TransportError};
use crate::traits::HttpTransport;
use async_trait::async_trait;
use monoio::io::{AsyncReadRent, AsyncWriteRentExt};
use monoio::net::TcpStream;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection};
use std::io::{Read, Write};
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::mpsc::{self, TryRecvError};
use std::sync::Arc;
use std::time::Duration;
use url::Host;

const USER_AGENT: &str = "tradebot/0.1";
const READ_CHUNK: usize = 4096;
const DNS_POLL: Duration = Duration::from_millis(5);

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// POST carries parameters in a form body, everything else in the query
    pub fn sends_body(&self) -> bool {
        matches!(self, HttpMethod::Post)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Absolute URL including any query string
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Case-insensitive header lookup
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Monoio-native HTTPS client
pub struct MonoioHttpsClient {
    tls_config: Arc<ClientConfig>,
}

impl MonoioHttpsClient {
    /// Create a new HTTPS client trusting the webpki root set
    pub fn new() -> Result<Self> {
        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let tls_config = ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        Ok(Self {
            tls_config: Arc::new(tls_config),
        })
    }

    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let url = url::Url::parse(&request.url)?;

        let secure = match url.scheme() {
            "https" => true,
            "http" => false,
            other => return Err(ExchangeError::InvalidUrl(format!("unsupported scheme {other:?}"))),
        };
        let host = url
            .host_str()
            .ok_or_else(|| ExchangeError::InvalidUrl("No host in URL".to_string()))?
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| ExchangeError::InvalidUrl("No port for URL".to_string()))?;

        let addrs = match url.host() {
            Some(host) => resolve(host, port).await?,
            None => return Err(ExchangeError::InvalidUrl("No host in URL".to_string())),
        };
        let tcp_stream = connect_any(&addrs, &host, port).await?;

        let mut connection = if secure {
            let server_name = ServerName::try_from(host.clone())
                .map_err(|e| ExchangeError::network(format!("Invalid server name: {e:?}")))?;
            let tls_conn = ClientConnection::new(self.tls_config.clone(), server_name)
                .map_err(|e| ExchangeError::network(format!("TLS setup failed: {e}")))?;
            Connection::Tls(TlsStream::new(tcp_stream, tls_conn))
        } else {
            Connection::Plain(tcp_stream)
        };

        let host_header = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.clone(),
        };
        let raw = build_request(request, &url, &host_header);

        connection.write_all(&raw).await?;
        let response_data = connection.read_to_end().await?;

        parse_http_response(&response_data)
    }
}

#[async_trait(?Send)]
impl HttpTransport for MonoioHttpsClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let timeout = request.timeout;
        match monoio::time::timeout(timeout, self.execute(&request)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(timeout).into()),
        }
    }
}

/// Resolve the host off the runtime thread
///
/// `getaddrinfo` blocks, so the lookup runs on its own thread and is polled
/// here; that keeps it under the request timeout. A lookup that is abandoned
/// on timeout finishes on its thread and is discarded.
async fn resolve(host: Host<&str>, port: u16) -> Result<Vec<SocketAddr>> {
    let domain = match host {
        Host::Ipv4(ip) => return Ok(vec![SocketAddr::new(ip.into(), port)]),
        Host::Ipv6(ip) => return Ok(vec![SocketAddr::new(ip.into(), port)]),
        Host::Domain(domain) => domain.to_string(),
    };

    let (tx, rx) = mpsc::channel();
    let lookup = domain.clone();
    std::thread::Builder::new()
        .name("tradebot-dns".to_string())
        .spawn(move || {
            let result = (lookup.as_str(), port)
                .to_socket_addrs()
                .map(|addrs| addrs.collect::<Vec<_>>());
            let _ = tx.send(result);
        })
        .map_err(|e| ExchangeError::network(format!("Cannot start DNS lookup for {domain}: {e}")))?;

    loop {
        match rx.try_recv() {
            Ok(Ok(addrs)) if !addrs.is_empty() => return Ok(addrs),
            Ok(Ok(_)) => return Err(ExchangeError::network(format!("No addresses for {domain}"))),
            Ok(Err(e)) => return Err(ExchangeError::network(format!("DNS lookup for {domain} failed: {e}"))),
            Err(TryRecvError::Empty) => monoio::time::sleep(DNS_POLL).await,
            Err(TryRecvError::Disconnected) => {
                return Err(ExchangeError::network(format!("DNS lookup for {domain} aborted")));
            }
        }
    }
}

/// Try each resolved address in order, keeping the last error
async fn connect_any(addrs: &[SocketAddr], host: &str, port: u16) -> Result<TcpStream> {
    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect(*addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(e),
        }
    }
    let reason = last_error
        .map(|e| e.to_string())
        .unwrap_or_else(|| "no addresses".to_string());
    Err(ExchangeError::network(format!("TCP connect to {host}:{port} failed: {reason}")))
}

/// True once a whole response is buffered. Servers that ignore
/// `Connection: close` would otherwise hold the read open until timeout.
fn response_complete(data: &[u8]) -> bool {
    let Some(header_end) = find(data, b"\r\n\r\n") else {
        return false;
    };
    let head = String::from_utf8_lossy(&data[..header_end]);
    let body = &data[header_end + 4..];

    for line in head.lines().skip(1) {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.eq_ignore_ascii_case("transfer-encoding") && value.to_ascii_lowercase().contains("chunked") {
            return chunked_complete(body);
        }
        if key.eq_ignore_ascii_case("content-length") {
            return value
                .trim()
                .parse::<usize>()
                .map(|length| body.len() >= length)
                .unwrap_or(false);
        }
    }
    false
}

fn chunked_complete(mut data: &[u8]) -> bool {
    loop {
        let Some(line_end) = find(data, b"\r\n") else {
            return false;
        };
        let size_line = String::from_utf8_lossy(&data[..line_end]);
        let Ok(size) = usize::from_str_radix(size_line.split(';').next().unwrap_or("").trim(), 16) else {
            return false;
        };
        data = &data[line_end + 2..];

        if size == 0 {
            // optional trailers, then a blank line
            return data.starts_with(b"\r\n") || find(data, b"\r\n\r\n").is_some();
        }
        if data.len() < size + 2 {
            return false;
        }
        data = &data[size + 2..];
    }
}

/// Serialize the request line, headers and body
fn build_request(request: &HttpRequest, url: &url::Url, host_header: &str) -> Vec<u8> {
    let mut path_and_query = url.path().to_string();
    if path_and_query.is_empty() {
        path_and_query.push('/');
    }
    if let Some(query) = url.query() {
        path_and_query.push('?');
        path_and_query.push_str(query);
    }

    let body = request.body.as_deref().unwrap_or("");
    let mut head = format!(
        "{} {path_and_query} HTTP/1.1\r\n\
         Host: {host_header}\r\n\
         User-Agent: {USER_AGENT}\r\n\
         Accept: application/json\r\n\
         Connection: close\r\n",
        request.method
    );
    if request.body.is_some() || request.method.sends_body() {
        head.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    for (key, value) in &request.headers {
        head.push_str(&format!("{key}: {value}\r\n"));
    }
    head.push_str("\r\n");

    let mut raw = head.into_bytes();
    raw.extend_from_slice(body.as_bytes());
    raw
}

/// Parse a complete HTTP/1.1 response (server closed the connection)
pub fn parse_http_response(data: &[u8]) -> Result<HttpResponse> {
    let header_end = find(data, b"\r\n\r\n")
        .ok_or_else(|| ExchangeError::InvalidResponse("no header terminator".to_string()))?;

    let header_part = String::from_utf8_lossy(&data[..header_end]);
    let body_part = &data[header_end + 4..];

    let mut lines = header_part.lines();

    let status_line = lines
        .next()
        .ok_or_else(|| ExchangeError::InvalidResponse("empty response".to_string()))?;
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u16>().ok())
        .ok_or_else(|| ExchangeError::InvalidResponse(format!("invalid status line {status_line:?}")))?;

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect();

    let header = |name: &str| {
        headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    };

    let chunked = header("transfer-encoding")
        .map(|v| v.to_ascii_lowercase().contains("chunked"))
        .unwrap_or(false);

    let body = if chunked {
        decode_chunked(body_part)?
    } else if let Some(length) = header("content-length") {
        let length: usize = length
            .parse()
            .map_err(|_| ExchangeError::InvalidResponse(format!("bad Content-Length {length:?}")))?;
        if body_part.len() < length {
            return Err(ExchangeError::network(format!(
                "connection closed after {} of {} body bytes",
                body_part.len(),
                length
            )));
        }
        body_part[..length].to_vec()
    } else {
        body_part.to_vec()
    };

    Ok(HttpResponse {
        status,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn decode_chunked(mut data: &[u8]) -> Result<Vec<u8>> {
    let mut body = Vec::with_capacity(data.len());

    loop {
        let line_end = find(data, b"\r\n")
            .ok_or_else(|| ExchangeError::InvalidResponse("truncated chunk header".to_string()))?;
        let size_line = String::from_utf8_lossy(&data[..line_end]);
        let size_hex = size_line.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_hex, 16)
            .map_err(|_| ExchangeError::InvalidResponse(format!("bad chunk size {size_hex:?}")))?;
        data = &data[line_end + 2..];

        if size == 0 {
            break;
        }
        if data.len() < size {
            return Err(ExchangeError::InvalidResponse("truncated chunk".to_string()));
        }
        body.extend_from_slice(&data[..size]);
        data = data[size..].strip_prefix(b"\r\n").unwrap_or(&data[size..]);
    }

    Ok(body)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

enum Connection {
    Plain(TcpStream),
    Tls(TlsStream),
}

impl Connection {
    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Connection::Plain(stream) => {
                let (result, _) = stream.write_all(data.to_vec()).await;
                result.map_err(|e| ExchangeError::network(format!("TCP write failed: {e}")))?;
                Ok(())
            }
            Connection::Tls(stream) => stream.write_all(data).await,
        }
    }

    async fn read_to_end(&mut self) -> Result<Vec<u8>> {
        match self {
            Connection::Plain(stream) => {
                let mut response_data = Vec::new();
                loop {
                    let (result, buf) = stream.read(vec![0u8; READ_CHUNK]).await;
                    let bytes_read =
                        result.map_err(|e| ExchangeError::network(format!("TCP read failed: {e}")))?;
                    if bytes_read == 0 {
                        break;
                    }
                    response_data.extend_from_slice(&buf[..bytes_read]);
                    if response_complete(&response_data) {
                        break;
                    }
                }
                Ok(response_data)
            }
            Connection::Tls(stream) => stream.read_to_end().await,
        }
    }
}

/// TLS stream wrapper for monoio
struct TlsStream {
    stream: TcpStream,
    tls_conn: ClientConnection,
    write_buf: Vec<u8>,
    handshake_complete: bool,
}

impl TlsStream {
    fn new(stream: TcpStream, tls_conn: ClientConnection) -> Self {
        Self {
            stream,
            tls_conn,
            write_buf: Vec::with_capacity(8192),
            handshake_complete: false,
        }
    }

    /// Push any pending TLS records to the socket
    async fn flush_tls(&mut self) -> Result<()> {
        while self.tls_conn.wants_write() {
            self.write_buf.clear();
            let tls_bytes = self
                .tls_conn
                .write_tls(&mut self.write_buf)
                .map_err(|e| ExchangeError::network(format!("TLS write failed: {e}")))?;

            if tls_bytes > 0 {
                let (result, buf) = self.stream.write_all(std::mem::take(&mut self.write_buf)).await;
                self.write_buf = buf;
                result.map_err(|e| ExchangeError::network(format!("TCP write failed: {e}")))?;
            }
        }
        Ok(())
    }

    /// Read one batch of encrypted bytes and feed them to rustls.
    /// Returns false once the peer has closed the socket.
    async fn fill_tls(&mut self) -> Result<bool> {
        let (result, buf) = self.stream.read(vec![0u8; READ_CHUNK]).await;
        let bytes_read = result.map_err(|e| ExchangeError::network(format!("TCP read failed: {e}")))?;
        if bytes_read == 0 {
            return Ok(false);
        }

        self.tls_conn
            .read_tls(&mut std::io::Cursor::new(&buf[..bytes_read]))
            .map_err(|e| ExchangeError::network(format!("TLS read failed: {e}")))?;
        self.tls_conn
            .process_new_packets()
            .map_err(|e| ExchangeError::network(format!("TLS process failed: {e}")))?;
        Ok(true)
    }

    async fn complete_handshake(&mut self) -> Result<()> {
        while !self.handshake_complete {
            self.flush_tls().await?;

            if !self.tls_conn.is_handshaking() {
                self.handshake_complete = true;
                break;
            }

            if self.tls_conn.wants_read() {
                if !self.fill_tls().await? {
                    return Err(ExchangeError::network("Connection closed during handshake"));
                }
            } else if !self.tls_conn.wants_write() {
                return Err(ExchangeError::network("TLS handshake stalled"));
            }
        }
        Ok(())
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.complete_handshake().await?;

        self.tls_conn
            .writer()
            .write_all(data)
            .map_err(|e| ExchangeError::network(format!("TLS application write failed: {e}")))?;

        self.flush_tls().await
    }

    async fn read_to_end(&mut self) -> Result<Vec<u8>> {
        self.complete_handshake().await?;

        let mut response_data = Vec::new();
        let mut plain = vec![0u8; READ_CHUNK];

        loop {
            match self.tls_conn.reader().read(&mut plain) {
                // close_notify received
                Ok(0) => break,
                Ok(n) => {
                    response_data.extend_from_slice(&plain[..n]);
                    if response_complete(&response_data) {
                        break;
                    }
                    continue;
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(ExchangeError::network(format!("TLS read failed: {e}"))),
            }

            if !self.fill_tls().await? {
                break;
            }
        }

        Ok(response_data)
    }
}
