pub mod http_fetcher;

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

/// HTTP methods supported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Head,
    Put,
    Delete,
}

impl Method {
    pub fn allows_body(self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Delete)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Head => "HEAD",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http,
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Http => f.write_str("HTTP"),
            Protocol::Https => f.write_str("HTTPS"),
        }
    }
}

/// A single outbound request. A body can only be attached through the
/// POST/PUT/DELETE constructors, which keeps method and body consistent.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub follow_redirects: bool,
    pub timeout: Option<Duration>,
}

impl FetchRequest {
    fn new(url: &str, method: Method, body: Option<Vec<u8>>) -> Self {
        Self {
            url: url.to_string(),
            method,
            headers: Vec::new(),
            body,
            follow_redirects: true,
            timeout: None,
        }
    }

    pub fn get(url: &str) -> Self {
        Self::new(url, Method::Get, None)
    }

    pub fn head(url: &str) -> Self {
        Self::new(url, Method::Head, None)
    }

    pub fn post(url: &str, body: impl Into<Vec<u8>>) -> Self {
        Self::new(url, Method::Post, Some(body.into()))
    }

    pub fn put(url: &str, body: impl Into<Vec<u8>>) -> Self {
        Self::new(url, Method::Put, Some(body.into()))
    }

    pub fn delete(url: &str) -> Self {
        Self::new(url, Method::Delete, None)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A completed response. Failures never reach this type; they are
/// materialized as [`FetchError`] instead.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status_code: u16,
    pub status_message: String,
    pub protocol: Protocol,
    pub headers: BTreeMap<String, Vec<String>>,
    pub content_type: Option<String>,
    /// Absent for HEAD requests.
    pub body: Option<String>,
    pub elapsed: Duration,
}

impl FetchResponse {
    pub fn body_str(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchErrorKind {
    Timeout,
    DnsOrConnect,
    TlsTrust,
    HttpStatus(u16),
    EmptyBody,
    MalformedUrl,
    /// Internal: the in-flight request was cancelled. Never surfaced as a
    /// user-visible failure.
    Cancelled,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchErrorKind::Timeout => f.write_str("timeout"),
            FetchErrorKind::DnsOrConnect => f.write_str("connection failed"),
            FetchErrorKind::TlsTrust => f.write_str("TLS trust failure"),
            FetchErrorKind::HttpStatus(code) => write!(f, "HTTP {}", code),
            FetchErrorKind::EmptyBody => f.write_str("empty body"),
            FetchErrorKind::MalformedUrl => f.write_str("malformed URL"),
            FetchErrorKind::Cancelled => f.write_str("cancelled"),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(FetchErrorKind::Cancelled, "request cancelled")
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError>;
}

/// Parse newline-delimited `Key: Value` header lines. Blank lines and lines
/// starting with `#` are ignored.
pub fn parse_header_lines(text: &str) -> Vec<(String, String)> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (name, value) = line.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}
