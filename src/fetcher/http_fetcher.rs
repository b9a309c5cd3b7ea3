use std::collections::BTreeMap;
use std::error::Error as _;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::Client;
use url::Url;

use crate::fetcher::{
    FetchError, FetchErrorKind, FetchRequest, FetchResponse, Fetcher, Method, Protocol,
};

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Transport-level settings, passed in explicitly at construction.
///
/// Disabling certificate verification is scoped to the client built from
/// this config; it is an opt-in testing mode, never a process-wide default.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub user_agent: String,
    pub accept_invalid_certs: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(20),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_invalid_certs: false,
        }
    }
}

pub struct HttpFetcher {
    /// Client with transport-level redirect following enabled.
    redirecting: Client,
    /// Client that returns 3xx responses as-is.
    direct: Client,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(transport: &TransportConfig) -> Result<Self, FetchError> {
        Ok(Self {
            redirecting: Self::build_client(transport, Policy::limited(10))?,
            direct: Self::build_client(transport, Policy::none())?,
            user_agent: transport.user_agent.clone(),
        })
    }

    fn build_client(transport: &TransportConfig, redirect: Policy) -> Result<Client, FetchError> {
        let mut builder = Client::builder()
            .connect_timeout(transport.connect_timeout)
            .read_timeout(transport.read_timeout)
            .gzip(true)
            .brotli(true)
            .redirect(redirect);

        if transport.accept_invalid_certs {
            tracing::warn!("TLS certificate verification disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder
            .build()
            .map_err(|e| FetchError::new(FetchErrorKind::DnsOrConnect, e.to_string()))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let started = Instant::now();

        let url: Url = request
            .url
            .parse()
            .map_err(|e: url::ParseError| FetchError::new(FetchErrorKind::MalformedUrl, e.to_string()))?;
        let protocol = match url.scheme() {
            "http" => Protocol::Http,
            "https" => Protocol::Https,
            other => {
                return Err(FetchError::new(
                    FetchErrorKind::MalformedUrl,
                    format!("unsupported scheme: {}", other),
                ))
            }
        };

        let client = if request.follow_redirects {
            &self.redirecting
        } else {
            &self.direct
        };

        let mut builder = client
            .request(to_reqwest_method(request.method), url)
            .headers(request_headers(&self.user_agent, request));
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = &request.body {
            if request.method.allows_body() {
                builder = builder.body(body.clone());
            }
        }

        let response = builder.send().await.map_err(classify)?;

        let status = response.status();
        let status_code = status.as_u16();
        let status_message = status.canonical_reason().unwrap_or("").to_string();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in response.headers() {
            headers
                .entry(name.as_str().to_string())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }

        if status.is_client_error() || status.is_server_error() {
            return Err(FetchError::new(
                FetchErrorKind::HttpStatus(status_code),
                format!("HTTP {} {} for {}", status_code, status_message, request.url),
            ));
        }

        let body = if request.method == Method::Head {
            None
        } else {
            let text = response.text().await.map_err(classify)?;
            let normalized = normalize_lines(&text);
            if normalized.is_empty()
                && status.is_success()
                && matches!(request.method, Method::Get | Method::Post)
            {
                return Err(FetchError::new(
                    FetchErrorKind::EmptyBody,
                    format!("empty {} response from {}", status_code, request.url),
                ));
            }
            Some(normalized)
        };

        let elapsed = started.elapsed();
        tracing::debug!(
            url = %request.url,
            status = status_code,
            elapsed_ms = elapsed.as_millis() as u64,
            "fetch complete"
        );

        Ok(FetchResponse {
            status_code,
            status_message,
            protocol,
            headers,
            content_type,
            body,
            elapsed,
        })
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Head => reqwest::Method::HEAD,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Default browser-like headers, overridden per name (case-insensitive) by
/// the request's custom headers. Accept-Encoding is advertised by the client
/// itself so decompression stays transparent.
fn request_headers(user_agent: &str, request: &FetchRequest) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(user_agent) {
        headers.insert(USER_AGENT, value);
    }
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

    for (name, value) in &request.headers {
        let name = match name.parse::<HeaderName>() {
            Ok(name) => name,
            Err(_) => {
                tracing::warn!("Skipping invalid header name: {}", name);
                continue;
            }
        };
        match HeaderValue::from_str(value) {
            Ok(value) => {
                headers.insert(name, value);
            }
            Err(_) => tracing::warn!("Skipping invalid header value for {}", name),
        }
    }

    headers
}

/// Split into lines and reassemble with `\n`, with a trailing newline for
/// non-empty bodies.
fn normalize_lines(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut out = String::with_capacity(text.len() + 1);
    for line in text.lines() {
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn classify(err: reqwest::Error) -> FetchError {
    let message = err.to_string();
    let kind = if err.is_timeout() {
        FetchErrorKind::Timeout
    } else if is_tls_error(&err) {
        FetchErrorKind::TlsTrust
    } else if err.is_builder() {
        FetchErrorKind::MalformedUrl
    } else {
        FetchErrorKind::DnsOrConnect
    };
    FetchError::new(kind, message)
}

fn is_tls_error(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(inner) = source {
        let text = inner.to_string().to_lowercase();
        if text.contains("certificate") || text.contains("tls") || text.contains("ssl") {
            return true;
        }
        source = inner.source();
    }
    false
}
