//! Fixed-route HTTP server used as a deterministic, same-origin fetch
//! target. Handlers are stateless across requests and freely concurrent.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use chrono::Local;
use html_escape::encode_text;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::app::Result;

pub const DEFAULT_PORT: u16 = 8080;

pub struct DemoServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl DemoServer {
    /// Bind and serve on 127.0.0.1. Binding an already-taken port fails
    /// with the underlying bind error; port 0 picks an ephemeral port.
    pub async fn start(port: u16) -> Result<Self> {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], port))).await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();

        let handle = tokio::spawn(async move {
            let service = router().into_make_service_with_connect_info::<SocketAddr>();
            let result = axum::serve(listener, service)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await;
            if let Err(e) = result {
                tracing::error!("demo server terminated: {}", e);
            }
        });

        tracing::info!("demo server listening on {}", addr);
        Ok(Self {
            addr,
            shutdown,
            handle: Some(handle),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Safe to call any number of times; the task handle is awaited once.
    pub async fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

fn router() -> Router {
    Router::new()
        .route("/", get(home).fallback(method_not_allowed))
        .route("/test", get(test_page).fallback(method_not_allowed))
        .route("/info", get(info).fallback(method_not_allowed))
        .route("/echo", post(echo).fallback(method_not_allowed))
        .route("/status", get(status_page).fallback(method_not_allowed))
        .route("/api/users", get(api_users).fallback(method_not_allowed))
}

async fn method_not_allowed() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

async fn home() -> Html<String> {
    let now = Local::now().format("%Y-%m-%d %H:%M:%S");
    Html(format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset='UTF-8'><title>Coracle Demo Server</title></head>\n\
         <body>\n<h1>Coracle Demo Server</h1>\n\
         <p>Local fixed-route server for testing HTTP requests.</p>\n\
         <p>Server time: {now}</p>\n\
         <ul>\n\
         <li><a href='/'>/ (GET, HEAD)</a> - this landing page</li>\n\
         <li><a href='/test'>/test (GET)</a> - tag-count fixture page</li>\n\
         <li><a href='/info'>/info (GET)</a> - request and server details</li>\n\
         <li>/echo (POST) - echoes the request body as JSON</li>\n\
         <li><a href='/status'>/status (GET, HEAD)</a> - status headers</li>\n\
         <li><a href='/api/users'>/api/users (GET)</a> - demo JSON API</li>\n\
         </ul>\n</body>\n</html>\n"
    ))
}

/// Fixture with exactly 10 divs, 15 paragraphs, 8 spans and 5 images.
async fn test_page() -> Html<String> {
    let mut html = String::from(
        "<!DOCTYPE html><html><head><meta charset='UTF-8'><title>Test Page</title></head><body>",
    );
    html.push_str("<h1>Test Page - HTML Tags Demo</h1>");
    for i in 1..=10 {
        html.push_str(&format!("<div class='section'>This is div number {i}</div>"));
    }
    for i in 1..=15 {
        html.push_str(&format!(
            "<p>This is paragraph number {i}. Lorem ipsum dolor sit amet.</p>"
        ));
    }
    for i in 1..=8 {
        html.push_str(&format!("<span>Span {i}</span> "));
    }
    for i in 1..=5 {
        html.push_str(&format!("<img src='image{i}.jpg' alt='Image {i}'>"));
    }
    html.push_str("</body></html>");
    Html(html)
}

async fn info(
    method: Method,
    uri: Uri,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Html<String> {
    let mut html = String::from(
        "<!DOCTYPE html><html><head><meta charset='UTF-8'><title>Server Info</title></head><body>",
    );
    html.push_str("<h2>Server Information</h2><table>");
    html.push_str("<tr><th>Property</th><th>Value</th></tr>");
    html.push_str(&format!("<tr><td>Server Time</td><td>{}</td></tr>", Local::now()));
    html.push_str("<tr><td>Protocol</td><td>HTTP/1.1</td></tr>");
    html.push_str(&format!("<tr><td>Request Method</td><td>{method}</td></tr>"));
    html.push_str(&format!(
        "<tr><td>Request URI</td><td>{}</td></tr>",
        encode_text(&uri.to_string())
    ));
    html.push_str(&format!("<tr><td>Remote Address</td><td>{remote}</td></tr>"));
    html.push_str("<tr><td colspan='2'><strong>Request Headers:</strong></td></tr>");
    for (name, value) in &headers {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>",
            encode_text(name.as_str()),
            encode_text(&String::from_utf8_lossy(value.as_bytes()))
        ));
    }
    html.push_str("</table></body></html>");
    Html(html)
}

/// Embeds the raw request body verbatim under `receivedData`: a malformed
/// JSON body makes the response malformed too (documented limitation).
async fn echo(body: String) -> impl IntoResponse {
    let response = format!(
        "{{\n  \"status\": \"success\",\n  \"message\": \"Echo successful\",\n  \"timestamp\": \"{}\",\n  \"receivedData\": {}\n}}",
        Local::now().format("%Y-%m-%dT%H:%M:%S"),
        body
    );
    (
        [(header::CONTENT_TYPE, "application/json; charset=UTF-8")],
        response,
    )
}

async fn status_page() -> impl IntoResponse {
    let now = Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();
    (
        [
            ("Content-Type", "text/plain".to_string()),
            ("Server-Status", "OK".to_string()),
            ("Server-Time", now.clone()),
            ("X-Custom-Header", "coracle-demo-server".to_string()),
        ],
        format!("Status: OK\nTime: {now}\n"),
    )
}

async fn api_users() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "users": [
            { "id": 1, "name": "Nguyen Van A", "email": "nguyenvana@example.com" },
            { "id": 2, "name": "Tran Thi B", "email": "tranthib@example.com" },
            { "id": 3, "name": "Le Van C", "email": "levanc@example.com" },
        ],
        "total": 3,
        "timestamp": Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
    }))
}
