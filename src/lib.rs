//! # Coracle
//!
//! A text-first web browsing engine: a cancellable HTTP fetcher, a
//! navigation controller with history, a heuristic reader-mode article
//! extractor, and a local demo server for exercising all of it offline.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → NavigationController → Reader → output
//!                    ↑
//!               DemoServer (local test target)
//! ```
//!
//! - [`fetcher`]: HTTP client with per-request redirect/timeout control
//! - [`nav`]: Navigation state machine with back/forward history and
//!   stale-load cancellation
//! - [`reader`]: Regex-based article extraction and HTML rendering
//! - [`server`]: Fixed-route local demo server
//!
//! ## Quick Start
//!
//! ```bash
//! # Start the demo server
//! coracle serve
//!
//! # Fetch a page and inspect the response
//! coracle fetch http://localhost:8080/test
//!
//! # Extract the readable article from a page
//! coracle read http://localhost:8080/
//!
//! # Interactive session with history
//! coracle browse
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the
/// configuration and the shared fetcher.
pub mod app;

/// Command-line interface using clap.
///
/// Defines the CLI structure and subcommands:
/// - `fetch <url>` - Fetch once and print response details
/// - `read <url>` - Fetch and print the reader-mode article
/// - `serve` - Run the local demo server
/// - `browse` - Interactive browsing session
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/coracle/config.toml`, covering transport
/// timeouts, redirect policy, and the demo server port.
pub mod config;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for page fetching
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
/// - [`FetchRequest`](fetcher::FetchRequest) / [`FetchResponse`](fetcher::FetchResponse):
///   method-checked request builder and normalized response
pub mod fetcher;

/// Navigation state machine.
///
/// - [`NavigationController`](nav::NavigationController): back/forward
///   stacks, refresh, stop, bookmarks
/// - [`NavEvent`](nav::NavEvent): load lifecycle events for any frontend
///
/// A generation counter guarantees superseded loads never surface.
pub mod nav;

/// Reader-mode extraction and rendering.
///
/// Heuristic, regex-based extraction of title, headings, paragraphs,
/// links, and content blocks from raw HTML. Tolerates malformed markup.
pub mod reader;

/// Local demo server.
///
/// Fixed routes (`/`, `/test`, `/info`, `/echo`, `/status`,
/// `/api/users`) served by axum with graceful shutdown, giving the
/// fetcher and browser a deterministic offline target.
pub mod server;
