//! End-to-end tests wiring the demo server, the HTTP fetcher, and the
//! navigation controller together over loopback.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use coracle::fetcher::http_fetcher::{HttpFetcher, TransportConfig};
use coracle::fetcher::{FetchErrorKind, Fetcher};
use coracle::nav::{LoadPhase, NavEvent, NavigationController};
use coracle::server::DemoServer;

async fn next_event(rx: &mut mpsc::UnboundedReceiver<NavEvent>) -> NavEvent {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

fn loopback_fetcher() -> Arc<dyn Fetcher> {
    Arc::new(HttpFetcher::new(&TransportConfig::default()).expect("fetcher builds"))
}

#[tokio::test]
async fn reader_mode_navigation_resolves_links_against_origin() {
    let mut server = DemoServer::start(0).await.expect("server starts");
    let origin = format!("http://{}", server.addr());
    let (mut nav, mut rx) = NavigationController::new(loopback_fetcher());
    nav.set_reader_mode(true);

    nav.navigate(&format!("{origin}/"));
    assert!(matches!(next_event(&mut rx).await, NavEvent::LoadStarted { .. }));

    match next_event(&mut rx).await {
        NavEvent::LoadSucceeded { response, article } => {
            assert_eq!(response.status_code, 200);
            let article = article.expect("reader mode attaches an article");
            assert_eq!(article.title, "Coracle Demo Server");
            assert!(!article.links.is_empty());
            // Root-relative hrefs resolve against the ephemeral origin,
            // port included.
            for link in &article.links {
                assert!(
                    link.href.starts_with(&origin),
                    "link {} escaped origin {}",
                    link.href,
                    origin
                );
            }
        }
        other => panic!("expected success, got {other:?}"),
    }
    assert_eq!(nav.phase(), LoadPhase::Loaded);

    server.stop().await;
}

#[tokio::test]
async fn history_refetches_from_live_server() {
    let mut server = DemoServer::start(0).await.expect("server starts");
    let origin = format!("http://{}", server.addr());
    let (mut nav, mut rx) = NavigationController::new(loopback_fetcher());

    nav.navigate(&format!("{origin}/"));
    next_event(&mut rx).await;
    next_event(&mut rx).await;
    nav.navigate(&format!("{origin}/test"));
    next_event(&mut rx).await;
    next_event(&mut rx).await;

    nav.back();
    next_event(&mut rx).await;
    match next_event(&mut rx).await {
        NavEvent::LoadSucceeded { response, .. } => {
            assert!(response.body_str().contains("Coracle Demo Server"));
        }
        other => panic!("expected success, got {other:?}"),
    }
    assert_eq!(nav.current_url(), Some(format!("{origin}/").as_str()));
    assert_eq!(nav.forward_stack(), [format!("{origin}/test")]);

    server.stop().await;
}

#[tokio::test]
async fn unanswered_request_times_out_as_timeout() {
    // A listener that never accepts: the kernel completes the handshake via
    // the backlog, then the request hangs until the per-request timeout.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");

    let (mut nav, mut rx) = NavigationController::new(loopback_fetcher());
    nav.set_request_timeout(Some(Duration::from_millis(300)));

    nav.navigate(&format!("http://{addr}/"));
    assert!(matches!(next_event(&mut rx).await, NavEvent::LoadStarted { .. }));

    match next_event(&mut rx).await {
        NavEvent::LoadFailed { kind, .. } => assert_eq!(kind, FetchErrorKind::Timeout),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(nav.phase(), LoadPhase::Error);
    drop(listener);
}
