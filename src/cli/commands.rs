use std::fs;
use std::path::Path;

use crate::app::{AppContext, CoracleError, Result};
use crate::fetcher::{parse_header_lines, FetchRequest, FetchResponse, Method};
use crate::nav::{NavEvent, NavigationController};
use crate::reader;
use crate::server::DemoServer;

const BODY_DISPLAY_LIMIT: usize = 20_000;

pub async fn fetch(
    ctx: &AppContext,
    url: &str,
    method: &str,
    data: Option<String>,
    headers_file: Option<&Path>,
    no_redirects: bool,
) -> Result<()> {
    let method = parse_method(method)?;
    let mut request = match method {
        Method::Get => FetchRequest::get(url),
        Method::Head => FetchRequest::head(url),
        Method::Post => FetchRequest::post(url, data.unwrap_or_default()),
        Method::Put => FetchRequest::put(url, data.unwrap_or_default()),
        Method::Delete => FetchRequest::delete(url),
    };
    if let Some(path) = headers_file {
        let text = fs::read_to_string(path)?;
        request = request.with_headers(parse_header_lines(&text));
    }
    request = request.follow_redirects(!no_redirects);

    let response = ctx.fetcher.fetch(&request).await?;
    print_response(&response);
    Ok(())
}

pub async fn read(ctx: &AppContext, url: &str) -> Result<()> {
    let request = FetchRequest::get(url).follow_redirects(ctx.config.fetch.follow_redirects);
    match ctx.fetcher.fetch(&request).await {
        Ok(response) => {
            let article = reader::extract(response.body_str(), url);
            println!("{}", reader::render_article(&article));
        }
        Err(e) => {
            println!("{}", reader::error_page(url, &e.to_string()));
        }
    }
    Ok(())
}

pub async fn serve(ctx: &AppContext, port: Option<u16>) -> Result<()> {
    let port = port.unwrap_or(ctx.config.server.port);
    let mut server = DemoServer::start(port).await?;
    println!("Demo server running on http://{}/ (Ctrl-C to stop)", server.addr());

    tokio::signal::ctrl_c().await?;
    server.stop().await;
    println!("Server stopped");
    Ok(())
}

/// Interactive session: stdin lines drive the NavigationController, nav
/// events are rendered to stdout. With `raw` the body is printed as-is;
/// otherwise the reader-mode article is rendered.
pub async fn browse(ctx: &AppContext, raw: bool) -> Result<()> {
    let (mut nav, mut events) = NavigationController::new(ctx.fetcher.clone());
    nav.set_reader_mode(!raw);

    let (line_tx, mut line_rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    std::thread::spawn(move || {
        use std::io::BufRead;
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    println!("Commands: open <url>, back, forward, refresh, stop, bookmark <title>, bookmarks, goto <n>, quit");
    loop {
        tokio::select! {
            maybe_line = line_rx.recv() => {
                let Some(line) = maybe_line else { break };
                if !handle_command(&mut nav, line.trim()) {
                    break;
                }
            }
            maybe_event = events.recv() => {
                let Some(event) = maybe_event else { break };
                print_event(&nav, &event, raw);
            }
        }
    }
    Ok(())
}

fn handle_command(nav: &mut NavigationController, line: &str) -> bool {
    let (command, arg) = line.split_once(' ').unwrap_or((line, ""));
    let arg = arg.trim();
    match command {
        "" => {}
        "open" | "o" => {
            if arg.is_empty() {
                println!("usage: open <url>");
            } else {
                nav.navigate(&normalize_url(arg));
            }
        }
        "back" | "b" => nav.back(),
        "forward" | "f" => nav.forward(),
        "refresh" | "r" => nav.refresh(),
        "stop" | "s" => nav.stop(),
        "bookmark" => {
            let title = if arg.is_empty() { "untitled" } else { arg };
            match nav.add_bookmark(title) {
                Some(bookmark) => println!("Bookmarked: {} -> {}", bookmark.title, bookmark.url),
                None => println!("Nothing to bookmark yet"),
            }
        }
        "bookmarks" => {
            if nav.bookmarks().is_empty() {
                println!("No bookmarks");
            }
            for (i, bookmark) in nav.bookmarks().iter().enumerate() {
                println!("{:>3}  {}  {}", i, bookmark.title, bookmark.url);
            }
        }
        "goto" => match arg.parse::<usize>().ok().and_then(|i| nav.bookmarks().get(i)) {
            Some(bookmark) => {
                let url = bookmark.url.clone();
                nav.select_bookmark(&url);
            }
            None => println!("usage: goto <bookmark index>"),
        },
        "quit" | "q" => return false,
        _ => println!("unknown command: {}", command),
    }
    true
}

fn print_event(nav: &NavigationController, event: &NavEvent, raw: bool) {
    match event {
        NavEvent::LoadStarted { url } => println!("Loading: {}", url),
        NavEvent::LoadSucceeded { response, article } => {
            println!(
                "Done - {}ms - {} - HTTP {} {}",
                response.elapsed.as_millis(),
                format_bytes(response.body_str().len() as u64),
                response.status_code,
                response.status_message
            );
            match article {
                Some(article) if !raw => println!("{}", reader::render_article(article)),
                _ => print_body(response.body_str()),
            }
        }
        NavEvent::LoadFailed { message, .. } => {
            let url = nav.current_url().unwrap_or("");
            println!("{}", reader::error_page(url, message));
        }
        NavEvent::Stopped => println!("Stopped"),
    }
}

fn print_response(response: &FetchResponse) {
    println!("Protocol:     {}", response.protocol);
    println!(
        "Status:       {} {}",
        response.status_code, response.status_message
    );
    println!(
        "Content-Type: {}",
        response.content_type.as_deref().unwrap_or("N/A")
    );
    println!("Elapsed:      {} ms", response.elapsed.as_millis());
    println!(
        "Length:       {}",
        format_bytes(response.body_str().len() as u64)
    );

    let is_html = response
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.contains("text/html"));
    if is_html {
        let stats = reader::tag_stats(response.body_str());
        println!();
        println!("HTML tag counts:");
        println!("  <p>:    {}", stats.p_tags);
        println!("  <div>:  {}", stats.div_tags);
        println!("  <span>: {}", stats.span_tags);
        println!("  <img>:  {}", stats.img_tags);
    }

    println!();
    println!("Headers:");
    for (name, values) in &response.headers {
        println!("  {:<24} {}", name, values.join(", "));
    }

    if let Some(body) = &response.body {
        println!();
        print_body(body);
    }
}

fn print_body(body: &str) {
    if body.len() > BODY_DISPLAY_LIMIT {
        println!("{}", display_prefix(body));
        println!("... (truncated, {} bytes total)", body.len());
    } else {
        println!("{}", body);
    }
}

/// Longest prefix within the display limit that ends on a char boundary, so
/// truncation never splits a multi-byte character.
fn display_prefix(body: &str) -> &str {
    if body.len() <= BODY_DISPLAY_LIMIT {
        return body;
    }
    let mut end = BODY_DISPLAY_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

fn parse_method(method: &str) -> Result<Method> {
    match method.to_uppercase().as_str() {
        "GET" => Ok(Method::Get),
        "POST" => Ok(Method::Post),
        "HEAD" => Ok(Method::Head),
        "PUT" => Ok(Method::Put),
        "DELETE" => Ok(Method::Delete),
        other => Err(CoracleError::Other(format!("unsupported method: {}", other))),
    }
}

/// Bare hostnames get an http:// prefix, like a browser address bar.
fn normalize_url(input: &str) -> String {
    if input.starts_with("http://") || input.starts_with("https://") {
        input.to_string()
    } else {
        format!("http://{}", input)
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
