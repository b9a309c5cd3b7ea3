//! Navigation state machine: current URL, back/forward history, and the
//! single in-flight load slot.
//!
//! A controller instance is single-writer: its methods are `&mut self` and
//! never run concurrently against the same instance. The spawned fetch task
//! shares only the phase/generation pair behind a mutex. Starting a new
//! navigation bumps the generation before cancelling the superseded token,
//! and the task re-checks the generation under the same lock before
//! publishing anything, so a late result from an old load can never
//! overwrite state set by a newer one.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::fetcher::{FetchError, FetchErrorKind, FetchRequest, FetchResponse, Fetcher};
use crate::reader::{self, ArticleDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Loading,
    Loaded,
    Error,
    Stopped,
}

/// Events delivered to the presentation layer. Transport failures are
/// always mapped to `LoadFailed`, never surfaced as raw errors.
#[derive(Debug)]
pub enum NavEvent {
    LoadStarted {
        url: String,
    },
    LoadSucceeded {
        response: FetchResponse,
        article: Option<ArticleDocument>,
    },
    LoadFailed {
        kind: FetchErrorKind,
        message: String,
    },
    Stopped,
}

/// An opaque navigable target owned by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    pub title: String,
    pub url: String,
}

struct Shared {
    phase: LoadPhase,
    generation: u64,
}

pub struct NavigationController {
    fetcher: Arc<dyn Fetcher>,
    events: mpsc::UnboundedSender<NavEvent>,
    shared: Arc<Mutex<Shared>>,
    current_url: Option<String>,
    back_stack: Vec<String>,
    forward_stack: Vec<String>,
    bookmarks: Vec<Bookmark>,
    in_flight: Option<CancellationToken>,
    reader_mode: bool,
    request_timeout: Option<Duration>,
}

impl NavigationController {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> (Self, mpsc::UnboundedReceiver<NavEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let controller = Self {
            fetcher,
            events,
            shared: Arc::new(Mutex::new(Shared {
                phase: LoadPhase::Idle,
                generation: 0,
            })),
            current_url: None,
            back_stack: Vec::new(),
            forward_stack: Vec::new(),
            bookmarks: Vec::new(),
            in_flight: None,
            reader_mode: false,
            request_timeout: None,
        };
        (controller, rx)
    }

    pub fn set_reader_mode(&mut self, enabled: bool) {
        self.reader_mode = enabled;
    }

    pub fn reader_mode(&self) -> bool {
        self.reader_mode
    }

    /// Per-fetch timeout override, on top of the transport-level timeouts.
    pub fn set_request_timeout(&mut self, timeout: Option<Duration>) {
        self.request_timeout = timeout;
    }

    pub fn phase(&self) -> LoadPhase {
        self.shared.lock().expect("navigation state poisoned").phase
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    pub fn back_stack(&self) -> &[String] {
        &self.back_stack
    }

    pub fn forward_stack(&self) -> &[String] {
        &self.forward_stack
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    /// Navigate to a new URL. Cancels and discards any in-flight load,
    /// pushes the previous URL onto the back stack (unless identical) and
    /// clears the forward stack.
    pub fn navigate(&mut self, url: &str) {
        let url = url.trim();
        if url.is_empty() {
            return;
        }
        self.cancel_superseded();
        if let Some(current) = &self.current_url {
            if current != url {
                self.back_stack.push(current.clone());
                self.forward_stack.clear();
            }
        }
        self.current_url = Some(url.to_string());
        self.start_load(url.to_string());
    }

    /// History entries are URLs, not cached documents: going back re-fetches.
    pub fn back(&mut self) {
        let Some(target) = self.back_stack.pop() else {
            return;
        };
        self.cancel_superseded();
        if let Some(current) = self.current_url.take() {
            self.forward_stack.push(current);
        }
        self.current_url = Some(target.clone());
        self.start_load(target);
    }

    pub fn forward(&mut self) {
        let Some(target) = self.forward_stack.pop() else {
            return;
        };
        self.cancel_superseded();
        if let Some(current) = self.current_url.take() {
            self.back_stack.push(current);
        }
        self.current_url = Some(target.clone());
        self.start_load(target);
    }

    /// Re-fetch the current URL without touching the history stacks.
    pub fn refresh(&mut self) {
        let Some(url) = self.current_url.clone() else {
            return;
        };
        self.cancel_superseded();
        self.start_load(url);
    }

    /// Cancel the in-flight load, if any. The cancelled task delivers a
    /// single `Stopped` event and no success or failure.
    pub fn stop(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }

    pub fn add_bookmark(&mut self, title: &str) -> Option<&Bookmark> {
        let url = self.current_url.clone()?;
        self.bookmarks.push(Bookmark {
            title: title.to_string(),
            url,
        });
        self.bookmarks.last()
    }

    pub fn select_bookmark(&mut self, url: &str) {
        self.navigate(url);
    }

    /// Invalidate the in-flight load without delivering any event: the
    /// generation bump happens before the cancel, so the old task observes
    /// a stale generation and stays silent.
    fn cancel_superseded(&mut self) {
        if let Some(token) = self.in_flight.take() {
            self.shared
                .lock()
                .expect("navigation state poisoned")
                .generation += 1;
            token.cancel();
        }
    }

    fn start_load(&mut self, url: String) {
        let token = CancellationToken::new();
        self.in_flight = Some(token.clone());

        let my_generation = {
            let mut shared = self.shared.lock().expect("navigation state poisoned");
            shared.generation += 1;
            shared.phase = LoadPhase::Loading;
            shared.generation
        };

        tracing::debug!(url = %url, "load started");
        let _ = self.events.send(NavEvent::LoadStarted { url: url.clone() });

        let fetcher = Arc::clone(&self.fetcher);
        let shared = Arc::clone(&self.shared);
        let events = self.events.clone();
        let reader_mode = self.reader_mode;
        let timeout = self.request_timeout;

        tokio::spawn(async move {
            let mut request = FetchRequest::get(&url);
            if let Some(timeout) = timeout {
                request = request.with_timeout(timeout);
            }

            let outcome = tokio::select! {
                _ = token.cancelled() => Err(FetchError::cancelled()),
                result = fetcher.fetch(&request) => result,
            };

            let mut shared = shared.lock().expect("navigation state poisoned");
            if shared.generation != my_generation {
                // Superseded while in flight; deliver nothing.
                return;
            }

            match outcome {
                Ok(response) => {
                    let article =
                        reader_mode.then(|| reader::extract(response.body_str(), &url));
                    shared.phase = LoadPhase::Loaded;
                    let _ = events.send(NavEvent::LoadSucceeded { response, article });
                }
                Err(err) if err.kind == FetchErrorKind::Cancelled => {
                    tracing::debug!(url = %url, "load stopped");
                    shared.phase = LoadPhase::Stopped;
                    let _ = events.send(NavEvent::Stopped);
                }
                Err(err) => {
                    tracing::warn!(url = %url, error = %err, "load failed");
                    shared.phase = LoadPhase::Error;
                    let _ = events.send(NavEvent::LoadFailed {
                        kind: err.kind,
                        message: err.message,
                    });
                }
            }
        });
    }
}
