//! Search lifecycle for one UI context.
//!
//! A [`SearchSession`] owns the current [`SearchState`] and at most one
//! in-flight request. Requests run as Tokio tasks and report back over a
//! channel; the owner applies those reports with
//! [`SearchSession::poll_completions`] or [`SearchSession::wait_for_completion`],
//! so state changes and callbacks only ever happen on the owner's context.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use reqwest::Url;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};

use super::engines::{itunes, EngineError, HttpTransport};
use super::service::CatalogTransport;
use crate::core::{SessionConfig, StoreSearchConfig};
use crate::types::{Category, SearchResult, SearchState};

/// Invoked once with `true` when a search succeeded, `false` when it failed.
/// Never invoked for empty queries, superseded requests or cancellations.
pub type SearchComplete = Box<dyn FnOnce(bool) + Send + 'static>;

struct Completion {
    generation: u64,
    outcome: Result<Vec<SearchResult>, EngineError>,
}

enum Applied {
    Stale,
    Suppressed,
    Finished(bool),
}

struct InFlight {
    generation: u64,
    task: JoinHandle<()>,
    on_complete: SearchComplete,
}

pub struct SearchSession {
    transport: Arc<dyn CatalogTransport>,
    endpoint: Url,
    request_timeout: Option<Duration>,
    state: SearchState,
    state_tx: watch::Sender<SearchState>,
    in_flight: Option<InFlight>,
    next_generation: u64,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    last_failure: Option<EngineError>,
}

impl std::fmt::Debug for SearchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchSession")
            .field("endpoint", &self.endpoint.as_str())
            .field("state", &self.state.label())
            .field("in_flight", &self.in_flight.as_ref().map(|r| r.generation))
            .finish()
    }
}

impl SearchSession {
    pub fn new(transport: Arc<dyn CatalogTransport>, config: SessionConfig) -> Self {
        let (state_tx, _) = watch::channel(SearchState::NotSearchedYet);
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            transport,
            endpoint: config.endpoint,
            request_timeout: config.request_timeout,
            state: SearchState::NotSearchedYet,
            state_tx,
            in_flight: None,
            next_generation: 0,
            completions_tx,
            completions_rx,
            last_failure: None,
        }
    }

    /// Session backed by the HTTP transport, configured from file/env settings.
    pub fn from_config(cfg: &StoreSearchConfig) -> anyhow::Result<Self> {
        let transport = HttpTransport::from_config(cfg)?;
        Ok(Self::new(Arc::new(transport), cfg.session_config()?))
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Receiver that observes every state transition, starting from the current one.
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state_tx.subscribe()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Most recent non-cancellation failure, cleared when a new search starts.
    pub fn last_failure(&self) -> Option<&EngineError> {
        self.last_failure.as_ref()
    }

    /// Starts a search for `text` in `category`.
    ///
    /// Empty text is a no-op and returns `false`. Otherwise any pending request
    /// is aborted (its callback is dropped uncalled), the state becomes
    /// [`SearchState::Loading`] before this returns, and the request is spawned
    /// on the current Tokio runtime.
    pub fn perform_search<F>(&mut self, text: &str, category: Category, on_complete: F) -> bool
    where
        F: FnOnce(bool) + Send + 'static,
    {
        if text.is_empty() {
            return false;
        }

        self.abort_in_flight("superseded");
        self.last_failure = None;
        self.set_state(SearchState::Loading);

        self.next_generation += 1;
        let generation = self.next_generation;
        let url = itunes::build_search_url(&self.endpoint, text, category);
        debug!(generation, %url, "dispatching catalog search");

        let transport = Arc::clone(&self.transport);
        let timeout = self.request_timeout;
        let tx = self.completions_tx.clone();
        let span = info_span!("catalog_search", generation, category = %category);
        let task = tokio::spawn(
            async move {
                let outcome = AssertUnwindSafe(itunes::search(transport.as_ref(), url, timeout))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| {
                        Err(EngineError::Transport(format!(
                            "engine panicked: {}",
                            panic_message(payload.as_ref())
                        )))
                    });
                // The receiver lives as long as the session; a send error only
                // means the session is gone.
                let _ = tx.send(Completion {
                    generation,
                    outcome,
                });
            }
            .instrument(span),
        );

        self.in_flight = Some(InFlight {
            generation,
            task,
            on_complete: Box::new(on_complete),
        });
        true
    }

    /// Aborts the pending request without invoking its callback.
    ///
    /// A [`SearchState::Loading`] state falls back to
    /// [`SearchState::NotSearchedYet`], including one left behind by a
    /// transport-side cancellation; settled states are left alone.
    pub fn cancel(&mut self) {
        self.abort_in_flight("cancelled");
        if self.state.is_loading() {
            self.set_state(SearchState::NotSearchedYet);
        }
    }

    /// Applies every completion already delivered, without waiting.
    /// Returns how many current (non-stale) completions were applied.
    pub fn poll_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            if !matches!(self.apply(completion), Applied::Stale) {
                applied += 1;
            }
        }
        applied
    }

    /// Waits for the current request to settle and applies it.
    ///
    /// Returns `Some(success)` when a callback fired, `None` when nothing was
    /// pending or the request ended in a cancellation-class error.
    pub async fn wait_for_completion(&mut self) -> Option<bool> {
        while self.in_flight.is_some() {
            let completion = self.completions_rx.recv().await?;
            match self.apply(completion) {
                Applied::Stale => continue,
                Applied::Suppressed => return None,
                Applied::Finished(success) => return Some(success),
            }
        }
        None
    }

    fn apply(&mut self, completion: Completion) -> Applied {
        let Completion {
            generation,
            outcome,
        } = completion;

        let current = self.in_flight.as_ref().map(|r| r.generation);
        if current != Some(generation) {
            debug!(generation, ?current, "dropping stale search completion");
            return Applied::Stale;
        }
        let Some(in_flight) = self.in_flight.take() else {
            return Applied::Stale;
        };

        let (next, success) = match outcome {
            Ok(results) if results.is_empty() => {
                info!(generation, "search finished with no results");
                (SearchState::NoResults, true)
            }
            Ok(results) => {
                info!(generation, count = results.len(), "search finished");
                (SearchState::Results(results.into()), true)
            }
            Err(e) if e.is_cancellation() => {
                debug!(generation, "search cancelled by transport; dropping callback");
                return Applied::Suppressed;
            }
            Err(e) => {
                warn!(generation, kind = e.kind(), "search failed: {}", e);
                self.last_failure = Some(e);
                (SearchState::NotSearchedYet, false)
            }
        };

        self.set_state(next);
        (in_flight.on_complete)(success);
        Applied::Finished(success)
    }

    fn abort_in_flight(&mut self, reason: &str) {
        if let Some(previous) = self.in_flight.take() {
            debug!(generation = previous.generation, reason, "aborting in-flight search");
            previous.task.abort();
        }
    }

    fn set_state(&mut self, next: SearchState) {
        self.state = next.clone();
        self.state_tx.send_replace(next);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        if let Some(pending) = self.in_flight.take() {
            pending.task.abort();
        }
    }
}
