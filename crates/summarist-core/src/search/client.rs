use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::{ApiError, BookApi};
use crate::models::BookSummary;

/// Quiet period after the last keystroke before a request goes out.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Upper bound on one search request.
const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 8;

/// What the search box and its result panel should show right now.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchView {
    pub query: String,
    pub results: Vec<BookSummary>,
    pub is_loading: bool,
    pub is_open: bool,
}

#[derive(Default)]
struct SearchState {
    view: SearchView,
    /// Bumped by every query change. A request only applies its outcome
    /// if the generation it started under is still current.
    generation: u64,
    /// Debounce-then-fetch task for the latest keystroke.
    pending: Option<JoinHandle<()>>,
}

/// Turns keystrokes into at most one settled request per pause in typing.
///
/// `on_query_changed` spawns onto the current tokio runtime, so it must be
/// called from within one.
pub struct SearchClient<A> {
    api: Arc<A>,
    state: Arc<Mutex<SearchState>>,
    debounce: Duration,
    request_timeout: Duration,
}

impl<A: BookApi + 'static> SearchClient<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self::with_timing(
            api,
            Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            Duration::from_secs(DEFAULT_SEARCH_TIMEOUT_SECS),
        )
    }

    pub fn with_timing(api: Arc<A>, debounce: Duration, request_timeout: Duration) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(SearchState::default())),
            debounce,
            request_timeout,
        }
    }

    pub fn snapshot(&self) -> SearchView {
        lock(&self.state).view.clone()
    }

    /// Called on every keystroke. Cancels whatever the previous keystroke
    /// scheduled, then schedules one search after the quiet period. Blank
    /// input clears the results and closes the panel straight away.
    pub fn on_query_changed(&self, text: &str) {
        let Some(generation) = begin(&self.state, text) else {
            return;
        };

        let api = Arc::clone(&self.api);
        let state = Arc::clone(&self.state);
        let debounce = self.debounce;
        let timeout = self.request_timeout;
        let text = text.to_string();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            execute(api.as_ref(), &state, timeout, generation, &text).await;
        });

        let mut state = lock(&self.state);
        if state.generation == generation {
            state.pending = Some(handle);
        } else {
            handle.abort();
        }
    }

    /// Search for `text` right away, superseding anything pending or in
    /// flight. Resolves once this request has settled.
    pub async fn search(&self, text: &str) {
        if let Some(generation) = begin(&self.state, text) {
            execute(self.api.as_ref(), &self.state, self.request_timeout, generation, text).await;
        }
    }

    /// Pointer pressed somewhere. Outside the search area the panel closes;
    /// query and results stay so refocusing can show them again.
    pub fn on_pointer_down(&self, inside_search: bool) {
        if inside_search {
            return;
        }
        let mut state = lock(&self.state);
        if state.view.is_open {
            debug!("Search panel dismissed");
            state.view.is_open = false;
        }
    }

    /// Input focused again: reopen the panel over whatever the current query
    /// holds, including an empty result list.
    pub fn on_focus(&self) {
        let mut state = lock(&self.state);
        if !state.view.query.trim().is_empty() {
            state.view.is_open = true;
        }
    }

    /// A result was picked. Resets the search box and returns the pick.
    pub fn select_result(&self, id: &str) -> Option<BookSummary> {
        let mut state = lock(&self.state);
        let chosen = state.view.results.iter().find(|b| b.id == id).cloned()?;

        state.generation += 1;
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
        state.view = SearchView::default();
        Some(chosen)
    }
}

impl<A> Drop for SearchClient<A> {
    fn drop(&mut self) {
        if let Some(pending) = lock(&self.state).pending.take() {
            pending.abort();
        }
    }
}

fn lock(state: &Mutex<SearchState>) -> MutexGuard<'_, SearchState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Record a new query and invalidate everything issued for older ones.
/// Returns the generation to search under, or `None` for blank input.
fn begin(state: &Mutex<SearchState>, text: &str) -> Option<u64> {
    let mut state = lock(state);
    state.generation += 1;
    if let Some(pending) = state.pending.take() {
        pending.abort();
    }

    state.view.query = text.to_string();
    state.view.is_loading = false;

    if text.trim().is_empty() {
        state.view.results.clear();
        state.view.is_open = false;
        return None;
    }
    Some(state.generation)
}

/// Clears `is_loading` when a request ends without settling, e.g. because
/// the caller dropped the future. Newer generations are left alone.
struct LoadingGuard<'a> {
    state: &'a Mutex<SearchState>,
    generation: u64,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut state = lock(self.state);
        if state.generation == self.generation {
            state.view.is_loading = false;
        }
    }
}

/// Run one request and apply its outcome if nothing newer has been issued.
async fn execute<A: BookApi>(
    api: &A,
    state: &Mutex<SearchState>,
    timeout: Duration,
    generation: u64,
    text: &str,
) {
    {
        let mut state = lock(state);
        if state.generation != generation {
            return;
        }
        state.view.is_loading = true;
    }
    // Declared before the final lock below, so it drops after that lock is released.
    let _loading = LoadingGuard { state, generation };

    debug!(query = text, generation, "Searching");
    let outcome = match tokio::time::timeout(timeout, api.search_books(text)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(ApiError::Timeout(timeout.as_secs())),
    };

    let mut state = lock(state);
    if state.generation != generation {
        debug!(query = text, generation, current = state.generation, "Discarding stale search result");
        return;
    }

    state.view.is_loading = false;
    match outcome {
        Ok(results) => {
            debug!(query = text, count = results.len(), "Search complete");
            state.view.results = results;
            state.view.is_open = true;
        }
        Err(e) => {
            warn!(query = text, error = %e, "Search failed");
            state.view.results.clear();
        }
    }
}
