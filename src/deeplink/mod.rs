//! Deep-link routing between the feed and a single opened thought.
//!
//! The resolver is a two-state machine: `Feed` (nothing selected) and
//! `Reading(id)` (one thought open). Paths follow the `/status/{id}`
//! convention; anything that is not the root and not a resolvable status path
//! falls back to the feed rather than erroring. History is modelled
//! explicitly as a stack with a cursor so back/forward navigation re-resolves
//! the same way a browser reload would.

use uuid::Uuid;

use crate::store::Store;

/// A parsed location. Parsing is total: unknown paths map to [`Route::Feed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Feed,
    Thought(Uuid),
}

impl Route {
    /// Parse a URL path. `/status/{id}` selects a thought; `/` is the feed
    /// root; any other path is treated as the feed.
    pub fn parse(path: &str) -> Route {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        match (segments.next(), segments.next(), segments.next()) {
            (Some("status"), Some(id), None) => match Uuid::parse_str(id) {
                Ok(id) => Route::Thought(id),
                Err(_) => Route::Feed,
            },
            _ => Route::Feed,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Feed => "/".to_string(),
            Route::Thought(id) => format!("/status/{id}"),
        }
    }
}

/// The resolved view state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Feed,
    Reading(Uuid),
}

/// Deep-link resolver with an explicit history stack.
///
/// Every query re-resolves the current route against the live store, so a
/// thought deleted after being opened degrades to the feed instead of a
/// dangling selection.
#[derive(Debug)]
pub struct Resolver {
    history: Vec<Route>,
    cursor: usize,
}

impl Resolver {
    /// Resolve the initial load path. Direct deep links and refreshes on a
    /// status URL start here.
    pub fn new(path: &str) -> Self {
        Self {
            history: vec![Route::parse(path)],
            cursor: 0,
        }
    }

    /// Open a thought. Pushes a history entry only if the id resolves;
    /// otherwise the state is unchanged.
    pub fn open(&mut self, store: &Store, id: Uuid) {
        if store.get(id).is_none() {
            return;
        }
        self.push(Route::Thought(id));
    }

    /// Close the reading view and return to the feed root.
    pub fn close(&mut self) {
        self.push(Route::Feed);
    }

    /// Browser-back. No-op at the oldest entry.
    pub fn back(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Browser-forward. No-op at the newest entry.
    pub fn forward(&mut self) {
        if self.cursor + 1 < self.history.len() {
            self.cursor += 1;
        }
    }

    /// The path encoded by the current history entry.
    pub fn current_path(&self) -> String {
        self.history[self.cursor].path()
    }

    /// Re-resolve the current entry against the store. A stale id (deleted
    /// thought) resolves to the feed.
    pub fn current_view(&self, store: &Store) -> View {
        match self.history[self.cursor] {
            Route::Feed => View::Feed,
            Route::Thought(id) if store.get(id).is_some() => View::Reading(id),
            Route::Thought(_) => View::Feed,
        }
    }

    fn push(&mut self, route: Route) {
        self.history.truncate(self.cursor + 1);
        self.history.push(route);
        self.cursor = self.history.len() - 1;
    }
}
