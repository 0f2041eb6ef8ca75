use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::error::GatewayError;
use crate::gateway::{GatewayResult, RecipeGateway};
use crate::models::{Recipe, SearchFilters, SearchPage};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One query's accumulated results.
///
/// `offset` counts items upstream has returned, so it can run ahead of
/// `results.len()` when hits are dropped in conversion. Pages are appended
/// in the order received with no de-duplication.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchSession {
    pub query: String,
    pub filters: SearchFilters,
    pub offset: usize,
    pub results: Vec<Recipe>,
    pub total_results: Option<usize>,
    pub exhausted: bool,
    #[serde(skip)]
    pub error: Option<GatewayError>,
}

impl SearchSession {
    #[must_use]
    pub fn new(query: impl Into<String>, filters: SearchFilters) -> Self {
        Self {
            query: query.into(),
            filters,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Loaded {
        /// Items upstream returned for this page.
        received: usize,
        exhausted: bool,
        /// Index in `results` of the first appended recipe.
        start: usize,
        appended: Vec<Recipe>,
    },
    /// No further pages upstream; nothing was requested.
    Exhausted,
    /// A page for this session is already loading; nothing was requested.
    InFlight,
    /// The session was reset while the page loaded; the page was dropped.
    Stale,
    Failed(GatewayError),
}

struct Inner {
    session: SearchSession,
    generation: u64,
    loading: Option<u64>,
}

/// Forward-only pagination over one active search session.
pub struct ResultPager {
    gateway: Arc<dyn RecipeGateway>,
    page_size: usize,
    inner: Mutex<Inner>,
}

impl ResultPager {
    pub fn new(gateway: Arc<dyn RecipeGateway>, page_size: usize) -> Self {
        Self {
            gateway,
            page_size: page_size.max(1),
            inner: Mutex::new(Inner {
                session: SearchSession::default(),
                generation: 0,
                loading: None,
            }),
        }
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub fn session(&self) -> SearchSession {
        self.lock().session.clone()
    }

    /// Start a new session. A page still loading for the old one is dropped on arrival.
    pub fn reset(&self, query: impl Into<String>, filters: SearchFilters) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.loading = None;
        inner.session = SearchSession::new(query, filters);
        tracing::debug!(query = %inner.session.query, "search session reset");
    }

    /// Fetch the first page of a new query and switch to it only if that succeeds.
    ///
    /// Until the page lands the current session stays readable; a page still
    /// loading for it is dropped. On failure the current session is kept as is.
    pub async fn start(&self, query: impl Into<String>, filters: SearchFilters) -> PageOutcome {
        let query = query.into();
        let generation = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.loading = Some(inner.generation);
            inner.generation
        };
        let result = self.fetch(generation, &query, &filters, 0).await;

        let mut inner = self.lock();
        if inner.generation != generation {
            return PageOutcome::Stale;
        }
        inner.loading = None;
        match result {
            Ok(page) => {
                tracing::debug!(query = %query, "search session started");
                inner.session = SearchSession::new(query, filters);
                self.append(&mut inner.session, page)
            }
            Err(e) => {
                tracing::warn!(query = %query, error = %e, "first page failed, keeping previous session");
                PageOutcome::Failed(e)
            }
        }
    }

    /// Fetch the page at the current offset and append it.
    ///
    /// Returns without a request when the session is exhausted or a page is
    /// already loading. A failure keeps existing results and records the error.
    pub async fn load_next_page(&self) -> PageOutcome {
        let (generation, query, filters, offset) = {
            let mut inner = self.lock();
            if inner.session.exhausted {
                return PageOutcome::Exhausted;
            }
            if inner.loading == Some(inner.generation) {
                return PageOutcome::InFlight;
            }
            inner.loading = Some(inner.generation);
            (
                inner.generation,
                inner.session.query.clone(),
                inner.session.filters.clone(),
                inner.session.offset,
            )
        };
        let result = self.fetch(generation, &query, &filters, offset).await;

        let mut inner = self.lock();
        if inner.generation != generation {
            return PageOutcome::Stale;
        }
        inner.loading = None;
        match result {
            Ok(page) => self.append(&mut inner.session, page),
            Err(e) => {
                tracing::warn!(query = %query, offset, error = %e, "page load failed");
                inner.session.error = Some(e.clone());
                PageOutcome::Failed(e)
            }
        }
    }

    /// One gateway call under the in-flight flag for `generation`.
    async fn fetch(
        &self,
        generation: u64,
        query: &str,
        filters: &SearchFilters,
        offset: usize,
    ) -> GatewayResult<SearchPage> {
        let mut guard = LoadGuard {
            pager: self,
            generation,
            armed: true,
        };
        tracing::debug!(query = %query, offset, limit = self.page_size, "loading page");
        let result = self
            .gateway
            .search_recipes(query, offset, self.page_size, filters)
            .await;
        guard.armed = false;
        result
    }

    fn append(&self, session: &mut SearchSession, page: SearchPage) -> PageOutcome {
        let start = session.results.len();
        session.results.extend_from_slice(&page.results);
        session.offset += page.fetched;
        session.total_results = Some(page.total_results);
        session.exhausted = page.fetched < self.page_size;
        session.error = None;
        PageOutcome::Loaded {
            received: page.fetched,
            exhausted: session.exhausted,
            start,
            appended: page.results,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the in-flight flag if a load is dropped before its response lands.
struct LoadGuard<'a> {
    pager: &'a ResultPager,
    generation: u64,
    armed: bool,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.pager.lock();
        if inner.loading == Some(self.generation) {
            inner.loading = None;
        }
    }
}
