//! Debounced query dispatch.
//!
//! [`QueryDebouncer`] turns a stream of raw input values into at most one
//! request per quiet period. Each dispatched request carries a sequence
//! number; a response is applied only if no later request was dispatched
//! after it, so a slow early request can never overwrite a faster later one.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::GatewayError;
use crate::gateway::{GatewayResult, RecipeGateway};
use crate::models::AutocompleteSuggestion;
use crate::pager::{PageOutcome, ResultPager, SearchSession};

pub const DEFAULT_QUIET: Duration = Duration::from_millis(300);
pub const DEFAULT_AUTOCOMPLETE_LIMIT: usize = 5;
/// Autocomplete only fires once the input is longer than two characters.
pub const AUTOCOMPLETE_MIN_CHARS: usize = 3;

pub type FetchFuture<T> = Pin<Box<dyn Future<Output = GatewayResult<T>> + Send>>;
type FetchFn<T> = Arc<dyn Fn(String) -> FetchFuture<T> + Send + Sync>;

/// What a view renders from a debounced query.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySnapshot<T> {
    /// Input that produced `value` (or that was cleared for being too short).
    pub query: String,
    /// Last successful result. Kept when a later request fails.
    pub value: Option<T>,
    pub error: Option<GatewayError>,
    pub loading: bool,
    /// Sequence number of the request whose response was last applied.
    pub sequence: u64,
}

impl<T> Default for QuerySnapshot<T> {
    fn default() -> Self {
        Self {
            query: String::new(),
            value: None,
            error: None,
            loading: false,
            sequence: 0,
        }
    }
}

#[derive(Default)]
struct Counters {
    /// Bumped on every input; a timer only dispatches if it is still current.
    input: u64,
    /// Sequence number of the newest dispatch or invalidation.
    dispatched: u64,
}

struct Shared<T> {
    counters: Mutex<Counters>,
    state: watch::Sender<QuerySnapshot<T>>,
}

impl<T> Shared<T> {
    fn counters(&self) -> MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct QueryDebouncer<T> {
    quiet: Duration,
    min_chars: usize,
    fetch: FetchFn<T>,
    shared: Arc<Shared<T>>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T> QueryDebouncer<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut>(quiet: Duration, fetch: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = GatewayResult<T>> + Send + 'static,
    {
        let fetch: FetchFn<T> = Arc::new(move |query| Box::pin(fetch(query)));
        let (state, _) = watch::channel(QuerySnapshot::default());
        Self {
            quiet,
            min_chars: 1,
            fetch,
            shared: Arc::new(Shared {
                counters: Mutex::new(Counters::default()),
                state,
            }),
            pending: Mutex::new(None),
        }
    }

    /// Inputs with fewer trimmed characters than this clear the result instead of dispatching.
    #[must_use]
    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    #[must_use]
    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    /// Record a new input value. Must be called from within a tokio runtime.
    ///
    /// Any dispatch still waiting out its quiet period is cancelled; the new
    /// value is dispatched once `quiet` passes with no further input.
    pub fn on_input(&self, raw: impl Into<String>) {
        let value: String = raw.into();
        self.cancel_pending();
        let generation = {
            let mut counters = self.shared.counters();
            counters.input += 1;
            if value.trim().chars().count() < self.min_chars {
                // Anything still in flight now belongs to a stale input.
                counters.dispatched += 1;
                self.shared.state.send_modify(|s| {
                    s.query = value;
                    s.value = None;
                    s.error = None;
                    s.loading = false;
                });
                return;
            }
            counters.input
        };

        let shared = Arc::clone(&self.shared);
        let fetch = Arc::clone(&self.fetch);
        let quiet = self.quiet;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            let seq = {
                let mut counters = shared.counters();
                if counters.input != generation {
                    return;
                }
                counters.dispatched += 1;
                counters.dispatched
            };
            // Detach the request so cancelling a later timer never drops it mid-flight.
            tokio::spawn(dispatch(shared, fetch, value, seq));
        });

        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    /// Drop a dispatch that has not yet left its quiet period.
    pub fn cancel_pending(&self) {
        if let Some(handle) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> QuerySnapshot<T> {
        self.shared.state.borrow().clone()
    }

    /// Receiver notified after every applied change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<QuerySnapshot<T>> {
        self.shared.state.subscribe()
    }

    /// Number of requests dispatched so far.
    #[must_use]
    pub fn dispatched(&self) -> u64 {
        self.shared.counters().dispatched
    }
}

impl<T> Drop for QueryDebouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self
            .pending
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

async fn dispatch<T>(shared: Arc<Shared<T>>, fetch: FetchFn<T>, query: String, seq: u64)
where
    T: Clone + Send + Sync + 'static,
{
    {
        let counters = shared.counters();
        if counters.dispatched != seq {
            return;
        }
        shared.state.send_modify(|s| s.loading = true);
    }
    tracing::debug!(seq, query = %query, "dispatching debounced query");

    let result = fetch(query.clone()).await;

    // Held while applying so an invalidating input cannot land in between.
    let counters = shared.counters();
    if counters.dispatched != seq {
        tracing::debug!(seq, query = %query, "discarding stale response");
        return;
    }
    shared.state.send_modify(|s| {
        s.loading = false;
        s.sequence = seq;
        s.query = query;
        match result {
            Ok(value) => {
                s.value = Some(value);
                s.error = None;
            }
            Err(e) => {
                tracing::warn!(seq, error = %e, "debounced query failed");
                s.error = Some(e);
            }
        }
    });
}

/// Debounced search feeding `pager`: each dispatch starts a new session for
/// the query. A failed first page leaves the pager on the previous session.
pub fn search_debouncer(pager: Arc<ResultPager>, quiet: Duration) -> QueryDebouncer<SearchSession> {
    QueryDebouncer::new(quiet, move |query: String| {
        let pager = Arc::clone(&pager);
        async move {
            let filters = pager.session().filters;
            match pager.start(query, filters).await {
                PageOutcome::Failed(e) => Err(e),
                _ => Ok(pager.session()),
            }
        }
    })
}

pub fn autocomplete_debouncer(
    gateway: Arc<dyn RecipeGateway>,
    quiet: Duration,
    limit: usize,
) -> QueryDebouncer<Vec<AutocompleteSuggestion>> {
    QueryDebouncer::new(quiet, move |query: String| {
        let gateway = Arc::clone(&gateway);
        async move { gateway.autocomplete(query.trim(), limit).await }
    })
    .with_min_chars(AUTOCOMPLETE_MIN_CHARS)
}
