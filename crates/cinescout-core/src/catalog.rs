// Catalog: where movie lists come from, and the search box plumbing on top
use crate::{models::Movie, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Trait for movie data sources - makes testing easier and keeps things flexible
///
/// TMDB is the only real one today, but nothing above this trait knows that.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn trending(&self) -> Result<Vec<Movie>>;
    async fn popular(&self) -> Result<Vec<Movie>>;
    async fn search(&self, query: &str) -> Result<Vec<Movie>>;
}

/// Both home screen rails, fetched together
#[derive(Debug, Clone, Default)]
pub struct HomeFeed {
    pub trending: Vec<Movie>,
    pub popular: Vec<Movie>,
}

/// Front-end facing wrapper around a provider
///
/// Callers treat "the request failed" and "there's nothing" the same way,
/// so every method here returns a plain list. Failures are logged.
pub struct Catalog {
    provider: Arc<dyn CatalogProvider>,
}

impl Catalog {
    pub fn new(provider: Arc<dyn CatalogProvider>) -> Self {
        Self { provider }
    }

    pub async fn trending(&self) -> Vec<Movie> {
        or_empty("trending", self.provider.trending().await)
    }

    pub async fn popular(&self) -> Vec<Movie> {
        or_empty("popular", self.provider.popular().await)
    }

    /// Search; a blank query never reaches the provider
    pub async fn search(&self, query: &str) -> Vec<Movie> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        debug!("Searching for {:?}", query);
        or_empty("search", self.provider.search(query).await)
    }

    /// Trending and popular in parallel
    pub async fn home_feed(&self) -> HomeFeed {
        let (trending, popular) = futures::join!(self.trending(), self.popular());
        HomeFeed { trending, popular }
    }
}

fn or_empty(what: &str, result: Result<Vec<Movie>>) -> Vec<Movie> {
    match result {
        Ok(movies) => {
            debug!("Loaded {} {} titles", movies.len(), what);
            movies
        }
        Err(e) => {
            warn!("Failed to load {} titles: {}", what, e);
            Vec::new()
        }
    }
}

/// What the search box should show right now
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<Movie>,
    pub is_searching: bool,
}

/// Debounced search-as-you-type
///
/// Every `submit` supersedes whatever came before it. A query only runs
/// once it has gone unchanged for the debounce window, and results from a
/// query that has since been superseded are thrown away.
pub struct SearchDebouncer {
    catalog: Arc<Catalog>,
    delay: Duration,
    generation: Arc<AtomicU64>,
    state: Arc<watch::Sender<SearchState>>,
}

impl SearchDebouncer {
    pub fn new(catalog: Arc<Catalog>, delay: Duration) -> Self {
        let (state, _) = watch::channel(SearchState::default());

        Self {
            catalog,
            delay,
            generation: Arc::new(AtomicU64::new(0)),
            state: Arc::new(state),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Feed the latest search box contents. Must be called inside a tokio runtime.
    ///
    /// The generation is only read or bumped while holding the watch lock, so
    /// a search that has been superseded can never publish over a newer state.
    pub fn submit(&self, query: impl Into<String>) {
        let query = query.into();
        let blank = query.trim().is_empty();
        let mut ticket = 0;

        self.state.send_if_modified(|s| {
            ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            if blank {
                *s = SearchState::default();
            }
            blank
        });

        if blank {
            return;
        }

        let catalog = Arc::clone(&self.catalog);
        let generation = Arc::clone(&self.generation);
        let state = Arc::clone(&self.state);
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let started = state.send_if_modified(|s| {
                if generation.load(Ordering::SeqCst) != ticket {
                    return false;
                }
                s.query = query.clone();
                s.is_searching = true;
                true
            });
            if !started {
                return;
            }

            let results = catalog.search(&query).await;

            let published = state.send_if_modified(|s| {
                if generation.load(Ordering::SeqCst) != ticket {
                    return false;
                }
                *s = SearchState {
                    query: query.clone(),
                    results,
                    is_searching: false,
                };
                true
            });
            if !published {
                debug!("Dropping stale results for {:?}", query);
            }
        });
    }
}
