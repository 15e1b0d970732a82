//! Pagination engine
//!
//! Drives one fetch strategy through a bounded, resumable traversal.
//!
//! ```text
//!   FRESH ──next()──▶ ITERATING ──next()──▶ EXHAUSTED      (no next cursor)
//!     │                   │        └──────▶ LIMIT_REACHED  (max_items / max_pages)
//!     └──────────── reset() ◀──────────────────┘
//! ```
//!
//! EXHAUSTED and LIMIT_REACHED only accept no-op `next()` calls.
//!
//! The cancel token is observed at fetch boundaries only: a token fired
//! from a callback stops the traversal before its next fetch.

use super::types::{FetchStrategy, Limits, PaginationConfig, PaginationState, Paginator, Phase};
use crate::error::{Error, Result};
use crate::types::{ListOptions, ListResponse};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Stateful traversal of a paginated remote collection
///
/// The engine owns its [`PaginationState`]; the strategy is shared.
pub struct PaginationEngine<T> {
    /// Strategy used for every fetch
    strategy: Arc<dyn FetchStrategy<T>>,
    /// Options every fetch starts from
    initial_options: ListOptions,
    /// Traversal bounds
    limits: Limits,
    /// External cancellation signal
    cancel_token: Option<CancellationToken>,
    /// Deadline for a single fetch
    fetch_timeout: Option<Duration>,
    /// Current progress
    state: PaginationState,
    /// Most recently fetched page
    current: Option<Vec<T>>,
}

impl<T> PaginationEngine<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an engine in the fresh state
    pub fn new(config: PaginationConfig<T>) -> Self {
        Self::resume(config, PaginationState::new())
    }

    /// Create an engine that continues from a saved state
    ///
    /// `reset()` still goes back to the fresh state.
    pub fn resume(config: PaginationConfig<T>, state: PaginationState) -> Self {
        let PaginationConfig {
            fetch_page,
            initial_options,
            limits,
            cancel_token,
            fetch_timeout,
        } = config;

        Self {
            strategy: fetch_page,
            initial_options,
            limits,
            cancel_token,
            fetch_timeout,
            state,
            current: None,
        }
    }

    /// Shortcut for an unbounded engine over `strategy`
    pub fn from_strategy(strategy: impl FetchStrategy<T> + 'static, options: ListOptions) -> Self {
        let mut config = PaginationConfig::new(strategy);
        config.initial_options = options;
        Self::new(config)
    }

    /// Traversal bounds
    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// The most recently fetched page, without fetching
    pub fn last_page(&self) -> Option<&[T]> {
        self.current.as_deref()
    }

    /// Where the traversal stands
    pub fn phase(&self) -> Phase {
        if !self.state.has_more {
            Phase::Exhausted
        } else if self.limits.reached(&self.state) {
            Phase::LimitReached
        } else if self.state.pages_fetched == 0 {
            Phase::Fresh
        } else {
            Phase::Iterating
        }
    }

    /// Options for the next fetch: the initial options with the live cursor
    fn fetch_options(&self) -> ListOptions {
        let cursor = self
            .state
            .cursor
            .clone()
            .or_else(|| self.initial_cursor());
        self.initial_options.with_cursor(cursor)
    }

    /// The caller's starting cursor applies only before the first page
    fn initial_cursor(&self) -> Option<String> {
        if self.state.pages_fetched == 0 {
            self.initial_options.cursor.clone()
        } else {
            None
        }
    }

    /// Run one fetch, honouring cancellation and the fetch deadline
    async fn fetch(&self, options: ListOptions) -> Result<ListResponse<T>> {
        let fetch = self.strategy.fetch_page(options);

        let bounded = async {
            match self.fetch_timeout {
                Some(timeout) => match tokio::time::timeout(timeout, fetch).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::Timeout {
                        timeout_ms: timeout.as_millis() as u64,
                    }),
                },
                None => fetch.await,
            }
        };

        match &self.cancel_token {
            Some(token) => {
                if token.is_cancelled() {
                    return Err(Error::Cancelled);
                }
                tokio::select! {
                    biased;
                    () = token.cancelled() => Err(Error::Cancelled),
                    result = bounded => result,
                }
            }
            None => bounded.await,
        }
    }
}

#[async_trait]
impl<T> Paginator<T> for PaginationEngine<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn has_next(&self) -> bool {
        self.state.has_more && !self.limits.reached(&self.state)
    }

    async fn next(&mut self) -> Result<Vec<T>> {
        if !self.has_next() {
            trace!(phase = ?self.phase(), "next() on a finished traversal");
            return Ok(Vec::new());
        }

        let options = self.fetch_options();
        let ListResponse { items, meta } = self.fetch(options).await?;

        // Single assignment: either every field moves or none does.
        self.state = self.state.advanced(meta.next_cursor, items.len());
        self.current = Some(items.clone());

        debug!(
            page = self.state.pages_fetched,
            items = items.len(),
            items_fetched = self.state.items_fetched,
            has_more = self.state.has_more,
            "Fetched page"
        );

        Ok(items)
    }

    async fn current_page(&mut self) -> Result<Vec<T>> {
        match &self.current {
            Some(page) => Ok(page.clone()),
            None => self.next().await,
        }
    }

    async fn all_items(&mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while self.has_next() {
            items.extend(self.next().await?);
        }
        Ok(items)
    }

    async fn for_each_page<F, Fut>(&mut self, mut callback: F) -> Result<()>
    where
        F: FnMut(Vec<T>) -> Fut + Send,
        Fut: Future<Output = Result<()>> + Send,
    {
        while self.has_next() {
            let page = self.next().await?;
            callback(page).await?;
        }
        Ok(())
    }

    async fn for_each_item<F, Fut>(&mut self, mut callback: F) -> Result<()>
    where
        F: FnMut(T) -> Fut + Send,
        Fut: Future<Output = Result<()>> + Send,
    {
        while self.has_next() {
            for item in self.next().await? {
                callback(item).await?;
            }
        }
        Ok(())
    }

    fn pagination_state(&self) -> PaginationState {
        self.state.clone()
    }

    fn reset(&mut self) {
        self.state = PaginationState::new();
        self.current = None;
    }
}

impl<T> std::fmt::Debug for PaginationEngine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginationEngine")
            .field("initial_options", &self.initial_options)
            .field("limits", &self.limits)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
