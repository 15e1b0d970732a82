//! Pagination types and traits
//!
//! Defines the core pagination abstractions shared by the engine, its
//! decorators and every fetch strategy.

use crate::error::{Error, Result};
use crate::types::{ListOptions, ListResponse};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Fetch Strategy
// ============================================================================

/// Fetches one page of a remote collection
///
/// Cursor-based and offset-based protocols both fit behind this one
/// signature. Whatever error a strategy returns is passed to the caller
/// unchanged. A strategy may keep private bookkeeping (an offset, say)
/// but has no access to the engine's state.
#[async_trait]
pub trait FetchStrategy<T>: Send + Sync {
    /// Fetch the page described by `options`
    async fn fetch_page(&self, options: ListOptions) -> Result<ListResponse<T>>;
}

#[async_trait]
impl<T, S> FetchStrategy<T> for Arc<S>
where
    T: Send + 'static,
    S: FetchStrategy<T> + ?Sized,
{
    async fn fetch_page(&self, options: ListOptions) -> Result<ListResponse<T>> {
        (**self).fetch_page(options).await
    }
}

/// Strategy backed by an async closure
pub struct FnStrategy<F, T> {
    f: F,
    _item: PhantomData<fn() -> T>,
}

/// Wrap an async closure as a [`FetchStrategy`]
///
/// ```rust,ignore
/// let strategy = from_fn(|options: ListOptions| async move {
///     Ok(ListResponse::last(vec![1, 2, 3], 3))
/// });
/// ```
pub fn from_fn<T, F, Fut>(f: F) -> FnStrategy<F, T>
where
    F: Fn(ListOptions) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ListResponse<T>>> + Send + 'static,
{
    FnStrategy {
        f,
        _item: PhantomData,
    }
}

#[async_trait]
impl<T, F, Fut> FetchStrategy<T> for FnStrategy<F, T>
where
    T: Send + 'static,
    F: Fn(ListOptions) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ListResponse<T>>> + Send + 'static,
{
    async fn fetch_page(&self, options: ListOptions) -> Result<ListResponse<T>> {
        (self.f)(options).await
    }
}

impl<F, T> fmt::Debug for FnStrategy<F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStrategy").finish_non_exhaustive()
    }
}

// ============================================================================
// Pagination State
// ============================================================================

/// Progress of a traversal
///
/// Only a successful fetch changes it, and always all fields at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    /// Cursor to send with the next fetch
    #[serde(default)]
    pub cursor: Option<String>,
    /// Whether the last fetched page announced a successor
    pub has_more: bool,
    /// Pages fetched so far
    pub pages_fetched: u64,
    /// Items fetched so far
    pub items_fetched: u64,
    /// When the last successful fetch completed
    #[serde(default)]
    pub last_fetch_at: Option<DateTime<Utc>>,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            cursor: None,
            has_more: true,
            pages_fetched: 0,
            items_fetched: 0,
            last_fetch_at: None,
        }
    }
}

impl PaginationState {
    /// Create a fresh state
    pub fn new() -> Self {
        Self::default()
    }

    /// State that follows this one after a page with `item_count` items
    /// and the given `next_cursor`
    #[must_use]
    pub fn advanced(&self, next_cursor: Option<String>, item_count: usize) -> Self {
        Self {
            has_more: next_cursor.is_some(),
            cursor: next_cursor,
            pages_fetched: self.pages_fetched + 1,
            items_fetched: self.items_fetched + item_count as u64,
            last_fetch_at: Some(Utc::now()),
        }
    }

    /// Whether nothing has been fetched yet
    pub fn is_fresh(&self) -> bool {
        self.pages_fetched == 0 && self.has_more
    }
}

/// Where a traversal stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing fetched yet
    Fresh,
    /// At least one page fetched, more available
    Iterating,
    /// The remote collection has no more pages
    Exhausted,
    /// A configured bound stopped the traversal
    LimitReached,
}

impl Phase {
    /// Whether `next()` may still fetch
    pub fn accepts_fetch(&self) -> bool {
        matches!(self, Self::Fresh | Self::Iterating)
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Caller-configured ceilings on a traversal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limits {
    /// Stop once this many items have been fetched
    pub max_items: Option<u64>,
    /// Stop once this many pages have been fetched
    pub max_pages: Option<u64>,
}

impl Limits {
    /// No bounds
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Whether `state` has hit either bound
    pub fn reached(&self, state: &PaginationState) -> bool {
        self.max_items.is_some_and(|max| state.items_fetched >= max)
            || self.max_pages.is_some_and(|max| state.pages_fetched >= max)
    }
}

/// Configuration for a pagination engine
///
/// Immutable once built.
pub struct PaginationConfig<T> {
    /// Strategy used for every fetch
    pub fetch_page: Arc<dyn FetchStrategy<T>>,
    /// Options every fetch starts from
    pub initial_options: ListOptions,
    /// Traversal bounds
    pub limits: Limits,
    /// Cancels in-flight and future fetches when triggered
    pub cancel_token: Option<CancellationToken>,
    /// Deadline for a single fetch
    pub fetch_timeout: Option<Duration>,
}

impl<T> Clone for PaginationConfig<T> {
    fn clone(&self) -> Self {
        Self {
            fetch_page: Arc::clone(&self.fetch_page),
            initial_options: self.initial_options.clone(),
            limits: self.limits,
            cancel_token: self.cancel_token.clone(),
            fetch_timeout: self.fetch_timeout,
        }
    }
}

impl<T> fmt::Debug for PaginationConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginationConfig")
            .field("initial_options", &self.initial_options)
            .field("limits", &self.limits)
            .field("has_cancel_token", &self.cancel_token.is_some())
            .field("fetch_timeout", &self.fetch_timeout)
            .finish_non_exhaustive()
    }
}

impl<T: 'static> PaginationConfig<T> {
    /// Create a new config builder
    pub fn builder() -> PaginationConfigBuilder<T> {
        PaginationConfigBuilder::default()
    }

    /// Unbounded config for a strategy with default options
    pub fn new(strategy: impl FetchStrategy<T> + 'static) -> Self {
        Self {
            fetch_page: Arc::new(strategy),
            initial_options: ListOptions::default(),
            limits: Limits::unbounded(),
            cancel_token: None,
            fetch_timeout: None,
        }
    }
}

/// Builder for [`PaginationConfig`]
pub struct PaginationConfigBuilder<T> {
    fetch_page: Option<Arc<dyn FetchStrategy<T>>>,
    initial_options: ListOptions,
    limits: Limits,
    cancel_token: Option<CancellationToken>,
    fetch_timeout: Option<Duration>,
}

impl<T> Default for PaginationConfigBuilder<T> {
    fn default() -> Self {
        Self {
            fetch_page: None,
            initial_options: ListOptions::default(),
            limits: Limits::unbounded(),
            cancel_token: None,
            fetch_timeout: None,
        }
    }
}

impl<T: 'static> PaginationConfigBuilder<T> {
    /// Set the fetch strategy
    #[must_use]
    pub fn fetch_page(mut self, strategy: impl FetchStrategy<T> + 'static) -> Self {
        self.fetch_page = Some(Arc::new(strategy));
        self
    }

    /// Set a shared fetch strategy
    #[must_use]
    pub fn shared_fetch_page(mut self, strategy: Arc<dyn FetchStrategy<T>>) -> Self {
        self.fetch_page = Some(strategy);
        self
    }

    /// Set the initial options
    #[must_use]
    pub fn initial_options(mut self, options: ListOptions) -> Self {
        self.initial_options = options;
        self
    }

    /// Set the maximum number of items
    #[must_use]
    pub fn max_items(mut self, max: u64) -> Self {
        self.limits.max_items = Some(max);
        self
    }

    /// Set the maximum number of pages
    #[must_use]
    pub fn max_pages(mut self, max: u64) -> Self {
        self.limits.max_pages = Some(max);
        self
    }

    /// Set both bounds at once
    #[must_use]
    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Attach a cancellation token
    #[must_use]
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    /// Set a per-fetch deadline
    #[must_use]
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Build the config
    pub fn build(self) -> Result<PaginationConfig<T>> {
        let fetch_page = self
            .fetch_page
            .ok_or_else(|| Error::missing_field("fetch_page"))?;

        if self.initial_options.limit == Some(0) {
            return Err(Error::invalid_value("limit", "page size must be positive"));
        }

        Ok(PaginationConfig {
            fetch_page,
            initial_options: self.initial_options,
            limits: self.limits,
            cancel_token: self.cancel_token,
            fetch_timeout: self.fetch_timeout,
        })
    }
}

// ============================================================================
// Paginator
// ============================================================================

/// Public interface of every pagination engine
///
/// Items are always delivered in page order, then in server order within
/// a page. At most one fetch is in flight at a time; `&mut self` keeps a
/// single owner driving the traversal.
#[async_trait]
pub trait Paginator<T: Send + 'static>: Send {
    /// Whether another fetch is allowed. No I/O.
    fn has_next(&self) -> bool;

    /// Fetch the next page, or return an empty page without I/O once
    /// `has_next()` is false
    async fn next(&mut self) -> Result<Vec<T>>;

    /// The most recently fetched page, fetching the first one if needed
    async fn current_page(&mut self) -> Result<Vec<T>>;

    /// Drain every remaining page into one vector
    async fn all_items(&mut self) -> Result<Vec<T>>;

    /// Call `callback` once per page, awaiting it before the next fetch
    async fn for_each_page<F, Fut>(&mut self, callback: F) -> Result<()>
    where
        F: FnMut(Vec<T>) -> Fut + Send,
        Fut: Future<Output = Result<()>> + Send;

    /// Call `callback` once per item, sequentially
    async fn for_each_item<F, Fut>(&mut self, callback: F) -> Result<()>
    where
        F: FnMut(T) -> Fut + Send,
        Fut: Future<Output = Result<()>> + Send;

    /// Snapshot of the traversal state
    fn pagination_state(&self) -> PaginationState;

    /// Return to the fresh state
    fn reset(&mut self);
}
