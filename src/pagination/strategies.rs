//! Fetch strategy implementations
//!
//! Each strategy adapts one remote pagination protocol to the engine's
//! request/response shape. The cursor a strategy hands back is opaque to
//! the engine; only the strategy that minted it may interpret it.

use super::types::FetchStrategy;
use crate::error::{Error, Result};
use crate::types::{ListOptions, ListResponse, ListResponseMeta};
use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

// ============================================================================
// Cursor Strategy
// ============================================================================

/// A page as returned by a cursor-based upstream (e.g., Stripe, Slack)
#[derive(Debug, Clone, PartialEq)]
pub struct CursorPage<T> {
    /// Items in server order
    pub items: Vec<T>,
    /// Upstream continuation token
    pub next_token: Option<String>,
    /// Upstream token for the previous page
    pub prev_token: Option<String>,
    /// Total matching items, when the upstream reports it
    pub total: Option<u64>,
}

impl<T> CursorPage<T> {
    /// Create a page with an optional continuation token
    pub fn new(items: Vec<T>, next_token: Option<String>) -> Self {
        Self {
            items,
            next_token,
            prev_token: None,
            total: None,
        }
    }

    /// Set the reported total
    #[must_use]
    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    /// Set the previous-page token
    #[must_use]
    pub fn with_prev_token(mut self, token: impl Into<String>) -> Self {
        self.prev_token = Some(token.into());
        self
    }
}

/// Cursor-based pagination
///
/// The engine's cursor goes upstream verbatim and the upstream's own
/// continuation token comes back verbatim as `next_cursor`. An empty
/// token counts as no token.
pub struct CursorStrategy<T, F> {
    upstream: F,
    _item: PhantomData<fn() -> T>,
}

impl<T, F, Fut> CursorStrategy<T, F>
where
    F: Fn(ListOptions) -> Fut + Send + Sync,
    Fut: Future<Output = Result<CursorPage<T>>> + Send + 'static,
{
    /// Create a cursor strategy over an upstream call
    pub fn new(upstream: F) -> Self {
        Self {
            upstream,
            _item: PhantomData,
        }
    }
}

#[async_trait]
impl<T, F, Fut> FetchStrategy<T> for CursorStrategy<T, F>
where
    T: Send + 'static,
    F: Fn(ListOptions) -> Fut + Send + Sync,
    Fut: Future<Output = Result<CursorPage<T>>> + Send + 'static,
{
    async fn fetch_page(&self, options: ListOptions) -> Result<ListResponse<T>> {
        let page = (self.upstream)(options).await?;

        let count = page.items.len() as u64;
        let meta = ListResponseMeta {
            total: page.total.unwrap_or(count),
            count,
            next_cursor: page.next_token.filter(|token| !token.is_empty()),
            prev_cursor: page.prev_token.filter(|token| !token.is_empty()),
        };

        Ok(ListResponse::new(page.items, meta))
    }
}

// ============================================================================
// Offset Strategy
// ============================================================================

/// Request handed to an offset-based upstream
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetRequest {
    /// Number of items to skip
    pub offset: u64,
    /// Page size hint
    pub limit: Option<u32>,
    /// The remaining request options (sort, filters)
    pub options: ListOptions,
}

/// A page as returned by an offset-based upstream
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetPage<T> {
    /// Items in server order
    pub items: Vec<T>,
    /// Total matching items
    pub total: u64,
}

impl<T> OffsetPage<T> {
    /// Create an offset page
    pub fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }
}

/// Offset-based pagination (e.g., SQL-style `?offset=100&limit=50`)
///
/// Keeps a private running offset. After every successful call the offset
/// moves forward by the number of items returned, and `next_cursor` is the
/// new offset in decimal while it is still below `total`. A request
/// without a cursor starts over from offset zero.
///
/// One instance serves one traversal at a time.
pub struct OffsetStrategy<T, F> {
    upstream: F,
    offset: AtomicU64,
    _item: PhantomData<fn() -> T>,
}

impl<T, F, Fut> OffsetStrategy<T, F>
where
    F: Fn(OffsetRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<OffsetPage<T>>> + Send + 'static,
{
    /// Create an offset strategy over an upstream call
    pub fn new(upstream: F) -> Self {
        Self {
            upstream,
            offset: AtomicU64::new(0),
            _item: PhantomData,
        }
    }

    /// Current private offset
    pub fn offset(&self) -> u64 {
        self.offset.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T, F, Fut> FetchStrategy<T> for OffsetStrategy<T, F>
where
    T: Send + 'static,
    F: Fn(OffsetRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<OffsetPage<T>>> + Send + 'static,
{
    async fn fetch_page(&self, options: ListOptions) -> Result<ListResponse<T>> {
        let offset = if options.cursor.is_some() {
            self.offset.load(Ordering::SeqCst)
        } else {
            0
        };

        let request = OffsetRequest {
            offset,
            limit: options.limit,
            options: options.with_cursor(None),
        };
        let page = (self.upstream)(request).await?;

        let count = page.items.len() as u64;
        let new_offset = offset + count;
        self.offset.store(new_offset, Ordering::SeqCst);

        let next_cursor = (count > 0 && new_offset < page.total).then(|| new_offset.to_string());
        let meta = ListResponseMeta {
            total: page.total,
            count,
            next_cursor,
            prev_cursor: None,
        };

        Ok(ListResponse::new(page.items, meta))
    }
}

// ============================================================================
// In-Memory Strategy
// ============================================================================

/// Pages over a fixed vector of items
///
/// The cursor is the decimal index of the first item of the page. Without
/// a `limit` the whole collection comes back as one page. Handy for demos
/// and for exercising callers without a remote endpoint.
#[derive(Debug)]
pub struct InMemoryStrategy<T> {
    items: Vec<T>,
    fetches: AtomicUsize,
}

impl<T: Clone + Send + Sync> InMemoryStrategy<T> {
    /// Create a strategy over `items`
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Number of fetches served so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> FetchStrategy<T> for InMemoryStrategy<T> {
    async fn fetch_page(&self, options: ListOptions) -> Result<ListResponse<T>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let start = match options.cursor.as_deref() {
            Some(cursor) => cursor.parse::<usize>().map_err(|_| {
                Error::fetch(format!("invalid in-memory cursor '{cursor}'"))
            })?,
            None => 0,
        };
        let total = self.items.len();
        let start = start.min(total);
        let end = match options.limit {
            Some(limit) => (start + limit as usize).min(total),
            None => total,
        };

        let page = self.items[start..end].to_vec();
        let mut meta = ListResponseMeta::new(total as u64, page.len() as u64);
        if end < total {
            meta.next_cursor = Some(end.to_string());
        }
        if start > 0 {
            let prev = start.saturating_sub(options.limit.map_or(start, |l| l as usize));
            meta.prev_cursor = Some(prev.to_string());
        }

        Ok(ListResponse::new(page, meta))
    }
}
