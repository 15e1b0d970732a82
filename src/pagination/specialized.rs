//! Specialized engines
//!
//! A specialized engine is the base engine plus a [`PageObserver`] that
//! looks at every freshly fetched page and keeps derived aggregates.
//! Observers only ever see `&[T]`; cursor, `has_more` and the counters
//! stay entirely in the base engine's hands.

use super::engine::PaginationEngine;
use super::types::{PaginationConfig, PaginationState, Paginator};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

/// Read-only bookkeeping over fetched pages
pub trait PageObserver<T>: Send {
    /// Inspect a page right after it was fetched
    fn observe(&mut self, page: &[T]);

    /// Forget everything observed so far
    fn reset(&mut self);
}

/// Engine that feeds every fetched page to an observer
pub struct ObservedEngine<T, O> {
    inner: PaginationEngine<T>,
    observer: O,
}

impl<T, O> ObservedEngine<T, O>
where
    T: Clone + Send + Sync + 'static,
    O: PageObserver<T>,
{
    /// Create an observed engine from a config
    pub fn new(config: PaginationConfig<T>, observer: O) -> Self {
        Self::wrap(PaginationEngine::new(config), observer)
    }

    /// Attach an observer to an existing engine
    pub fn wrap(inner: PaginationEngine<T>, observer: O) -> Self {
        Self { inner, observer }
    }

    /// The observer and its aggregates
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// The underlying engine
    pub fn engine(&self) -> &PaginationEngine<T> {
        &self.inner
    }

    /// Split into engine and observer
    pub fn into_parts(self) -> (PaginationEngine<T>, O) {
        (self.inner, self.observer)
    }

    /// Fetch a page through the base engine and let the observer see it
    ///
    /// The no-op `next()` of a finished traversal is not shown to the
    /// observer.
    async fn fetch_observed(&mut self) -> Result<Vec<T>> {
        let fetched = self.inner.has_next();
        let page = self.inner.next().await?;
        if fetched {
            self.observer.observe(&page);
        }
        Ok(page)
    }
}

#[async_trait]
impl<T, O> Paginator<T> for ObservedEngine<T, O>
where
    T: Clone + Send + Sync + 'static,
    O: PageObserver<T>,
{
    fn has_next(&self) -> bool {
        self.inner.has_next()
    }

    async fn next(&mut self) -> Result<Vec<T>> {
        self.fetch_observed().await
    }

    async fn current_page(&mut self) -> Result<Vec<T>> {
        if let Some(page) = self.inner.last_page() {
            return Ok(page.to_vec());
        }
        self.fetch_observed().await
    }

    async fn all_items(&mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while self.has_next() {
            items.extend(self.fetch_observed().await?);
        }
        Ok(items)
    }

    async fn for_each_page<F, Fut>(&mut self, mut callback: F) -> Result<()>
    where
        F: FnMut(Vec<T>) -> Fut + Send,
        Fut: Future<Output = Result<()>> + Send,
    {
        while self.has_next() {
            let page = self.fetch_observed().await?;
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
            for item in self.fetch_observed().await? {
                callback(item).await?;
            }
        }
        Ok(())
    }

    fn pagination_state(&self) -> PaginationState {
        self.inner.pagination_state()
    }

    fn reset(&mut self) {
        self.inner.reset();
        self.observer.reset();
    }
}

impl<T, O: fmt::Debug> fmt::Debug for ObservedEngine<T, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservedEngine")
            .field("inner", &self.inner)
            .field("observer", &self.observer)
            .finish()
    }
}

// ============================================================================
// Partition Counter
// ============================================================================

/// Counts items per category as pages arrive
///
/// E.g. transactions split by status, or accounts by type:
///
/// ```rust,ignore
/// let counter = PartitionCounter::new(|tx: &Transaction| tx.status.clone());
/// let mut engine = ObservedEngine::new(config, counter);
/// engine.all_items().await?;
/// let pending = engine.observer().count(&"pending".to_string());
/// ```
pub struct PartitionCounter<T, K, F> {
    classify: F,
    counts: BTreeMap<K, u64>,
    pages_observed: u64,
    _item: std::marker::PhantomData<fn(&T)>,
}

impl<T, K, F> PartitionCounter<T, K, F>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    /// Create a counter with a classification function
    pub fn new(classify: F) -> Self {
        Self {
            classify,
            counts: BTreeMap::new(),
            pages_observed: 0,
            _item: std::marker::PhantomData,
        }
    }

    /// Items seen in `category`
    pub fn count(&self, category: &K) -> u64 {
        self.counts.get(category).copied().unwrap_or(0)
    }

    /// All per-category counts
    pub fn counts(&self) -> &BTreeMap<K, u64> {
        &self.counts
    }

    /// Pages observed so far
    pub fn pages_observed(&self) -> u64 {
        self.pages_observed
    }

    /// Items observed so far, across all categories
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

impl<T, K, F> PageObserver<T> for PartitionCounter<T, K, F>
where
    K: Ord + Send,
    F: Fn(&T) -> K + Send,
{
    fn observe(&mut self, page: &[T]) {
        self.pages_observed += 1;
        for item in page {
            *self.counts.entry((self.classify)(item)).or_insert(0) += 1;
        }
    }

    fn reset(&mut self) {
        self.counts.clear();
        self.pages_observed = 0;
    }
}

impl<T, K: fmt::Debug, F> fmt::Debug for PartitionCounter<T, K, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartitionCounter")
            .field("counts", &self.counts)
            .field("pages_observed", &self.pages_observed)
            .finish_non_exhaustive()
    }
}
