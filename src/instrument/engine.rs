//! Instrumented paginator decorator
//!
//! Wraps any [`Paginator`] so every public operation runs inside one
//! scope of an [`Instrumentation`] backend. The wrapped engine stays
//! unaware of it.

use super::types::{AttributeValue, Attributes, Instrumentation, Scope, ScopeStatus};
use crate::error::{Error, Result};
use crate::pagination::{PaginationState, Paginator};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Metric recorded once per successful fetch; the value is the page size
pub const PAGE_METRIC: &str = "paginator.page";

/// Prefix of every scope name
const SCOPE_PREFIX: &str = "paginator";

// ============================================================================
// Scope Guard
// ============================================================================

/// Ends its scope exactly once, on `finish` or on drop
struct ScopeGuard {
    scope: Option<Box<dyn Scope>>,
}

impl ScopeGuard {
    fn new(scope: Box<dyn Scope>) -> Self {
        Self { scope: Some(scope) }
    }

    /// Tag the scope with progress and the outcome, then end it
    fn finish(&mut self, state: &PaginationState, error: Option<&Error>) {
        let Some(mut scope) = self.scope.take() else {
            return;
        };

        scope.set_attribute("pagesFetched", state.pages_fetched.into());
        scope.set_attribute("itemsFetched", state.items_fetched.into());
        scope.set_attribute("hasMore", state.has_more.into());

        match error {
            Some(e) => {
                scope.record_exception(e);
                scope.set_status(ScopeStatus::Error(Some(e.to_string())));
            }
            None => scope.set_status(ScopeStatus::Ok),
        }

        scope.end();
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        // Reached only when the operation's future was dropped mid-flight
        if let Some(mut scope) = self.scope.take() {
            scope.set_status(ScopeStatus::Error(Some("operation abandoned".to_string())));
            scope.end();
        }
    }
}

// ============================================================================
// Instrumented Engine
// ============================================================================

/// A [`Paginator`] whose operations are traced and measured
///
/// Scopes are named `paginator.<operation>`. Each carries the configured
/// attributes plus `pagesFetched`, `itemsFetched` and `hasMore` as they
/// stood when the operation finished. `has_next` and `pagination_state`
/// do no work worth tracing and run unscoped.
pub struct InstrumentedEngine<P> {
    inner: P,
    instrumentation: Arc<dyn Instrumentation>,
    attributes: Attributes,
}

impl<P> InstrumentedEngine<P> {
    /// Create a new instrumented engine
    pub fn new(inner: P, instrumentation: Arc<dyn Instrumentation>) -> Self {
        Self {
            inner,
            instrumentation,
            attributes: Attributes::new(),
        }
    }

    /// Add an attribute attached to every scope and metric
    #[must_use]
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Add several attributes at once
    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Configured attributes
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// The wrapped engine
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Unwrap the engine
    pub fn into_inner(self) -> P {
        self.inner
    }

    fn open(&self, operation: &str) -> ScopeGuard {
        let mut scope = self
            .instrumentation
            .start_scope(&format!("{SCOPE_PREFIX}.{operation}"));
        for (key, value) in &self.attributes {
            scope.set_attribute(key, value.clone());
        }
        ScopeGuard::new(scope)
    }

    fn record_page(&self, page: u64, size: usize) {
        let mut tags = self.attributes.clone();
        tags.insert("page".to_string(), page.into());
        self.instrumentation.record_metric(PAGE_METRIC, size as f64, &tags);
    }

    /// Delegate one `next()`, recording the metric if it fetched
    async fn fetch_next<T>(&mut self) -> Result<Vec<T>>
    where
        T: Send + 'static,
        P: Paginator<T>,
    {
        let before = self.inner.pagination_state().pages_fetched;
        let page = self.inner.next().await?;
        self.after_delegate::<T>(before, page.len());
        Ok(page)
    }

    fn after_delegate<T>(&self, pages_before: u64, size: usize)
    where
        T: Send + 'static,
        P: Paginator<T>,
    {
        let pages = Paginator::<T>::pagination_state(&self.inner).pages_fetched;
        if pages > pages_before {
            self.record_page(pages, size);
        }
    }
}

#[async_trait]
impl<T, P> Paginator<T> for InstrumentedEngine<P>
where
    T: Send + 'static,
    P: Paginator<T>,
{
    fn has_next(&self) -> bool {
        self.inner.has_next()
    }

    async fn next(&mut self) -> Result<Vec<T>> {
        let mut guard = self.open("next");
        let result = self.fetch_next::<T>().await;
        guard.finish(&self.inner.pagination_state(), result.as_ref().err());
        result
    }

    async fn current_page(&mut self) -> Result<Vec<T>> {
        let mut guard = self.open("current_page");
        let before = self.inner.pagination_state().pages_fetched;
        let result = self.inner.current_page().await;
        if let Ok(page) = &result {
            self.after_delegate::<T>(before, page.len());
        }
        guard.finish(&self.inner.pagination_state(), result.as_ref().err());
        result
    }

    async fn all_items(&mut self) -> Result<Vec<T>> {
        let mut guard = self.open("all_items");
        let result = async {
            let mut items = Vec::new();
            while self.inner.has_next() {
                items.extend(self.fetch_next::<T>().await?);
            }
            Ok::<_, Error>(items)
        }
        .await;
        guard.finish(&self.inner.pagination_state(), result.as_ref().err());
        result
    }

    async fn for_each_page<F, Fut>(&mut self, mut callback: F) -> Result<()>
    where
        F: FnMut(Vec<T>) -> Fut + Send,
        Fut: Future<Output = Result<()>> + Send,
    {
        let mut guard = self.open("for_each_page");
        let result = async {
            while self.inner.has_next() {
                let page = self.fetch_next::<T>().await?;
                callback(page).await?;
            }
            Ok::<_, Error>(())
        }
        .await;
        guard.finish(&self.inner.pagination_state(), result.as_ref().err());
        result
    }

    async fn for_each_item<F, Fut>(&mut self, mut callback: F) -> Result<()>
    where
        F: FnMut(T) -> Fut + Send,
        Fut: Future<Output = Result<()>> + Send,
    {
        let mut guard = self.open("for_each_item");
        let result = async {
            while self.inner.has_next() {
                for item in self.fetch_next::<T>().await? {
                    callback(item).await?;
                }
            }
            Ok::<_, Error>(())
        }
        .await;
        guard.finish(&self.inner.pagination_state(), result.as_ref().err());
        result
    }

    fn pagination_state(&self) -> PaginationState {
        self.inner.pagination_state()
    }

    fn reset(&mut self) {
        let mut guard = self.open("reset");
        self.inner.reset();
        guard.finish(&self.inner.pagination_state(), None);
    }
}

impl<P: std::fmt::Debug> std::fmt::Debug for InstrumentedEngine<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstrumentedEngine")
            .field("inner", &self.inner)
            .field("attributes", &self.attributes)
            .finish_non_exhaustive()
    }
}
