//! Lazy page stream and eager drain helpers
//!
//! [`PageStream`] turns any [`Paginator`] into a `futures::Stream` of
//! pages. A page is fetched only when the stream is polled for it;
//! dropping the stream early leaves nothing behind but the pages already
//! fetched. A stream cannot be rewound; build a new one to start over.

use super::engine::PaginationEngine;
use super::types::{FetchStrategy, Paginator};
use crate::error::{Error, Result};
use crate::types::ListOptions;
use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Pull-based stream of pages
///
/// Ends after the last page, or right after yielding the first error.
pub struct PageStream<T> {
    inner: BoxStream<'static, Result<Vec<T>>>,
}

impl<T: Send + 'static> PageStream<T> {
    /// Stream the pages of `paginator`
    pub fn new<P>(paginator: P) -> Self
    where
        P: Paginator<T> + 'static,
    {
        let inner = stream::unfold(Some(paginator), |slot| async move {
            let Some(mut paginator) = slot else {
                return None;
            };
            if !paginator.has_next() {
                return None;
            }
            match paginator.next().await {
                Ok(page) => Some((Ok(page), Some(paginator))),
                Err(e) => Some((Err(e), None)),
            }
        });

        Self {
            inner: inner.boxed(),
        }
    }

    /// Flatten into a stream of individual items, in order
    pub fn into_items(self) -> BoxStream<'static, Result<T>> {
        self.inner
            .map_ok(|page| stream::iter(page.into_iter().map(Ok::<T, Error>)))
            .try_flatten()
            .boxed()
    }
}

impl<T: Clone + Send + Sync + 'static> PageStream<T> {
    /// Stream pages straight from a strategy, with no bounds
    pub fn from_strategy(strategy: impl FetchStrategy<T> + 'static, options: ListOptions) -> Self {
        Self::new(PaginationEngine::from_strategy(strategy, options))
    }
}

impl<T> Stream for PageStream<T> {
    type Item = Result<Vec<T>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl<T> std::fmt::Debug for PageStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageStream").finish_non_exhaustive()
    }
}

/// Fetch every page of a collection
pub async fn fetch_all_pages<T>(
    strategy: impl FetchStrategy<T> + 'static,
    options: ListOptions,
) -> Result<Vec<Vec<T>>>
where
    T: Clone + Send + Sync + 'static,
{
    PageStream::from_strategy(strategy, options)
        .try_collect()
        .await
}

/// Fetch every item of a collection, in page order
pub async fn fetch_all_items<T>(
    strategy: impl FetchStrategy<T> + 'static,
    options: ListOptions,
) -> Result<Vec<T>>
where
    T: Clone + Send + Sync + 'static,
{
    PageStream::from_strategy(strategy, options)
        .try_concat()
        .await
}
