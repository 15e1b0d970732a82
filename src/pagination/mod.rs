//! Pagination module
//!
//! Supports: Cursor, Offset, In-memory, and any closure-based strategy
//!
//! # Overview
//!
//! The pagination module provides one engine for every paginated list
//! endpoint. A [`FetchStrategy`] knows how to fetch a single page of a
//! specific remote protocol; the [`PaginationEngine`] owns the traversal
//! state, decides when to stop, and exposes pull (`has_next`/`next`) and
//! push (`for_each_page`/`for_each_item`) traversal through the
//! [`Paginator`] trait.
//!
//! Termination is driven only by the absence of `next_cursor` in a page's
//! metadata, or by the caller's `max_items`/`max_pages` bounds. A bound
//! never truncates a page: the page that crosses it is returned whole.

mod engine;
mod specialized;
mod strategies;
pub mod stream;
mod types;

pub use engine::PaginationEngine;
pub use specialized::{ObservedEngine, PageObserver, PartitionCounter};
pub use strategies::{
    CursorPage, CursorStrategy, InMemoryStrategy, OffsetPage, OffsetRequest, OffsetStrategy,
};
pub use stream::{fetch_all_items, fetch_all_pages, PageStream};
pub use types::{
    from_fn, FetchStrategy, FnStrategy, Limits, PaginationConfig, PaginationConfigBuilder,
    PaginationState, Paginator, Phase,
};

#[cfg(test)]
mod tests;
