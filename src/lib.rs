// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Solidafy Pager
//!
//! One bounded, resumable pagination engine for every paginated list
//! endpoint. Protocol details live in a fetch strategy; the engine owns
//! traversal state and decides when to stop.
//!
//! ## Features
//!
//! - **Pull and push traversal**: `has_next`/`next`, `for_each_page`, `for_each_item`
//! - **Cursor and offset strategies**: plus any async closure
//! - **Bounds**: `max_items` / `max_pages`, never truncating a page
//! - **Atomic progress**: a failed fetch leaves the state untouched
//! - **Cancellation**: a token and a per-fetch deadline
//! - **Lazy streams**: pages fetched only when polled
//! - **Instrumentation**: scopes and page metrics as a decorator
//! - **HTTP endpoints**: described in YAML, rate limited
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use solidafy_pager::pagination::{InMemoryStrategy, PaginationEngine, Paginator};
//! use solidafy_pager::{ListOptions, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let strategy = InMemoryStrategy::new((1..=10).collect::<Vec<u32>>());
//!     let mut engine = PaginationEngine::from_strategy(strategy, ListOptions::new().limit(3));
//!
//!     while engine.has_next() {
//!         let page = engine.next().await?;
//!         println!("{page:?}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Paginator trait                          │
//! │  has_next  next  current_page  all_items  for_each_page/item    │
//! │  pagination_state  reset                                        │
//! └─────────────────────────────────────────────────────────────────┘
//!          │                    │                      │
//! ┌────────┴───────┐  ┌─────────┴────────┐  ┌──────────┴─────────┐
//! │ Instrumented   │  │ ObservedEngine   │  │ PageStream         │
//! │ (decorator)    │  │ (PageObserver)   │  │ (lazy, pull-based) │
//! └────────┬───────┘  └─────────┬────────┘  └──────────┬─────────┘
//!          └──────────── PaginationEngine ─────────────┘
//!                               │
//!                         FetchStrategy
//! ┌───────────┬──────────────┬──────────────┬────────────────────┐
//! │ Cursor    │ Offset       │ In-memory    │ HTTP list endpoint │
//! └───────────┴──────────────┴──────────────┴────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common request/response types
pub mod types;

/// Pagination engine, strategies and streams
pub mod pagination;

/// Tracing and metrics around pagination
pub mod instrument;

/// HTTP client and list endpoint strategy
pub mod http;

/// Endpoint definitions
pub mod config;

/// YAML loader for endpoint definitions
pub mod loader;

/// Saved traversal state
pub mod state;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::EndpointConfig;
pub use instrument::InstrumentedEngine;
pub use loader::{load_endpoint, load_endpoint_from_str};
pub use pagination::{
    FetchStrategy, PageStream, PaginationConfig, PaginationEngine, PaginationState, Paginator,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
