//! HTTP module
//!
//! Adapts paginated HTTP list endpoints to the pagination engine.
//!
//! # Features
//!
//! - **Client**: `reqwest` with base URL, headers and query handling
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **List Fetcher**: a [`FetchStrategy`](crate::pagination::FetchStrategy)
//!   for cursor and offset endpoints described in YAML
//!
//! Failed requests are not retried.

mod client;
pub mod extract;
mod fetcher;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use fetcher::HttpListFetcher;
pub use rate_limit::{RateLimiter, RateLimiterConfig};
