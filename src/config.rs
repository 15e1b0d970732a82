//! Configuration types for endpoint definitions
//!
//! An endpoint definition describes one paginated list endpoint in YAML:
//! where it lives, how list options map onto its query string, how its
//! response body is laid out and how it paginates.

use crate::http::RateLimiterConfig;
use crate::pagination::Limits;
use crate::types::{FilterMap, FilterValue, ListOptions, SortDirection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

// ============================================================================
// Top-Level Endpoint Config
// ============================================================================

/// Complete endpoint configuration loaded from YAML
///
/// ```yaml
/// name: customers
/// base_url: "https://api.example.com"
/// path: "/v1/customers"
/// pagination:
///   type: cursor
///   cursor_param: "starting_after"
///   next_cursor_path: "meta.next_cursor"
/// response:
///   items_path: "data"
///   total_path: "meta.total"
/// limit: 100
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Kind of config (always "endpoint")
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Config version
    #[serde(default = "default_version")]
    pub version: String,

    /// Endpoint name (e.g., "customers")
    pub name: String,

    /// Description of the endpoint
    #[serde(default)]
    pub description: Option<String>,

    /// Base URL for API requests
    pub base_url: String,

    /// Path of the list endpoint, relative to `base_url`
    pub path: String,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Fixed query parameters sent with every request
    #[serde(default)]
    pub query: BTreeMap<String, String>,

    /// Names of the query parameters list options map onto
    #[serde(default)]
    pub request: RequestParams,

    /// Pagination style
    pub pagination: PaginationDef,

    /// Response body layout
    pub response: ResponseDef,

    /// Page size hint sent with every request
    #[serde(default)]
    pub limit: Option<u32>,

    /// Stop after this many items
    #[serde(default)]
    pub max_items: Option<u64>,

    /// Stop after this many pages
    #[serde(default)]
    pub max_pages: Option<u64>,

    /// Default sort
    #[serde(default)]
    pub sort: Option<SortDef>,

    /// Default filters
    #[serde(default)]
    pub filters: FilterMap,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpDef,
}

fn default_kind() -> String {
    "endpoint".to_string()
}

fn default_version() -> String {
    "1.0".to_string()
}

impl EndpointConfig {
    /// Options the first request starts from
    pub fn list_options(&self) -> ListOptions {
        let mut options = ListOptions::new();
        options.limit = self.limit;
        if let Some(sort) = &self.sort {
            options = options.sort(sort.field.clone(), sort.direction);
        }
        options.filters = self.filters.clone();
        options
    }

    /// Traversal bounds from `max_items` and `max_pages`
    pub fn limits(&self) -> Limits {
        Limits {
            max_items: self.max_items,
            max_pages: self.max_pages,
        }
    }

    /// Whether the endpoint paginates by offset
    pub fn is_offset(&self) -> bool {
        matches!(self.pagination, PaginationDef::Offset { .. })
    }
}

// ============================================================================
// Request Parameters
// ============================================================================

/// Query parameter names for list options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestParams {
    /// Page size parameter
    #[serde(default = "default_limit_param")]
    pub limit_param: String,

    /// Sort field parameter
    #[serde(default = "default_sort_param")]
    pub sort_param: String,

    /// Sort direction parameter
    #[serde(default = "default_direction_param")]
    pub direction_param: String,

    /// Template for filter parameter names; `{key}` is replaced by the
    /// filter name (e.g., `filter[{key}]`)
    #[serde(default = "default_filter_template")]
    pub filter_template: String,
}

impl Default for RequestParams {
    fn default() -> Self {
        Self {
            limit_param: default_limit_param(),
            sort_param: default_sort_param(),
            direction_param: default_direction_param(),
            filter_template: default_filter_template(),
        }
    }
}

impl RequestParams {
    /// Query parameter name for filter `key`
    pub fn filter_param(&self, key: &str) -> String {
        self.filter_template.replace("{key}", key)
    }
}

fn default_limit_param() -> String {
    "limit".to_string()
}

fn default_sort_param() -> String {
    "sort_by".to_string()
}

fn default_direction_param() -> String {
    "sort_direction".to_string()
}

fn default_filter_template() -> String {
    "{key}".to_string()
}

// ============================================================================
// Pagination Config
// ============================================================================

/// Pagination configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaginationDef {
    /// The server returns an opaque continuation token
    Cursor {
        /// Query parameter carrying the cursor
        #[serde(default = "default_cursor_param")]
        cursor_param: String,
        /// Path of the next cursor in the response body
        next_cursor_path: String,
        /// Path of the previous cursor in the response body
        #[serde(default)]
        prev_cursor_path: Option<String>,
    },

    /// The client walks the collection by offset against a total
    Offset {
        /// Query parameter carrying the offset
        #[serde(default = "default_offset_param")]
        offset_param: String,
    },
}

fn default_cursor_param() -> String {
    "cursor".to_string()
}

fn default_offset_param() -> String {
    "offset".to_string()
}

// ============================================================================
// Response Layout
// ============================================================================

/// Where things live in the response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDef {
    /// Path of the item array (e.g., "data", "$.results[*]")
    pub items_path: String,

    /// Path of the collection total; required for offset pagination
    #[serde(default)]
    pub total_path: Option<String>,
}

// ============================================================================
// Sort / HTTP
// ============================================================================

/// Default sort order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDef {
    /// Field to sort by
    pub field: String,

    /// Direction
    #[serde(default)]
    pub direction: SortDirection,
}

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpDef {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Deadline for one page fetch, including rate limit waits
    #[serde(default)]
    pub fetch_timeout_seconds: Option<u64>,

    /// Token bucket rate limit
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HttpDef {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            fetch_timeout_seconds: None,
            rate_limit: None,
            user_agent: None,
        }
    }
}

impl HttpDef {
    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Per-fetch deadline, if configured
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_seconds.map(Duration::from_secs)
    }
}

fn default_timeout_seconds() -> u64 {
    30
}

/// Parse a `key=value` filter argument
pub fn parse_filter(raw: &str) -> Option<(String, FilterValue)> {
    let (key, value) = raw.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), FilterValue::parse(value.trim())))
}
