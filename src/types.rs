//! Common types used throughout Solidafy Pager
//!
//! This module contains the request/response shapes shared by every
//! list endpoint: the options sent with a page request and the page
//! that comes back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// Typed filter bag attached to a list request
pub type FilterMap = BTreeMap<String, FilterValue>;

// ============================================================================
// Sorting
// ============================================================================

/// Sort direction for list requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order
    #[default]
    Asc,
    /// Descending order
    Desc,
}

impl SortDirection {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(crate::Error::invalid_value(
                "sort_direction",
                format!("expected 'asc' or 'desc', got '{other}'"),
            )),
        }
    }
}

// ============================================================================
// Filters
// ============================================================================

/// A primitive filter value
///
/// Validation of filter keys and values belongs to whoever owns the
/// endpoint; the engine only carries them through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Boolean filter
    Bool(bool),
    /// Integer filter
    Integer(i64),
    /// Floating point filter
    Float(f64),
    /// String filter
    String(String),
}

impl FilterValue {
    /// Parse a filter from its textual form (as given on a command line)
    ///
    /// `true`/`false` become booleans, integers and floats are recognised,
    /// everything else stays a string.
    pub fn parse(raw: &str) -> Self {
        if let Ok(b) = raw.parse::<bool>() {
            return Self::Bool(b);
        }
        if let Ok(i) = raw.parse::<i64>() {
            return Self::Integer(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return Self::Float(f);
        }
        Self::String(raw.to_string())
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

// ============================================================================
// List Options
// ============================================================================

/// Options sent with a single page request
///
/// The engine keeps the caller's options untouched and derives a fresh
/// copy for every fetch with the live cursor laid over it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListOptions {
    /// Page size hint passed to the strategy on every call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Opaque continuation token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    /// Field to sort by
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    /// Sort direction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_direction: Option<SortDirection>,
    /// Extra filter fields
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: FilterMap,
}

impl ListOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the starting cursor
    #[must_use]
    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    /// Set sorting
    #[must_use]
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_by = Some(field.into());
        self.sort_direction = Some(direction);
        self
    }

    /// Add a filter
    #[must_use]
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// Copy of these options with `cursor` replaced
    pub fn with_cursor(&self, cursor: Option<String>) -> Self {
        Self {
            cursor,
            ..self.clone()
        }
    }
}

// ============================================================================
// List Response
// ============================================================================

/// Metadata returned with every page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResponseMeta {
    /// Number of matching items on the server (informational only)
    #[serde(default)]
    pub total: u64,
    /// Number of items in this page
    #[serde(default)]
    pub count: u64,
    /// Cursor for the following page; absent on the last page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    /// Cursor for the preceding page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_cursor: Option<String>,
}

impl ListResponseMeta {
    /// Create metadata for a page
    pub fn new(total: u64, count: u64) -> Self {
        Self {
            total,
            count,
            next_cursor: None,
            prev_cursor: None,
        }
    }

    /// Set the next cursor
    #[must_use]
    pub fn with_next_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.next_cursor = Some(cursor.into());
        self
    }

    /// Set the previous cursor
    #[must_use]
    pub fn with_prev_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.prev_cursor = Some(cursor.into());
        self
    }

    /// Whether another page follows this one
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

/// One page of items plus its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    /// Items in server order
    pub items: Vec<T>,
    /// Page metadata
    pub meta: ListResponseMeta,
}

impl<T> ListResponse<T> {
    /// Create a page response
    pub fn new(items: Vec<T>, meta: ListResponseMeta) -> Self {
        Self { items, meta }
    }

    /// Create the final page of a collection (no next cursor)
    pub fn last(items: Vec<T>, total: u64) -> Self {
        let count = items.len() as u64;
        Self::new(items, ListResponseMeta::new(total, count))
    }

    /// Create a page followed by another one at `next_cursor`
    pub fn with_next(items: Vec<T>, total: u64, next_cursor: impl Into<String>) -> Self {
        let count = items.len() as u64;
        Self::new(
            items,
            ListResponseMeta::new(total, count).with_next_cursor(next_cursor),
        )
    }
}
