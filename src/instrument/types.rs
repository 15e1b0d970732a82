//! Instrumentation types and traits
//!
//! A backend hands out one [`Scope`] per traced operation and accepts
//! named metrics. Backends never influence pagination; they only watch.

use crate::error::Error;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, field, info_span, Span};

/// Attribute or tag value attached to a scope or metric
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// String value
    String(String),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Boolean value
    Bool(bool),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Ordered attribute set
pub type Attributes = BTreeMap<String, AttributeValue>;

/// Outcome recorded on a scope
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScopeStatus {
    /// Not set
    #[default]
    Unset,
    /// Completed successfully
    Ok,
    /// Failed, with optional detail
    Error(Option<String>),
}

/// One traced operation
pub trait Scope: Send {
    /// Attach an attribute
    fn set_attribute(&mut self, key: &str, value: AttributeValue);

    /// Record an error raised inside the scope
    fn record_exception(&mut self, error: &Error);

    /// Set the outcome
    fn set_status(&mut self, status: ScopeStatus);

    /// Close the scope
    fn end(&mut self);
}

/// Tracing/metrics backend
pub trait Instrumentation: Send + Sync {
    /// Open a scope for the named operation
    fn start_scope(&self, name: &str) -> Box<dyn Scope>;

    /// Record a metric sample
    fn record_metric(&self, name: &str, value: f64, tags: &Attributes);
}

// ============================================================================
// No-op Backend
// ============================================================================

/// Backend that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInstrumentation;

struct NoopScope;

impl Scope for NoopScope {
    fn set_attribute(&mut self, _key: &str, _value: AttributeValue) {}
    fn record_exception(&mut self, _error: &Error) {}
    fn set_status(&mut self, _status: ScopeStatus) {}
    fn end(&mut self) {}
}

impl Instrumentation for NoopInstrumentation {
    fn start_scope(&self, _name: &str) -> Box<dyn Scope> {
        Box::new(NoopScope)
    }

    fn record_metric(&self, _name: &str, _value: f64, _tags: &Attributes) {}
}

// ============================================================================
// Tracing Backend
// ============================================================================

/// Backend that maps scopes onto `tracing` spans
///
/// Each scope is an `info` span named `paginator` with the operation in
/// its `op` field. Attributes, exceptions and status are emitted as one
/// `debug` event when the scope ends. Metrics are `debug` events on the
/// `solidafy_pager::metrics` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingInstrumentation;

struct TracingScope {
    span: Span,
    name: String,
    attributes: Attributes,
    exceptions: Vec<String>,
    status: ScopeStatus,
    started: Instant,
}

impl Scope for TracingScope {
    fn set_attribute(&mut self, key: &str, value: AttributeValue) {
        self.attributes.insert(key.to_string(), value);
    }

    fn record_exception(&mut self, error: &Error) {
        self.exceptions.push(error.to_string());
    }

    fn set_status(&mut self, status: ScopeStatus) {
        if let ScopeStatus::Error(detail) = &status {
            self.span
                .record("error", field::display(detail.as_deref().unwrap_or("error")));
        }
        self.status = status;
    }

    fn end(&mut self) {
        let _entered = self.span.enter();
        let attributes: Vec<String> = self
            .attributes
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        debug!(
            op = %self.name,
            attributes = %attributes.join(" "),
            exceptions = ?self.exceptions,
            status = ?self.status,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Scope closed"
        );
    }
}

impl Instrumentation for TracingInstrumentation {
    fn start_scope(&self, name: &str) -> Box<dyn Scope> {
        let span = info_span!("paginator", op = %name, error = field::Empty);
        Box::new(TracingScope {
            span,
            name: name.to_string(),
            attributes: Attributes::new(),
            exceptions: Vec::new(),
            status: ScopeStatus::Unset,
            started: Instant::now(),
        })
    }

    fn record_metric(&self, name: &str, value: f64, tags: &Attributes) {
        let tags: Vec<String> = tags.iter().map(|(k, v)| format!("{k}={v}")).collect();
        debug!(
            target: "solidafy_pager::metrics",
            metric = %name,
            value,
            tags = %tags.join(" "),
            "Metric"
        );
    }
}

// ============================================================================
// In-Memory Backend
// ============================================================================

/// A closed or still-open scope as captured by [`MemoryInstrumentation`]
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeRecord {
    /// Operation name
    pub name: String,
    /// Attributes set on the scope
    pub attributes: Attributes,
    /// Recorded errors, as display strings
    pub exceptions: Vec<String>,
    /// Final status
    pub status: ScopeStatus,
    /// How many times `end()` was called
    pub end_calls: u32,
}

impl ScopeRecord {
    /// Attribute lookup
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }
}

/// A recorded metric sample
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    /// Metric name
    pub name: String,
    /// Sample value
    pub value: f64,
    /// Tags attached to the sample
    pub tags: Attributes,
}

#[derive(Debug, Default)]
struct Recorded {
    scopes: Vec<ScopeRecord>,
    metrics: Vec<MetricRecord>,
}

/// Backend that keeps every scope and metric in memory
///
/// Clones share the same recording.
#[derive(Debug, Clone, Default)]
pub struct MemoryInstrumentation {
    recorded: Arc<Mutex<Recorded>>,
}

impl MemoryInstrumentation {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// All scopes opened so far, in opening order
    pub fn scopes(&self) -> Vec<ScopeRecord> {
        self.lock().scopes.clone()
    }

    /// All metric samples so far
    pub fn metrics(&self) -> Vec<MetricRecord> {
        self.lock().metrics.clone()
    }

    /// Metric samples with the given name
    pub fn metrics_named(&self, name: &str) -> Vec<MetricRecord> {
        self.lock()
            .metrics
            .iter()
            .filter(|m| m.name == name)
            .cloned()
            .collect()
    }

    /// Forget everything recorded
    pub fn clear(&self) {
        let mut recorded = self.lock();
        recorded.scopes.clear();
        recorded.metrics.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct MemoryScope {
    recorded: Arc<Mutex<Recorded>>,
    index: usize,
}

impl MemoryScope {
    fn with_record(&self, f: impl FnOnce(&mut ScopeRecord)) {
        let mut recorded = self.recorded.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(record) = recorded.scopes.get_mut(self.index) {
            f(record);
        }
    }
}

impl Scope for MemoryScope {
    fn set_attribute(&mut self, key: &str, value: AttributeValue) {
        self.with_record(|r| {
            r.attributes.insert(key.to_string(), value);
        });
    }

    fn record_exception(&mut self, error: &Error) {
        let message = error.to_string();
        self.with_record(|r| r.exceptions.push(message));
    }

    fn set_status(&mut self, status: ScopeStatus) {
        self.with_record(|r| r.status = status);
    }

    fn end(&mut self) {
        self.with_record(|r| r.end_calls += 1);
    }
}

impl Instrumentation for MemoryInstrumentation {
    fn start_scope(&self, name: &str) -> Box<dyn Scope> {
        let mut recorded = self.lock();
        recorded.scopes.push(ScopeRecord {
            name: name.to_string(),
            attributes: Attributes::new(),
            exceptions: Vec::new(),
            status: ScopeStatus::Unset,
            end_calls: 0,
        });
        Box::new(MemoryScope {
            recorded: Arc::clone(&self.recorded),
            index: recorded.scopes.len() - 1,
        })
    }

    fn record_metric(&self, name: &str, value: f64, tags: &Attributes) {
        self.lock().metrics.push(MetricRecord {
            name: name.to_string(),
            value,
            tags: tags.clone(),
        });
    }
}
