//! Instrumentation module
//!
//! Optional tracing and metrics around pagination, kept out of the
//! engine itself.
//!
//! # Backends
//!
//! - **Noop**: discards everything
//! - **Tracing**: scopes become `tracing` spans
//! - **Memory**: records scopes and metrics for later inspection

mod engine;
mod types;

pub use engine::{InstrumentedEngine, PAGE_METRIC};
pub use types::{
    AttributeValue, Attributes, Instrumentation, MemoryInstrumentation, MetricRecord,
    NoopInstrumentation, Scope, ScopeRecord, ScopeStatus, TracingInstrumentation,
};

#[cfg(test)]
mod tests;
