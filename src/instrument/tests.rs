//! Tests for instrument module

use super::*;
use crate::error::{Error, Result};
use crate::pagination::{
    from_fn, InMemoryStrategy, PaginationEngine, PaginationState, Paginator,
};
use crate::types::{ListOptions, ListResponse};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Helpers
// ============================================================================

fn instrumented(
    n: u32,
    page_size: u32,
) -> (InstrumentedEngine<PaginationEngine<u32>>, MemoryInstrumentation) {
    let recorder = MemoryInstrumentation::new();
    let engine = PaginationEngine::from_strategy(
        InMemoryStrategy::new((1..=n).collect()),
        ListOptions::new().limit(page_size),
    );
    let wrapped = InstrumentedEngine::new(engine, Arc::new(recorder.clone()))
        .with_attribute("resource", "customers");
    (wrapped, recorder)
}

fn scope_names(recorder: &MemoryInstrumentation) -> Vec<String> {
    recorder.scopes().into_iter().map(|s| s.name).collect()
}

// ============================================================================
// AttributeValue Tests
// ============================================================================

#[test]
fn test_attribute_value_conversions() {
    assert_eq!(AttributeValue::from("a"), AttributeValue::String("a".to_string()));
    assert_eq!(AttributeValue::from(3_u64), AttributeValue::Int(3));
    assert_eq!(AttributeValue::from(u64::MAX), AttributeValue::Int(i64::MAX));
    assert_eq!(AttributeValue::from(true), AttributeValue::Bool(true));
    assert_eq!(AttributeValue::from(1.5), AttributeValue::Float(1.5));
}

#[test]
fn test_attribute_value_display() {
    assert_eq!(AttributeValue::from("x").to_string(), "x");
    assert_eq!(AttributeValue::Int(-4).to_string(), "-4");
    assert_eq!(AttributeValue::Bool(false).to_string(), "false");
}

// ============================================================================
// Backend Tests
// ============================================================================

#[test]
fn test_memory_instrumentation_records_scope() {
    let recorder = MemoryInstrumentation::new();
    let mut scope = recorder.start_scope("op");
    scope.set_attribute("k", AttributeValue::Int(1));
    scope.record_exception(&Error::fetch("boom"));
    scope.set_status(ScopeStatus::Error(None));
    scope.end();

    let scopes = recorder.scopes();
    assert_eq!(scopes.len(), 1);
    assert_eq!(scopes[0].name, "op");
    assert_eq!(scopes[0].attribute("k"), Some(&AttributeValue::Int(1)));
    assert_eq!(scopes[0].exceptions, vec!["Page fetch failed: boom".to_string()]);
    assert_eq!(scopes[0].status, ScopeStatus::Error(None));
    assert_eq!(scopes[0].end_calls, 1);
}

#[test]
fn test_memory_instrumentation_clones_share_recording() {
    let recorder = MemoryInstrumentation::new();
    let clone = recorder.clone();
    clone.record_metric("m", 2.0, &Attributes::new());

    assert_eq!(recorder.metrics().len(), 1);
    assert_eq!(recorder.metrics_named("m")[0].value, 2.0);
    assert!(recorder.metrics_named("other").is_empty());

    recorder.clear();
    assert!(clone.metrics().is_empty());
}

#[test]
fn test_noop_and_tracing_backends_accept_calls() {
    for backend in [
        Arc::new(NoopInstrumentation) as Arc<dyn Instrumentation>,
        Arc::new(TracingInstrumentation),
    ] {
        let mut scope = backend.start_scope("paginator.next");
        scope.set_attribute("pagesFetched", 1_u64.into());
        scope.record_exception(&Error::Cancelled);
        scope.set_status(ScopeStatus::Error(Some("cancelled".to_string())));
        scope.end();
        backend.record_metric(PAGE_METRIC, 3.0, &Attributes::new());
    }
}

// ============================================================================
// InstrumentedEngine Tests
// ============================================================================

#[tokio::test]
async fn test_instrumented_next_opens_one_scope_per_call() {
    let (mut engine, recorder) = instrumented(10, 3);

    engine.next().await.unwrap();
    engine.next().await.unwrap();

    assert_eq!(scope_names(&recorder), vec!["paginator.next", "paginator.next"]);

    let second = &recorder.scopes()[1];
    assert_eq!(second.status, ScopeStatus::Ok);
    assert_eq!(second.end_calls, 1);
    assert_eq!(second.attribute("resource"), Some(&AttributeValue::from("customers")));
    assert_eq!(second.attribute("pagesFetched"), Some(&AttributeValue::Int(2)));
    assert_eq!(second.attribute("itemsFetched"), Some(&AttributeValue::Int(6)));
    assert_eq!(second.attribute("hasMore"), Some(&AttributeValue::Bool(true)));
}

#[tokio::test]
async fn test_instrumented_all_items_records_metric_per_fetch() {
    let (mut engine, recorder) = instrumented(10, 3);

    let items = engine.all_items().await.unwrap();
    assert_eq!(items, (1..=10).collect::<Vec<_>>());

    assert_eq!(scope_names(&recorder), vec!["paginator.all_items"]);
    let scope = &recorder.scopes()[0];
    assert_eq!(scope.attribute("pagesFetched"), Some(&AttributeValue::Int(4)));
    assert_eq!(scope.attribute("itemsFetched"), Some(&AttributeValue::Int(10)));
    assert_eq!(scope.attribute("hasMore"), Some(&AttributeValue::Bool(false)));

    let metrics = recorder.metrics_named(PAGE_METRIC);
    let sizes: Vec<f64> = metrics.iter().map(|m| m.value).collect();
    assert_eq!(sizes, vec![3.0, 3.0, 3.0, 1.0]);
    assert_eq!(metrics[3].tags.get("page"), Some(&AttributeValue::Int(4)));
    assert_eq!(
        metrics[0].tags.get("resource"),
        Some(&AttributeValue::from("customers"))
    );
}

#[tokio::test]
async fn test_instrumented_noop_next_records_no_metric() {
    let (mut engine, recorder) = instrumented(2, 5);

    engine.next().await.unwrap();
    assert!(!engine.has_next());
    let empty = engine.next().await.unwrap();

    assert!(empty.is_empty());
    assert_eq!(recorder.scopes().len(), 2);
    assert_eq!(recorder.metrics_named(PAGE_METRIC).len(), 1);
}

#[tokio::test]
async fn test_instrumented_failure_records_exception() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let strategy = from_fn(move |_options: ListOptions| {
        let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            if call == 2 {
                Err(Error::fetch("upstream down"))
            } else {
                Ok(ListResponse::with_next(vec![1_u32, 2], 4, "next"))
            }
        }
    });
    let recorder = MemoryInstrumentation::new();
    let mut engine = InstrumentedEngine::new(
        PaginationEngine::from_strategy(strategy, ListOptions::new()),
        Arc::new(recorder.clone()),
    );

    let err = engine.all_items().await.unwrap_err();
    assert!(matches!(err, Error::Fetch { .. }));

    let scope = &recorder.scopes()[0];
    assert_eq!(scope.exceptions, vec!["Page fetch failed: upstream down".to_string()]);
    assert_eq!(
        scope.status,
        ScopeStatus::Error(Some("Page fetch failed: upstream down".to_string()))
    );
    assert_eq!(scope.end_calls, 1);
    assert_eq!(scope.attribute("pagesFetched"), Some(&AttributeValue::Int(1)));
    assert_eq!(recorder.metrics_named(PAGE_METRIC).len(), 1);
}

#[tokio::test]
async fn test_instrumented_callback_error_closes_scope() {
    let (mut engine, recorder) = instrumented(10, 3);

    let result = engine
        .for_each_page(|_page| async { Err(Error::callback("stop")) })
        .await;

    assert!(matches!(result, Err(Error::Callback { .. })));
    let scope = &recorder.scopes()[0];
    assert_eq!(scope.name, "paginator.for_each_page");
    assert_eq!(scope.end_calls, 1);
    assert_eq!(engine.pagination_state().pages_fetched, 1);
}

#[tokio::test]
async fn test_instrumented_for_each_item_and_reset() {
    let (mut engine, recorder) = instrumented(5, 2);

    let mut seen = Vec::new();
    engine
        .for_each_item(|item| {
            seen.push(item);
            async { Ok(()) }
        })
        .await
        .unwrap();
    assert_eq!(seen, vec![1, 2, 3, 4, 5]);

    engine.reset();
    assert_eq!(engine.pagination_state(), PaginationState::new());

    assert_eq!(
        scope_names(&recorder),
        vec!["paginator.for_each_item", "paginator.reset"]
    );
    let reset = &recorder.scopes()[1];
    assert_eq!(reset.attribute("pagesFetched"), Some(&AttributeValue::Int(0)));
    assert_eq!(reset.attribute("hasMore"), Some(&AttributeValue::Bool(true)));
}

#[tokio::test]
async fn test_instrumented_current_page_fetches_once() {
    let (mut engine, recorder) = instrumented(4, 2);

    assert_eq!(engine.current_page().await.unwrap(), vec![1, 2]);
    assert_eq!(engine.current_page().await.unwrap(), vec![1, 2]);

    assert_eq!(recorder.scopes().len(), 2);
    assert_eq!(recorder.metrics_named(PAGE_METRIC).len(), 1);
}

#[tokio::test]
async fn test_instrumented_dropped_future_still_ends_scope() {
    let strategy = from_fn(|_options: ListOptions| async {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(ListResponse::last(vec![1_u32], 1))
    });
    let recorder = MemoryInstrumentation::new();
    let mut engine = InstrumentedEngine::new(
        PaginationEngine::from_strategy(strategy, ListOptions::new()),
        Arc::new(recorder.clone()),
    );

    let outcome = tokio::time::timeout(Duration::from_millis(20), engine.next()).await;
    assert!(outcome.is_err());

    let scope = &recorder.scopes()[0];
    assert_eq!(scope.end_calls, 1);
    assert_eq!(
        scope.status,
        ScopeStatus::Error(Some("operation abandoned".to_string()))
    );
}

#[tokio::test]
async fn test_instrumented_engine_is_a_paginator() {
    async fn drain<P: Paginator<u32>>(mut paginator: P) -> Result<Vec<u32>> {
        paginator.all_items().await
    }

    let (engine, _recorder) = instrumented(7, 3);
    assert_eq!(drain(engine).await.unwrap(), (1..=7).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_for_each_page_cancel_matches_base_engine() {
    use crate::pagination::PaginationConfig;
    use tokio_util::sync::CancellationToken;

    for (cancel_on_page, expect_cancelled) in [(1, true), (2, false)] {
        let token = CancellationToken::new();
        let config = PaginationConfig::<u32>::builder()
            .fetch_page(InMemoryStrategy::new((1..=10).collect()))
            .initial_options(ListOptions::new().limit(5))
            .cancel_token(token.clone())
            .build()
            .unwrap();
        let recorder = MemoryInstrumentation::new();
        let mut engine =
            InstrumentedEngine::new(PaginationEngine::new(config), Arc::new(recorder.clone()));

        let mut seen = 0;
        let result = engine
            .for_each_page(|_page| {
                seen += 1;
                if seen == cancel_on_page {
                    token.cancel();
                }
                async { Ok(()) }
            })
            .await;

        assert_eq!(result.is_err_and(|e| e.is_cancelled()), expect_cancelled);
        let scope = &recorder.scopes()[0];
        assert_eq!(scope.end_calls, 1);
        assert_eq!(matches!(scope.status, ScopeStatus::Error(_)), expect_cancelled);
    }
}
