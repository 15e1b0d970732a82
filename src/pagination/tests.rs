//! Tests for pagination module

use super::*;
use crate::error::{Error, Result};
use crate::types::{ListOptions, ListResponse};
use futures::StreamExt;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use test_case::test_case;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Helpers
// ============================================================================

fn numbers(n: u32) -> Arc<InMemoryStrategy<u32>> {
    Arc::new(InMemoryStrategy::new((1..=n).collect()))
}

fn engine_over(strategy: &Arc<InMemoryStrategy<u32>>, page_size: u32) -> PaginationEngine<u32> {
    PaginationEngine::from_strategy(Arc::clone(strategy), ListOptions::new().limit(page_size))
}

/// Strategy over `1..=n` that fails on the `fail_on`-th call (1-based)
fn failing_on(
    n: u32,
    fail_on: usize,
) -> (
    Arc<AtomicUsize>,
    FnStrategy<impl Fn(ListOptions) -> futures::future::BoxFuture<'static, Result<ListResponse<u32>>>, u32>,
) {
    let calls = Arc::new(AtomicUsize::new(0));
    let backing = numbers(n);
    let counter = Arc::clone(&calls);

    let strategy = from_fn(move |options: ListOptions| {
        let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
        let backing = Arc::clone(&backing);
        let fut: futures::future::BoxFuture<'static, Result<ListResponse<u32>>> =
            Box::pin(async move {
                if call == fail_on {
                    return Err(Error::fetch(format!("upstream failed on call {call}")));
                }
                backing.fetch_page(options).await
            });
        fut
    });

    (calls, strategy)
}

// ============================================================================
// PaginationState Tests
// ============================================================================

#[test]
fn test_pagination_state_default() {
    let state = PaginationState::new();
    assert!(state.cursor.is_none());
    assert!(state.has_more);
    assert_eq!(state.pages_fetched, 0);
    assert_eq!(state.items_fetched, 0);
    assert!(state.last_fetch_at.is_none());
    assert!(state.is_fresh());
}

#[test]
fn test_pagination_state_advanced() {
    let state = PaginationState::new();

    let next = state.advanced(Some("c1".to_string()), 3);
    assert_eq!(next.cursor.as_deref(), Some("c1"));
    assert!(next.has_more);
    assert_eq!(next.pages_fetched, 1);
    assert_eq!(next.items_fetched, 3);
    assert!(next.last_fetch_at.is_some());

    let last = next.advanced(None, 2);
    assert!(last.cursor.is_none());
    assert!(!last.has_more);
    assert_eq!(last.pages_fetched, 2);
    assert_eq!(last.items_fetched, 5);

    // The source state is untouched
    assert!(state.is_fresh());
}

#[test]
fn test_pagination_state_serialization() {
    let state = PaginationState::new().advanced(Some("abc".to_string()), 7);
    let json = serde_json::to_string(&state).unwrap();
    let restored: PaginationState = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, state);
}

#[test]
fn test_limits_reached() {
    let state = PaginationState::new().advanced(Some("x".to_string()), 3);

    assert!(!Limits::unbounded().reached(&state));
    assert!(Limits {
        max_items: Some(3),
        max_pages: None
    }
    .reached(&state));
    assert!(!Limits {
        max_items: Some(4),
        max_pages: Some(2)
    }
    .reached(&state));
    assert!(Limits {
        max_items: None,
        max_pages: Some(1)
    }
    .reached(&state));
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_config_requires_fetch_page() {
    let err = PaginationConfig::<u32>::builder().max_items(10).build().unwrap_err();
    assert!(matches!(err, Error::MissingConfigField { ref field } if field == "fetch_page"));
}

#[test]
fn test_config_rejects_zero_limit() {
    let err = PaginationConfig::builder()
        .fetch_page(InMemoryStrategy::new(vec![1_u32]))
        .initial_options(ListOptions::new().limit(0))
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { ref field, .. } if field == "limit"));
}

#[test]
fn test_config_builder() {
    let config = PaginationConfig::builder()
        .fetch_page(InMemoryStrategy::new(vec![1_u32, 2, 3]))
        .initial_options(ListOptions::new().limit(2))
        .max_items(10)
        .max_pages(4)
        .fetch_timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    assert_eq!(config.initial_options.limit, Some(2));
    assert_eq!(config.limits.max_items, Some(10));
    assert_eq!(config.limits.max_pages, Some(4));
    assert_eq!(config.fetch_timeout, Some(Duration::from_secs(5)));
    assert!(config.cancel_token.is_none());
}

// ============================================================================
// Engine: Iteration Protocol
// ============================================================================

#[tokio::test]
async fn test_ten_items_page_size_three() {
    let strategy = numbers(10);
    let mut engine = engine_over(&strategy, 3);

    let mut has_next_seq = Vec::new();
    let mut pages = Vec::new();
    loop {
        let has_next = engine.has_next();
        has_next_seq.push(has_next);
        if !has_next {
            break;
        }
        pages.push(engine.next().await.unwrap());
    }

    assert_eq!(has_next_seq, vec![true, true, true, true, false]);
    assert_eq!(
        pages,
        vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9], vec![10]]
    );

    let state = engine.pagination_state();
    assert_eq!(state.pages_fetched, 4);
    assert_eq!(state.items_fetched, 10);
    assert!(!state.has_more);
    assert!(state.cursor.is_none());
}

#[test_case(10, 3 ; "ten by three")]
#[test_case(9, 3 ; "exact multiple")]
#[test_case(1, 5 ; "single short page")]
#[test_case(25, 1 ; "one item per page")]
#[test_case(100, 7 ; "hundred by seven")]
#[tokio::test]
async fn test_all_items_preserves_order_and_page_count(n: u32, page_size: u32) {
    let strategy = numbers(n);
    let mut engine = engine_over(&strategy, page_size);

    let items = engine.all_items().await.unwrap();

    assert_eq!(items, (1..=n).collect::<Vec<_>>());
    let expected_pages = u64::from(n.div_ceil(page_size));
    assert_eq!(engine.pagination_state().pages_fetched, expected_pages);
    assert_eq!(strategy.fetch_count() as u64, expected_pages);
}

#[tokio::test]
async fn test_all_items_on_empty_collection() {
    let strategy = numbers(0);
    let mut engine = engine_over(&strategy, 5);

    let items = engine.all_items().await.unwrap();

    assert!(items.is_empty());
    assert!(!engine.has_next());
    assert_eq!(engine.pagination_state().pages_fetched, 1);
}

#[tokio::test]
async fn test_has_next_true_before_first_fetch() {
    let strategy = numbers(0);
    let engine = engine_over(&strategy, 5);

    assert!(engine.has_next());
    assert_eq!(engine.phase(), Phase::Fresh);
    assert_eq!(strategy.fetch_count(), 0);
}

#[tokio::test]
async fn test_next_after_exhaustion_is_noop() {
    let strategy = numbers(4);
    let mut engine = engine_over(&strategy, 4);

    engine.next().await.unwrap();
    assert!(!engine.has_next());
    let before = engine.pagination_state();
    let fetches = strategy.fetch_count();

    let page = engine.next().await.unwrap();
    let page_again = engine.next().await.unwrap();

    assert!(page.is_empty());
    assert!(page_again.is_empty());
    assert_eq!(engine.pagination_state(), before);
    assert_eq!(strategy.fetch_count(), fetches);
}

#[tokio::test]
async fn test_phase_transitions() {
    let strategy = numbers(6);
    let mut engine = engine_over(&strategy, 3);

    assert_eq!(engine.phase(), Phase::Fresh);
    assert!(engine.phase().accepts_fetch());

    engine.next().await.unwrap();
    assert_eq!(engine.phase(), Phase::Iterating);

    engine.next().await.unwrap();
    assert_eq!(engine.phase(), Phase::Exhausted);
    assert!(!engine.phase().accepts_fetch());

    engine.reset();
    assert_eq!(engine.phase(), Phase::Fresh);
}

#[tokio::test]
async fn test_fetch_options_overlay_cursor() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let backing = numbers(5);
    let recorder = Arc::clone(&seen);

    let strategy = from_fn(move |options: ListOptions| {
        recorder.lock().unwrap().push(options.clone());
        let backing = Arc::clone(&backing);
        async move { backing.fetch_page(options).await }
    });

    let initial = ListOptions::new().limit(2).filter("status", "active");
    let mut engine = PaginationEngine::from_strategy(strategy, initial.clone());
    engine.all_items().await.unwrap();

    let seen = seen.lock().unwrap();
    let cursors: Vec<_> = seen.iter().map(|o| o.cursor.clone()).collect();
    assert_eq!(
        cursors,
        vec![None, Some("2".to_string()), Some("4".to_string())]
    );
    for options in seen.iter() {
        assert_eq!(options.limit, Some(2));
        assert_eq!(options.filters, initial.filters);
    }
}

#[tokio::test]
async fn test_initial_cursor_applies_to_first_page_only() {
    let strategy = numbers(10);
    let mut engine = PaginationEngine::from_strategy(
        Arc::clone(&strategy),
        ListOptions::new().limit(3).cursor("6"),
    );

    assert_eq!(engine.next().await.unwrap(), vec![7, 8, 9]);
    assert_eq!(engine.next().await.unwrap(), vec![10]);
    assert!(!engine.has_next());

    engine.reset();
    assert_eq!(engine.all_items().await.unwrap(), vec![7, 8, 9, 10]);
}

// ============================================================================
// Engine: Current Page
// ============================================================================

#[tokio::test]
async fn test_current_page_fetches_lazily_once() {
    let strategy = numbers(10);
    let mut engine = engine_over(&strategy, 3);

    assert_eq!(engine.current_page().await.unwrap(), vec![1, 2, 3]);
    assert_eq!(strategy.fetch_count(), 1);

    assert_eq!(engine.current_page().await.unwrap(), vec![1, 2, 3]);
    assert_eq!(strategy.fetch_count(), 1);

    engine.next().await.unwrap();
    assert_eq!(engine.current_page().await.unwrap(), vec![4, 5, 6]);
    assert_eq!(strategy.fetch_count(), 2);
}

// ============================================================================
// Engine: Bounds
// ============================================================================

#[tokio::test]
async fn test_max_items_completes_crossing_page() {
    let strategy = numbers(10);
    let config = PaginationConfig::<u32>::builder()
        .shared_fetch_page(strategy.clone())
        .initial_options(ListOptions::new().limit(3))
        .max_items(5)
        .build()
        .unwrap();
    let mut engine = PaginationEngine::new(config);

    let items = engine.all_items().await.unwrap();

    assert_eq!(items, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(strategy.fetch_count(), 2);
    assert_eq!(engine.pagination_state().items_fetched, 6);
    assert_eq!(engine.phase(), Phase::LimitReached);

    assert!(engine.next().await.unwrap().is_empty());
    assert_eq!(strategy.fetch_count(), 2);
}

#[tokio::test]
async fn test_max_items_smaller_than_page_size() {
    let strategy = numbers(10);
    let config = PaginationConfig::<u32>::builder()
        .shared_fetch_page(strategy.clone())
        .initial_options(ListOptions::new().limit(4))
        .max_items(2)
        .build()
        .unwrap();
    let mut engine = PaginationEngine::new(config);

    let items = engine.all_items().await.unwrap();

    assert_eq!(items, vec![1, 2, 3, 4]);
    assert!(engine.pagination_state().items_fetched >= 2);
    assert!(!engine.has_next());
    assert_eq!(strategy.fetch_count(), 1);
}

#[test_case(1 ; "one page")]
#[test_case(2 ; "two pages")]
#[test_case(3 ; "three pages")]
#[tokio::test]
async fn test_max_pages_bounds_io(max_pages: u64) {
    let strategy = numbers(100);
    let config = PaginationConfig::<u32>::builder()
        .shared_fetch_page(strategy.clone())
        .initial_options(ListOptions::new().limit(5))
        .max_pages(max_pages)
        .build()
        .unwrap();
    let mut engine = PaginationEngine::new(config);

    for _ in 0..max_pages {
        assert_eq!(engine.next().await.unwrap().len(), 5);
    }
    assert_eq!(strategy.fetch_count() as u64, max_pages);

    assert!(engine.next().await.unwrap().is_empty());
    assert_eq!(strategy.fetch_count() as u64, max_pages);
    assert_eq!(engine.pagination_state().pages_fetched, max_pages);
}

// ============================================================================
// Engine: Failures
// ============================================================================

#[tokio::test]
async fn test_failure_leaves_state_unchanged() {
    let (calls, strategy) = failing_on(10, 3);
    let mut engine = PaginationEngine::from_strategy(strategy, ListOptions::new().limit(3));

    let err = engine.all_items().await.unwrap_err();

    assert!(matches!(err, Error::Fetch { ref message } if message == "upstream failed on call 3"));
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let state = engine.pagination_state();
    assert_eq!(state.pages_fetched, 2);
    assert_eq!(state.items_fetched, 6);
    assert_eq!(state.cursor.as_deref(), Some("6"));
    assert!(state.has_more);
}

#[tokio::test]
async fn test_engine_usable_after_failure() {
    let (_calls, strategy) = failing_on(10, 2);
    let mut engine = PaginationEngine::from_strategy(strategy, ListOptions::new().limit(4));

    assert_eq!(engine.next().await.unwrap(), vec![1, 2, 3, 4]);
    assert!(engine.next().await.is_err());

    // Retrying is the caller's call; the engine resumes from the last good page
    assert_eq!(engine.next().await.unwrap(), vec![5, 6, 7, 8]);
    assert_eq!(engine.next().await.unwrap(), vec![9, 10]);
    assert_eq!(engine.pagination_state().items_fetched, 10);
}

#[tokio::test]
async fn test_first_fetch_failure_keeps_fresh_state() {
    let (_calls, strategy) = failing_on(10, 1);
    let mut engine = PaginationEngine::from_strategy(strategy, ListOptions::new().limit(4));

    assert!(engine.current_page().await.is_err());
    assert_eq!(engine.pagination_state(), PaginationState::new());
    assert!(engine.last_page().is_none());
}

// ============================================================================
// Engine: Reset and Resume
// ============================================================================

#[tokio::test]
async fn test_reset_matches_fresh_engine() {
    let strategy = numbers(11);
    let mut engine = engine_over(&strategy, 4);

    engine.next().await.unwrap();
    engine.reset();
    assert_eq!(engine.pagination_state(), PaginationState::new());
    assert!(engine.last_page().is_none());

    let after_reset = engine.all_items().await.unwrap();

    let mut fresh = engine_over(&strategy, 4);
    assert_eq!(after_reset, fresh.all_items().await.unwrap());

    // Reset after exhaustion too
    engine.reset();
    assert!(engine.has_next());
    assert_eq!(engine.all_items().await.unwrap(), after_reset);
}

#[tokio::test]
async fn test_resume_from_saved_state() {
    let strategy = numbers(10);
    let mut engine = engine_over(&strategy, 3);
    engine.next().await.unwrap();
    engine.next().await.unwrap();

    let saved = serde_json::to_string(&engine.pagination_state()).unwrap();
    drop(engine);

    let state: PaginationState = serde_json::from_str(&saved).unwrap();
    let config = PaginationConfig::<u32>::builder()
        .shared_fetch_page(strategy.clone())
        .initial_options(ListOptions::new().limit(3))
        .build()
        .unwrap();
    let mut resumed = PaginationEngine::resume(config, state);

    assert_eq!(resumed.all_items().await.unwrap(), vec![7, 8, 9, 10]);
    assert_eq!(resumed.pagination_state().pages_fetched, 4);
    assert_eq!(resumed.pagination_state().items_fetched, 10);
}

// ============================================================================
// Engine: Push Traversal
// ============================================================================

#[tokio::test]
async fn test_for_each_page_awaits_callback_before_next_fetch() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let backing = numbers(7);
    let fetch_log = Arc::clone(&events);

    let strategy = from_fn(move |options: ListOptions| {
        let backing = Arc::clone(&backing);
        let fetch_log = Arc::clone(&fetch_log);
        async move {
            let page = backing.fetch_page(options).await?;
            fetch_log
                .lock()
                .unwrap()
                .push(format!("fetch {:?}", page.items));
            Ok(page)
        }
    });

    let mut engine = PaginationEngine::from_strategy(strategy, ListOptions::new().limit(3));
    let callback_log = Arc::clone(&events);
    engine
        .for_each_page(|page| {
            let callback_log = Arc::clone(&callback_log);
            async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                callback_log.lock().unwrap().push(format!("page {page:?}"));
                Ok(())
            }
        })
        .await
        .unwrap();

    let events = events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "fetch [1, 2, 3]",
            "page [1, 2, 3]",
            "fetch [4, 5, 6]",
            "page [4, 5, 6]",
            "fetch [7]",
            "page [7]",
        ]
    );
}

#[tokio::test]
async fn test_for_each_item_in_order() {
    let strategy = numbers(8);
    let mut engine = engine_over(&strategy, 3);
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    engine
        .for_each_item(|item| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(item);
                Ok(())
            }
        })
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), (1..=8).collect::<Vec<_>>());
    assert_eq!(engine.pagination_state().pages_fetched, 3);
}

#[tokio::test]
async fn test_for_each_item_callback_error_aborts() {
    let strategy = numbers(10);
    let mut engine = engine_over(&strategy, 3);
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    let err = engine
        .for_each_item(|item| {
            let sink = Arc::clone(&sink);
            async move {
                if item == 5 {
                    return Err(Error::callback("item 5 rejected"));
                }
                sink.lock().unwrap().push(item);
                Ok(())
            }
        })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Callback { ref message } if message == "item 5 rejected"));
    // Delivered items are not rolled back
    assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4]);
    assert_eq!(engine.pagination_state().pages_fetched, 2);
    assert_eq!(strategy.fetch_count(), 2);
}

#[tokio::test]
async fn test_for_each_page_fetch_error_propagates() {
    let (_calls, strategy) = failing_on(10, 2);
    let mut engine = PaginationEngine::from_strategy(strategy, ListOptions::new().limit(5));
    let pages = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&pages);
    let result = engine
        .for_each_page(|_page| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;

    assert!(matches!(result, Err(Error::Fetch { .. })));
    assert_eq!(pages.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Engine: Cancellation and Deadlines
// ============================================================================

#[tokio::test]
async fn test_cancelled_before_fetch() {
    let strategy = numbers(10);
    let token = CancellationToken::new();
    let config = PaginationConfig::<u32>::builder()
        .shared_fetch_page(strategy.clone())
        .initial_options(ListOptions::new().limit(3))
        .cancel_token(token.clone())
        .build()
        .unwrap();
    let mut engine = PaginationEngine::new(config);

    engine.next().await.unwrap();
    token.cancel();

    let err = engine.next().await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(strategy.fetch_count(), 1);
    assert_eq!(engine.pagination_state().pages_fetched, 1);
}

#[tokio::test]
async fn test_cancel_in_flight_fetch() {
    let strategy = from_fn(|_options: ListOptions| async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(ListResponse::last(vec![1_u32], 1))
    });
    let token = CancellationToken::new();
    let config = PaginationConfig::builder()
        .fetch_page(strategy)
        .cancel_token(token.clone())
        .build()
        .unwrap();
    let mut engine = PaginationEngine::new(config);

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let err = engine.next().await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert_eq!(engine.pagination_state(), PaginationState::new());
}

#[tokio::test]
async fn test_cancel_stops_for_each_page() {
    let strategy = numbers(30);
    let token = CancellationToken::new();
    let config = PaginationConfig::<u32>::builder()
        .shared_fetch_page(strategy.clone())
        .initial_options(ListOptions::new().limit(5))
        .cancel_token(token.clone())
        .build()
        .unwrap();
    let mut engine = PaginationEngine::new(config);

    let err = engine
        .for_each_page(|_page| {
            let token = token.clone();
            async move {
                token.cancel();
                Ok(())
            }
        })
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(strategy.fetch_count(), 1);
}

/// Token fired from the callback of `cancel_on_page` (1-based)
async fn walk_cancelling<P: Paginator<u32>>(
    engine: &mut P,
    token: &CancellationToken,
    cancel_on_page: usize,
) -> Result<()> {
    let mut seen = 0;
    engine
        .for_each_page(|_page| {
            seen += 1;
            if seen == cancel_on_page {
                token.cancel();
            }
            async { Ok(()) }
        })
        .await
}

fn cancellable(n: u32, token: &CancellationToken) -> PaginationConfig<u32> {
    PaginationConfig::<u32>::builder()
        .fetch_page(InMemoryStrategy::new((1..=n).collect()))
        .initial_options(ListOptions::new().limit(5))
        .cancel_token(token.clone())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_cancel_on_last_page_callback_completes() {
    let token = CancellationToken::new();
    let mut engine = PaginationEngine::new(cancellable(10, &token));
    walk_cancelling(&mut engine, &token, 2).await.unwrap();
    assert_eq!(engine.pagination_state().items_fetched, 10);

    let token = CancellationToken::new();
    let mut observed = ObservedEngine::new(
        cancellable(10, &token),
        PartitionCounter::new(|n: &u32| n % 2),
    );
    walk_cancelling(&mut observed, &token, 2).await.unwrap();
    assert_eq!(observed.observer().total(), 10);
}

#[tokio::test]
async fn test_cancel_mid_walk_same_for_observed_engine() {
    let token = CancellationToken::new();
    let mut engine = PaginationEngine::new(cancellable(10, &token));
    let err = walk_cancelling(&mut engine, &token, 1).await.unwrap_err();
    assert!(err.is_cancelled());

    let token = CancellationToken::new();
    let mut observed = ObservedEngine::new(
        cancellable(10, &token),
        PartitionCounter::new(|n: &u32| n % 2),
    );
    let err = walk_cancelling(&mut observed, &token, 1).await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(observed.observer().pages_observed(), 1);
    assert_eq!(
        observed.pagination_state().items_fetched,
        engine.pagination_state().items_fetched
    );
}

#[tokio::test]
async fn test_fetch_timeout() {
    let strategy = from_fn(|_options: ListOptions| async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(ListResponse::last(vec![1_u32], 1))
    });
    let config = PaginationConfig::builder()
        .fetch_page(strategy)
        .fetch_timeout(Duration::from_millis(10))
        .build()
        .unwrap();
    let mut engine = PaginationEngine::new(config);

    let err = engine.next().await.unwrap_err();
    assert!(matches!(err, Error::Timeout { timeout_ms: 10 }));
    assert!(engine.pagination_state().is_fresh());
}

// ============================================================================
// Strategy Tests
// ============================================================================

#[tokio::test]
async fn test_offset_strategy_total_45_limit_15() {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&requests);

    let strategy = Arc::new(OffsetStrategy::new(move |request: OffsetRequest| {
        log.lock().unwrap().push(request.offset);
        async move {
            let limit = u64::from(request.limit.unwrap_or(15));
            let end = (request.offset + limit).min(45);
            Ok(OffsetPage::new((request.offset..end).collect::<Vec<u64>>(), 45))
        }
    }));

    let mut engine =
        PaginationEngine::from_strategy(Arc::clone(&strategy), ListOptions::new().limit(15));

    let mut cursors = Vec::new();
    while engine.has_next() {
        engine.next().await.unwrap();
        cursors.push(engine.pagination_state().cursor);
    }

    assert_eq!(
        cursors,
        vec![Some("15".to_string()), Some("30".to_string()), None]
    );
    assert_eq!(*requests.lock().unwrap(), vec![0, 15, 30]);
    assert_eq!(engine.pagination_state().items_fetched, 45);
    assert_eq!(strategy.offset(), 45);
}

#[tokio::test]
async fn test_offset_strategy_rewinds_on_reset() {
    let strategy = Arc::new(OffsetStrategy::new(|request: OffsetRequest| async move {
        let end = (request.offset + 2).min(5);
        Ok(OffsetPage::new((request.offset..end).collect::<Vec<u64>>(), 5))
    }));

    let mut engine =
        PaginationEngine::from_strategy(Arc::clone(&strategy), ListOptions::new().limit(2));
    let first = engine.all_items().await.unwrap();

    engine.reset();
    let second = engine.all_items().await.unwrap();

    assert_eq!(first, vec![0, 1, 2, 3, 4]);
    assert_eq!(second, first);
}

#[tokio::test]
async fn test_offset_strategy_stops_on_empty_page() {
    // Upstream claims 100 items but runs dry early
    let strategy = OffsetStrategy::new(|request: OffsetRequest| async move {
        let items: Vec<u64> = if request.offset < 4 {
            (request.offset..request.offset + 2).collect()
        } else {
            Vec::new()
        };
        Ok(OffsetPage::new(items, 100))
    });

    let items = fetch_all_items(strategy, ListOptions::new().limit(2))
        .await
        .unwrap();
    assert_eq!(items, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn test_cursor_strategy_passes_tokens_verbatim() {
    let received = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&received);

    let strategy = CursorStrategy::new(move |options: ListOptions| {
        log.lock().unwrap().push(options.cursor.clone());
        async move {
            let page = match options.cursor.as_deref() {
                None => CursorPage::new(vec!["a", "b"], Some("tok/==1".to_string())),
                Some("tok/==1") => CursorPage::new(vec!["c"], Some(String::new()))
                    .with_prev_token("tok/==0")
                    .with_total(3),
                Some(other) => return Err(Error::fetch(format!("unknown token {other}"))),
            };
            Ok(page)
        }
    });

    let mut engine = PaginationEngine::from_strategy(strategy, ListOptions::new());
    let first = engine.next().await.unwrap();
    assert_eq!(first, vec!["a", "b"]);
    assert_eq!(engine.pagination_state().cursor.as_deref(), Some("tok/==1"));

    let second = engine.next().await.unwrap();
    assert_eq!(second, vec!["c"]);
    // An empty upstream token ends the traversal
    assert!(!engine.has_next());

    assert_eq!(
        *received.lock().unwrap(),
        vec![None, Some("tok/==1".to_string())]
    );
}

#[tokio::test]
async fn test_in_memory_strategy_meta() {
    let strategy = InMemoryStrategy::new(vec!['a', 'b', 'c', 'd', 'e']);

    let page = strategy
        .fetch_page(ListOptions::new().limit(2).cursor("2"))
        .await
        .unwrap();
    assert_eq!(page.items, vec!['c', 'd']);
    assert_eq!(page.meta.total, 5);
    assert_eq!(page.meta.count, 2);
    assert_eq!(page.meta.next_cursor.as_deref(), Some("4"));
    assert_eq!(page.meta.prev_cursor.as_deref(), Some("0"));

    let err = strategy
        .fetch_page(ListOptions::new().cursor("not-a-number"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Fetch { .. }));
}

// ============================================================================
// Specialized Engine Tests
// ============================================================================

#[tokio::test]
async fn test_observed_engine_partitions_without_touching_state() {
    let strategy = numbers(10);
    let counter = PartitionCounter::new(|n: &u32| if n % 2 == 0 { "even" } else { "odd" });
    let mut observed = ObservedEngine::wrap(engine_over(&strategy, 3), counter);

    let items = observed.all_items().await.unwrap();

    let mut plain = engine_over(&numbers(10), 3);
    let plain_items = plain.all_items().await.unwrap();

    assert_eq!(items, plain_items);
    let observed_state = observed.pagination_state();
    let plain_state = plain.pagination_state();
    assert_eq!(observed_state.pages_fetched, plain_state.pages_fetched);
    assert_eq!(observed_state.items_fetched, plain_state.items_fetched);
    assert_eq!(observed_state.has_more, plain_state.has_more);
    assert_eq!(observed_state.cursor, plain_state.cursor);

    let counter = observed.observer();
    assert_eq!(counter.count(&"even"), 5);
    assert_eq!(counter.count(&"odd"), 5);
    assert_eq!(counter.pages_observed(), 4);
    assert_eq!(counter.total(), 10);
}

#[tokio::test]
async fn test_observed_engine_ignores_noop_next_and_resets() {
    let strategy = numbers(2);
    let counter = PartitionCounter::new(|n: &u32| *n > 1);
    let mut observed = ObservedEngine::wrap(engine_over(&strategy, 5), counter);

    observed.next().await.unwrap();
    observed.next().await.unwrap();
    assert_eq!(observed.observer().pages_observed(), 1);

    observed.reset();
    assert_eq!(observed.observer().pages_observed(), 0);
    assert!(observed.observer().counts().is_empty());
    assert!(observed.has_next());

    let page = observed.current_page().await.unwrap();
    assert_eq!(page, vec![1, 2]);
    assert_eq!(observed.observer().count(&true), 1);
    assert_eq!(observed.observer().count(&false), 1);
}

#[tokio::test]
async fn test_observed_engine_for_each_item() {
    let strategy = numbers(7);
    let counter = PartitionCounter::new(|n: &u32| n % 3);
    let mut observed = ObservedEngine::wrap(engine_over(&strategy, 2), counter);
    let sum = Arc::new(AtomicUsize::new(0));

    let total = Arc::clone(&sum);
    observed
        .for_each_item(|n| {
            let total = Arc::clone(&total);
            async move {
                total.fetch_add(n as usize, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .unwrap();

    assert_eq!(sum.load(Ordering::SeqCst), 28);
    assert_eq!(observed.observer().count(&0), 2);
    assert_eq!(observed.observer().count(&1), 3);
    assert_eq!(observed.observer().count(&2), 2);
}

// ============================================================================
// Lazy Stream Tests
// ============================================================================

#[tokio::test]
async fn test_page_stream_is_lazy() {
    let strategy = numbers(20);
    let mut pages = PageStream::new(engine_over(&strategy, 5));

    assert_eq!(strategy.fetch_count(), 0);

    assert_eq!(pages.next().await.unwrap().unwrap(), vec![1, 2, 3, 4, 5]);
    assert_eq!(pages.next().await.unwrap().unwrap(), vec![6, 7, 8, 9, 10]);
    assert_eq!(strategy.fetch_count(), 2);

    // Abandoning early fetches nothing more
    drop(pages);
    assert_eq!(strategy.fetch_count(), 2);
}

#[tokio::test]
async fn test_page_stream_ends_after_error() {
    let (_calls, strategy) = failing_on(10, 2);
    let stream = PageStream::new(PaginationEngine::from_strategy(
        strategy,
        ListOptions::new().limit(4),
    ));

    let results: Vec<_> = stream.collect().await;
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(Error::Fetch { .. })));
}

#[tokio::test]
async fn test_page_stream_into_items() {
    let strategy = numbers(7);
    let items: Vec<u32> = PageStream::new(engine_over(&strategy, 3))
        .into_items()
        .map(|item| item.unwrap())
        .collect()
        .await;

    assert_eq!(items, (1..=7).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_page_stream_respects_bounds() {
    let strategy = numbers(50);
    let config = PaginationConfig::<u32>::builder()
        .shared_fetch_page(strategy.clone())
        .initial_options(ListOptions::new().limit(10))
        .max_pages(2)
        .build()
        .unwrap();

    let pages: Vec<_> = PageStream::new(PaginationEngine::new(config))
        .collect()
        .await;
    assert_eq!(pages.len(), 2);
    assert_eq!(strategy.fetch_count(), 2);
}

#[tokio::test]
async fn test_fetch_all_helpers() {
    let strategy = InMemoryStrategy::new((1..=5).collect::<Vec<u32>>());
    let pages = fetch_all_pages(strategy, ListOptions::new().limit(2))
        .await
        .unwrap();
    assert_eq!(pages, vec![vec![1, 2], vec![3, 4], vec![5]]);

    let strategy = InMemoryStrategy::new((1..=5).collect::<Vec<u32>>());
    let items = fetch_all_items(strategy, ListOptions::new().limit(2))
        .await
        .unwrap();
    assert_eq!(items, vec![1, 2, 3, 4, 5]);

    let (_calls, failing) = failing_on(5, 3);
    let err = fetch_all_items(failing, ListOptions::new().limit(2))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Fetch { .. }));
}
