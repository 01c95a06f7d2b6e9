//! Integration tests for the paged result fetcher
//!
//! These tests validate:
//! - Initial state derived from the first snapshot
//! - Manual single-step fetching and upsert compaction across pages
//! - Failure reporting and recovery
//! - Background auto-refresh, pausing and the refresh callback
//! - One page fetch in flight at a time, and pauses issued mid-fetch
//! - Closing a fetcher whose statement still runs

mod common;
use common::*;

use std::sync::Arc;
use std::time::Duration;
use strata_cli::{FetchState, ResultFetcher};
use strata_link::{StatementError, StatementPhase, StatementResultOperation};

const FAST_REFRESH: Duration = Duration::from_millis(10);

fn values(rows: &[strata_link::StatementResultRow]) -> Vec<Vec<String>> {
    rows.iter().map(|row| row.field_strings()).collect()
}

#[tokio::test]
async fn test_init_without_more_pages_is_completed() {
    let store = Arc::new(MockStore::new());
    let statement = snapshot(StatementPhase::Completed, "", vec![insert(1, "alice")]);

    let fetcher = ResultFetcher::init(store.clone(), statement, 10, FAST_REFRESH);
    assert_eq!(fetcher.get_refresh_state(), FetchState::Completed);
    assert_eq!(fetcher.get_materialized_statement_results().size(), 1);

    // Completed is terminal: no store call, no state change
    assert_eq!(fetcher.fetch_next_page().await, FetchState::Completed);
    fetcher.toggle_refresh();
    assert_eq!(fetcher.get_refresh_state(), FetchState::Completed);
    assert_eq!(store.fetch_calls(), 0);
}

#[tokio::test]
async fn test_manual_fetch_appends_pages_until_completed() {
    let store = Arc::new(MockStore::new());
    store.push_page(Ok(page("p2", vec![insert(2, "bob")])));
    store.push_page(Ok(page(
        "",
        vec![
            row(StatementResultOperation::UpdateBefore, 1, "alice"),
            row(StatementResultOperation::UpdateAfter, 1, "alicia"),
        ],
    )));

    let fetcher = ResultFetcher::init(
        store.clone(),
        page("p1", vec![insert(1, "alice")]),
        10,
        FAST_REFRESH,
    );
    assert_eq!(fetcher.get_refresh_state(), FetchState::Paused);

    assert_eq!(fetcher.fetch_next_page().await, FetchState::Paused);
    assert_eq!(fetcher.get_statement().page_token, "p2");

    assert_eq!(fetcher.fetch_next_page().await, FetchState::Completed);
    assert_eq!(store.fetch_calls(), 2);

    let results = fetcher.get_materialized_statement_results();
    assert_eq!(
        values(&results.get_table()),
        vec![vec!["1", "alicia"], vec!["2", "bob"]]
    );
    assert_eq!(results.get_changelog_size(), 4);
}

#[tokio::test]
async fn test_failed_fetch_keeps_error_until_next_success() {
    let store = Arc::new(MockStore::new());
    store.push_page(Err(StatementError::new("page expired")));
    store.push_page(Ok(page("", vec![insert(2, "bob")])));

    let fetcher = ResultFetcher::init(
        store.clone(),
        page("p1", vec![insert(1, "alice")]),
        10,
        FAST_REFRESH,
    );

    assert_eq!(fetcher.fetch_next_page().await, FetchState::Failed);
    let err = fetcher.get_last_error().unwrap();
    assert_eq!(err.message, "page expired");
    // The snapshot is not replaced by a failed fetch
    assert_eq!(fetcher.get_statement().page_token, "p1");

    assert_eq!(fetcher.fetch_next_page().await, FetchState::Completed);
    assert!(fetcher.get_last_error().is_none());
    assert_eq!(fetcher.get_materialized_statement_results().size(), 2);
}

#[tokio::test]
async fn test_auto_refresh_runs_to_completion_and_notifies() {
    let store = Arc::new(MockStore::new());
    store.push_page(Ok(page("p2", vec![insert(2, "bob")])));
    store.push_page(Ok(page("", vec![insert(3, "carol")])));

    let fetcher = ResultFetcher::init(
        store.clone(),
        page("p1", vec![insert(1, "alice")]),
        10,
        FAST_REFRESH,
    );
    let (tx, mut notified) = tokio::sync::mpsc::unbounded_channel();
    fetcher.set_refresh_callback(move || {
        let _ = tx.send(());
    });

    fetcher.toggle_refresh();
    assert!(fetcher.is_refresh_running());

    for _ in 0..2 {
        tokio::time::timeout(WAIT_LIMIT, notified.recv())
            .await
            .expect("refresh callback not called")
            .unwrap();
    }
    assert_eq!(fetcher.get_refresh_state(), FetchState::Completed);
    assert_eq!(fetcher.get_materialized_statement_results().size(), 3);
    assert_eq!(store.fetch_calls(), 2);
    assert!(notified.try_recv().is_err());
}

#[tokio::test]
async fn test_pausing_stops_the_refresh_loop() {
    // No scripted pages: the store keeps answering with empty pages
    let store = Arc::new(MockStore::new());
    let fetcher = ResultFetcher::init(store.clone(), page("p1", Vec::new()), 10, FAST_REFRESH);

    fetcher.toggle_refresh();
    eventually(|| store.fetch_calls() >= 2).await;
    assert!(fetcher.is_refresh_running());

    fetcher.toggle_refresh();
    assert_eq!(fetcher.get_refresh_state(), FetchState::Paused);
    let calls = store.fetch_calls();
    assert!(calls > 0);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(store.fetch_calls(), calls);
    assert_eq!(fetcher.get_refresh_state(), FetchState::Paused);
}

#[tokio::test]
async fn test_refresh_resumes_after_failure() {
    let store = Arc::new(MockStore::new());
    store.push_page(Err(StatementError::new("temporarily unavailable")));
    store.push_page(Ok(page("", vec![insert(2, "bob")])));

    let fetcher = ResultFetcher::init(store.clone(), page("p1", Vec::new()), 10, FAST_REFRESH);

    fetcher.toggle_refresh();
    // The loop ends on failure and waits for the user
    eventually(|| fetcher.get_refresh_state() == FetchState::Failed).await;
    assert_eq!(store.fetch_calls(), 1);

    fetcher.toggle_refresh();
    eventually(|| fetcher.get_refresh_state() == FetchState::Completed).await;
    assert_eq!(fetcher.get_materialized_statement_results().size(), 1);
}

#[tokio::test]
async fn test_table_mode_toggle_passes_through() {
    let store = Arc::new(MockStore::new());
    let fetcher = ResultFetcher::init(store, page("", vec![insert(1, "alice")]), 10, FAST_REFRESH);

    assert!(fetcher.is_table_mode());
    assert!(!fetcher.toggle_table_mode());
    assert!(!fetcher.get_materialized_statement_results().is_table_mode());
    assert_eq!(
        fetcher.get_materialized_statement_results().get_headers(),
        vec!["Operation", "id", "name"]
    );
}

#[tokio::test]
async fn test_close_stops_running_statement() {
    let store = Arc::new(MockStore::new());
    let fetcher = ResultFetcher::init(store.clone(), page("p1", Vec::new()), 10, FAST_REFRESH);

    fetcher.toggle_refresh();
    fetcher.close();
    assert_eq!(fetcher.get_refresh_state(), FetchState::Paused);

    eventually(|| !store.stopped().is_empty()).await;
    assert_eq!(store.stopped(), vec![STATEMENT_NAME.to_string()]);
}

#[tokio::test]
async fn test_close_leaves_finished_statement_alone() {
    let store = Arc::new(MockStore::new());
    let statement = snapshot(StatementPhase::Completed, "", Vec::new());
    let fetcher = ResultFetcher::init(store.clone(), statement, 10, FAST_REFRESH);

    fetcher.close();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(store.stopped().is_empty());
    assert_eq!(fetcher.get_refresh_state(), FetchState::Completed);
}

#[tokio::test]
async fn test_pause_during_fetch_is_kept() {
    let store = Arc::new(MockStore::new().with_gate());
    store.push_page(Ok(page("p2", vec![insert(2, "bob")])));
    let fetcher = ResultFetcher::init(store.clone(), page("p1", Vec::new()), 10, FAST_REFRESH);

    fetcher.toggle_refresh();
    store.fetch_entered().await;

    // Paused while the loop's page is still in flight
    fetcher.toggle_refresh();
    assert_eq!(fetcher.get_refresh_state(), FetchState::Paused);
    store.open_gate();

    eventually(|| fetcher.get_materialized_statement_results().size() == 1).await;
    assert_eq!(fetcher.get_refresh_state(), FetchState::Paused);
    assert_eq!(fetcher.get_statement().page_token, "p2");

    // The loop saw the pause and exited
    tokio::time::sleep(FAST_REFRESH * 5).await;
    assert_eq!(store.fetch_calls(), 1);
    assert_eq!(fetcher.get_refresh_state(), FetchState::Paused);
}

#[tokio::test]
async fn test_manual_fetch_waits_for_refresh_loop() {
    let store = Arc::new(MockStore::new().with_gate());
    store.push_page(Ok(page("", vec![insert(2, "bob")])));
    store.push_page(Ok(page("p3", vec![insert(99, "late")])));
    let fetcher = ResultFetcher::init(
        store.clone(),
        page("p1", vec![insert(1, "alice")]),
        10,
        FAST_REFRESH,
    );

    fetcher.toggle_refresh();
    store.fetch_entered().await;

    let manual = tokio::spawn({
        let fetcher = Arc::clone(&fetcher);
        async move { fetcher.fetch_next_page().await }
    });
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
    store.open_gate();

    let state = tokio::time::timeout(WAIT_LIMIT, manual)
        .await
        .expect("manual fetch did not finish")
        .unwrap();
    assert_eq!(state, FetchState::Completed);
    assert_eq!(store.fetch_calls(), 1);
    assert_eq!(store.peak_fetches_in_flight(), 1);

    // The page after the last one never reaches the results
    let results = fetcher.get_materialized_statement_results();
    assert_eq!(
        values(&results.get_table()),
        vec![vec!["1", "alice"], vec!["2", "bob"]]
    );
}
