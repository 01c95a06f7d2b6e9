//! Integration tests for the statement controller
//!
//! These tests validate:
//! - Submission errors and the unauthorized exit hook
//! - Failed statements reported with their status detail
//! - Cancel keys stopping the statement during either wait and ending it there
//! - Detach returning the running statement
//! - Cleanup deleting the submitted statement

mod common;
use common::*;

use crossterm::event::KeyCode;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use strata_cli::keypress::{shared_reader, KeyBindings, NoInputReader, SharedInputReader};
use strata_cli::StatementController;
use strata_link::{StatementError, StatementPhase};

struct Harness {
    store: Arc<MockStore>,
    controller: StatementController,
    exited: Arc<AtomicBool>,
}

fn harness(store: MockStore, input: SharedInputReader) -> Harness {
    let store = Arc::new(store);
    let exited = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&exited);
    let controller = StatementController::new(
        store.clone(),
        input,
        KeyBindings::default(),
        Arc::new(move || flag.store(true, Ordering::SeqCst)),
    );
    Harness {
        store,
        controller,
        exited,
    }
}

async fn bounded<T>(future: impl Future<Output = T>) -> T {
    tokio::time::timeout(WAIT_LIMIT, future)
        .await
        .expect("controller did not finish in time")
}

#[tokio::test]
async fn test_statement_runs_to_completion() {
    let h = harness(MockStore::new(), shared_reader(NoInputReader));

    let statement = bounded(h.controller.execute_statement("SELECT 1;")).await.unwrap();
    assert_eq!(statement.status, StatementPhase::Completed);
    assert_eq!(statement.statement, "SELECT 1;");
    assert_eq!(
        h.controller.created_statement_name(),
        Some(STATEMENT_NAME.to_string())
    );
    assert!(h.store.stopped().is_empty());
    assert!(!h.exited.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_unauthorized_submit_requests_exit() {
    let store = MockStore::new()
        .with_submit_error(StatementError::new("token expired").with_status_code(401));
    let h = harness(store, shared_reader(NoInputReader));

    let err = bounded(h.controller.execute_statement("SELECT 1;"))
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert!(h.exited.load(Ordering::SeqCst));
    assert_eq!(h.controller.created_statement_name(), None);
}

#[tokio::test]
async fn test_other_submit_errors_do_not_exit() {
    let store =
        MockStore::new().with_submit_error(StatementError::new("bad request").with_status_code(400));
    let h = harness(store, shared_reader(NoInputReader));

    let err = bounded(h.controller.execute_statement("SELEC 1;"))
        .await
        .unwrap_err();
    assert_eq!(err.status_code, Some(400));
    assert!(!h.exited.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_unauthorized_wait_requests_exit() {
    let store = MockStore::new().with_terminal(WaitScript::Error(
        StatementError::new("session revoked").with_status_code(401),
    ));
    let h = harness(store, shared_reader(NoInputReader));

    assert!(bounded(h.controller.execute_statement("SELECT 1;")).await.is_err());
    assert!(h.exited.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_failed_statement_reports_status_detail() {
    let store = MockStore::new().with_pending(WaitScript::Failed("Table 'users' not found".into()));
    let h = harness(store, shared_reader(NoInputReader));

    let err = bounded(h.controller.execute_statement("SELECT * FROM users;"))
        .await
        .unwrap_err();
    assert_eq!(err.message, format!("Statement {} failed", STATEMENT_NAME));
    assert_eq!(err.failure_message.as_deref(), Some("Table 'users' not found"));
    assert!(!h.exited.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_failure_after_running_is_reported() {
    let store = MockStore::new().with_terminal(WaitScript::Failed("division by zero".into()));
    let h = harness(store, shared_reader(NoInputReader));

    let err = bounded(h.controller.execute_statement("SELECT 1/0;"))
        .await
        .unwrap_err();
    assert_eq!(err.failure_message.as_deref(), Some("division by zero"));
}

#[tokio::test]
async fn test_cancel_while_pending_stops_statement() {
    // The terminal wait would block forever, so returning proves it was skipped
    let store = MockStore::new()
        .with_pending(WaitScript::UntilCancelled)
        .with_terminal(WaitScript::UntilCancelled);
    let input = shared_reader(ScriptedInput::new(2, vec![key(KeyCode::Esc)]));
    let h = harness(store, input);

    let statement = bounded(h.controller.execute_statement("SELECT 1;")).await.unwrap();
    assert_eq!(statement.status, StatementPhase::Pending);
    assert!(h.controller.cancelled());
    assert_eq!(h.store.stopped(), vec![STATEMENT_NAME.to_string()]);
}

#[tokio::test]
async fn test_detach_is_ignored_while_pending() {
    let store = MockStore::new()
        .with_pending(WaitScript::UntilCancelled)
        .with_terminal(WaitScript::UntilCancelled);
    let input = shared_reader(ScriptedInput::new(
        2,
        vec![key(KeyCode::Enter), key(KeyCode::Char('x')), ctrl('c')],
    ));
    let h = harness(store, input);

    let statement = bounded(h.controller.execute_statement("SELECT 1;")).await.unwrap();
    assert_eq!(statement.status, StatementPhase::Pending);
    assert!(h.controller.cancelled());
    assert_eq!(h.store.stopped().len(), 1);
}

#[tokio::test]
async fn test_cancel_while_running_stops_statement() {
    let store = MockStore::new().with_terminal(WaitScript::UntilCancelled);
    let input = shared_reader(ScriptedInput::new(10, vec![ctrl('q')]));
    let h = harness(store, input);

    let statement = bounded(h.controller.execute_statement("SELECT 1;")).await.unwrap();
    assert_eq!(statement.status, StatementPhase::Running);
    assert!(h.controller.cancelled());
    assert_eq!(h.store.stopped(), vec![STATEMENT_NAME.to_string()]);
}

#[tokio::test]
async fn test_esc_while_running_returns_snapshot() {
    let store = MockStore::new().with_terminal(WaitScript::UntilCancelled);
    let input = shared_reader(ScriptedInput::new(10, vec![key(KeyCode::Esc)]));
    let h = harness(store, input);

    let result = bounded(h.controller.execute_statement("SELECT 1;")).await;
    assert!(result.is_ok());
    assert_eq!(h.store.stopped(), vec![STATEMENT_NAME.to_string()]);
}

#[tokio::test]
async fn test_detach_while_running_returns_snapshot() {
    let store = MockStore::new().with_terminal(WaitScript::UntilCancelled);
    let input = shared_reader(ScriptedInput::new(10, vec![key(KeyCode::Enter)]));
    let h = harness(store, input);

    let statement = bounded(h.controller.execute_statement("SELECT 1;")).await.unwrap();
    assert_eq!(statement.status, StatementPhase::Running);
    assert!(!h.controller.cancelled());
    assert!(h.store.stopped().is_empty());
}

#[tokio::test]
async fn test_cleanup_deletes_statement_once() {
    let h = harness(MockStore::new(), shared_reader(NoInputReader));

    bounded(h.controller.execute_statement("SELECT 1;")).await.unwrap();
    h.controller.cleanup_statement().await;
    h.controller.cleanup_statement().await;

    assert_eq!(h.store.deleted(), vec![STATEMENT_NAME.to_string()]);
    assert_eq!(h.controller.created_statement_name(), None);
}
