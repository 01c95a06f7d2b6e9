//! Common utilities for strata-cli integration tests
//!
//! An in-memory [`MockStore`] with scripted statement phases and result pages,
//! and a [`ScriptedInput`] that "types" keys after a number of idle polls.
//! A gated store holds every page fetch until [`MockStore::open_gate`], which
//! lets tests act while a fetch is in flight.

#![allow(dead_code)]

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use strata_cli::keypress::InputReader;
use tokio::sync::Notify;
use strata_link::{
    ColumnSchema, ColumnType, FieldType, ProcessedStatement, StatementError, StatementPhase,
    StatementResultField, StatementResultOperation, StatementResultRow, StatementResults, Store,
    StoreResult,
};
use tokio_util::sync::CancellationToken;

pub const STATEMENT_NAME: &str = "stmt-1";

/// Upper bound for anything a test waits on
pub const WAIT_LIMIT: Duration = Duration::from_secs(5);

/// Poll `condition` until it holds; panics after [`WAIT_LIMIT`]
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(WAIT_LIMIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// How a scripted wait ends
#[derive(Debug, Clone)]
pub enum WaitScript {
    /// Return the statement moved to this phase
    Phase(StatementPhase),
    /// Return the statement as failed with the given detail
    Failed(String),
    /// Return this error
    Error(StatementError),
    /// Block until the wait is cancelled, then return the statement unchanged
    UntilCancelled,
}

pub struct MockStore {
    submit: Mutex<Option<StoreResult<ProcessedStatement>>>,
    pending: Mutex<WaitScript>,
    terminal: Mutex<WaitScript>,
    pages: Mutex<VecDeque<StoreResult<ProcessedStatement>>>,
    fetch_calls: AtomicUsize,
    gate: Mutex<Option<Arc<Notify>>>,
    fetch_entered: Notify,
    fetches_in_flight: AtomicUsize,
    peak_fetches_in_flight: AtomicUsize,
    stopped: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            submit: Mutex::new(None),
            pending: Mutex::new(WaitScript::Phase(StatementPhase::Running)),
            terminal: Mutex::new(WaitScript::Phase(StatementPhase::Completed)),
            pages: Mutex::new(VecDeque::new()),
            fetch_calls: AtomicUsize::new(0),
            gate: Mutex::new(None),
            fetch_entered: Notify::new(),
            fetches_in_flight: AtomicUsize::new(0),
            peak_fetches_in_flight: AtomicUsize::new(0),
            stopped: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub fn with_submit_error(self, err: StatementError) -> Self {
        *self.submit.lock() = Some(Err(err));
        self
    }

    pub fn with_pending(self, script: WaitScript) -> Self {
        *self.pending.lock() = script;
        self
    }

    pub fn with_terminal(self, script: WaitScript) -> Self {
        *self.terminal.lock() = script;
        self
    }

    /// Hold every page fetch until [`open_gate`](Self::open_gate)
    pub fn with_gate(self) -> Self {
        *self.gate.lock() = Some(Arc::new(Notify::new()));
        self
    }

    /// Release held fetches; later fetches pass straight through
    pub fn open_gate(&self) {
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.notify_waiters();
            gate.notify_one();
        }
    }

    /// Resolves once a page fetch has reached the store
    pub async fn fetch_entered(&self) {
        tokio::time::timeout(WAIT_LIMIT, self.fetch_entered.notified())
            .await
            .expect("no page fetch reached the store");
    }

    /// Most page fetches ever inside the store at the same time
    pub fn peak_fetches_in_flight(&self) -> usize {
        self.peak_fetches_in_flight.load(Ordering::SeqCst)
    }

    pub fn push_page(&self, page: StoreResult<ProcessedStatement>) {
        self.pages.lock().push_back(page);
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> Vec<String> {
        self.stopped.lock().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().clone()
    }

    async fn run_wait(
        script: WaitScript,
        cancel: CancellationToken,
        mut statement: ProcessedStatement,
    ) -> StoreResult<ProcessedStatement> {
        match script {
            WaitScript::Phase(phase) => {
                statement.status = phase;
                Ok(statement)
            },
            WaitScript::Failed(detail) => {
                statement.status = StatementPhase::Failed;
                statement.status_detail = Some(detail);
                Ok(statement)
            },
            WaitScript::Error(err) => Err(err),
            WaitScript::UntilCancelled => {
                cancel.cancelled().await;
                Ok(statement)
            },
        }
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MockStore {
    async fn process_statement(&self, statement: &str) -> StoreResult<ProcessedStatement> {
        if let Some(result) = self.submit.lock().take() {
            return result;
        }
        let mut submitted = snapshot(StatementPhase::Pending, "", Vec::new());
        submitted.statement = statement.to_string();
        submitted.statement_results = None;
        Ok(submitted)
    }

    async fn fetch_statement_results(
        &self,
        statement: &ProcessedStatement,
    ) -> StoreResult<ProcessedStatement> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.fetches_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_fetches_in_flight
            .fetch_max(in_flight, Ordering::SeqCst);
        self.fetch_entered.notify_one();

        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let next = self.pages.lock().pop_front();
        self.fetches_in_flight.fetch_sub(1, Ordering::SeqCst);
        match next {
            Some(page) => page,
            // Nothing new on the server yet
            None => Ok(snapshot(statement.status, &statement.page_token, Vec::new())),
        }
    }

    async fn wait_pending_statement(
        &self,
        cancel: CancellationToken,
        statement: ProcessedStatement,
    ) -> StoreResult<ProcessedStatement> {
        let script = self.pending.lock().clone();
        Self::run_wait(script, cancel, statement).await
    }

    async fn wait_for_terminal_statement_state(
        &self,
        cancel: CancellationToken,
        statement: ProcessedStatement,
    ) -> StoreResult<ProcessedStatement> {
        let script = self.terminal.lock().clone();
        Self::run_wait(script, cancel, statement).await
    }

    async fn stop_statement(&self, statement_name: &str) -> StoreResult<()> {
        self.stopped.lock().push(statement_name.to_string());
        Ok(())
    }

    async fn delete_statement(&self, statement_name: &str) -> StoreResult<()> {
        self.deleted.lock().push(statement_name.to_string());
        Ok(())
    }
}

/// Snapshot of [`STATEMENT_NAME`] with an `(id, name)` schema keyed on `id`
pub fn snapshot(
    status: StatementPhase,
    page_token: &str,
    rows: Vec<StatementResultRow>,
) -> ProcessedStatement {
    ProcessedStatement {
        statement_name: STATEMENT_NAME.to_string(),
        statement: "SELECT id, name FROM users;".to_string(),
        status,
        status_detail: None,
        page_token: page_token.to_string(),
        result_schema: vec![
            ColumnSchema::new("id", ColumnType::scalar(FieldType::Integer)),
            ColumnSchema::new("name", ColumnType::scalar(FieldType::Varchar)),
        ],
        statement_results: Some(StatementResults {
            headers: vec!["id".to_string(), "name".to_string()],
            rows,
        }),
        traits: strata_link::StatementTraits {
            upsert_columns: Some(vec![0]),
            is_append_only: false,
            is_bounded: false,
        },
    }
}

/// A running statement's page; an empty `page_token` marks the last page
pub fn page(page_token: &str, rows: Vec<StatementResultRow>) -> ProcessedStatement {
    snapshot(StatementPhase::Running, page_token, rows)
}

pub fn row(operation: StatementResultOperation, id: i64, name: &str) -> StatementResultRow {
    StatementResultRow::new(
        operation,
        vec![
            StatementResultField::atomic(FieldType::Integer, id.to_string()),
            StatementResultField::varchar(name),
        ],
    )
}

pub fn insert(id: i64, name: &str) -> StatementResultRow {
    row(StatementResultOperation::Insert, id, name)
}

pub fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

pub fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

/// Reports nothing for `idle_reads` polls, then hands out `keys` in order
pub struct ScriptedInput {
    idle_reads: usize,
    keys: VecDeque<KeyEvent>,
    started: Arc<AtomicUsize>,
}

impl ScriptedInput {
    pub fn new(idle_reads: usize, keys: Vec<KeyEvent>) -> Self {
        Self {
            idle_reads,
            keys: keys.into(),
            started: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Counter of `start` calls, shared with the reader
    pub fn start_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.started)
    }
}

impl InputReader for ScriptedInput {
    fn start(&mut self) -> io::Result<()> {
        self.started.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn read_key(&mut self) -> io::Result<Option<KeyEvent>> {
        if self.idle_reads > 0 {
            self.idle_reads -= 1;
            return Ok(None);
        }
        Ok(self.keys.pop_front())
    }
}
