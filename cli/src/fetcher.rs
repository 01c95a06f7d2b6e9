//! Paged result fetching with optional background auto-refresh.
//!
//! A [`ResultFetcher`] owns the latest [`ProcessedStatement`] snapshot of one
//! statement and feeds every page it fetches into a
//! [`MaterializedStatementResults`]. Its refresh state moves through
//!
//! ```text
//! Paused -> Running -> Paused | Completed | Failed
//! Failed -> Paused | Running
//! ```
//!
//! `Completed` is terminal. At most one page fetch is in flight at any time,
//! whether it was started by the refresh loop or by a manual single step.

use chrono::{DateTime, Local};
use log::{debug, warn};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use strata_link::{ProcessedStatement, StatementError, StatementPhase, Store};
use tokio::sync::Mutex;

use crate::results::MaterializedStatementResults;

/// Pause between two pages while auto-refresh is running
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Paused,
    Running,
    Completed,
    Failed,
}

impl FetchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchState::Paused => "Paused",
            FetchState::Running => "Running",
            FetchState::Completed => "Completed",
            FetchState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for FetchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Refresh state together with the time it was last written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshState {
    pub state: FetchState,
    pub timestamp: DateTime<Local>,
}

impl RefreshState {
    fn now(state: FetchState) -> Self {
        Self {
            state,
            timestamp: Local::now(),
        }
    }
}

/// Called after every page the refresh loop fetched
pub type RefreshCallback = Arc<dyn Fn() + Send + Sync>;

pub struct ResultFetcher {
    store: Arc<dyn Store>,
    statement: RwLock<ProcessedStatement>,
    refresh_state: RwLock<RefreshState>,
    materialized: Arc<MaterializedStatementResults>,
    fetch_lock: Mutex<()>,
    refresh_callback: RwLock<Option<RefreshCallback>>,
    refresh_interval: Duration,
    /// Identifies the refresh loop allowed to run; older loops exit
    refresh_generation: AtomicU64,
    last_error: RwLock<Option<StatementError>>,
}

impl ResultFetcher {
    /// Create a fetcher for `statement`.
    ///
    /// Rows already carried by the snapshot are materialized right away. The
    /// fetcher starts `Completed` when the snapshot has no further pages and
    /// `Paused` otherwise.
    pub fn init(
        store: Arc<dyn Store>,
        statement: ProcessedStatement,
        max_capacity: usize,
        refresh_interval: Duration,
    ) -> Arc<Self> {
        let materialized = MaterializedStatementResults::new(
            statement.headers(),
            max_capacity,
            statement.traits.upsert_columns.clone(),
        );
        materialized.append(statement.rows().iter().cloned());

        let initial = if statement.has_more_pages() {
            FetchState::Paused
        } else {
            FetchState::Completed
        };
        debug!(
            "[FETCHER] Init for {} with {} rows, state={}",
            statement.statement_name,
            statement.rows().len(),
            initial
        );

        Arc::new(Self {
            store,
            statement: RwLock::new(statement),
            refresh_state: RwLock::new(RefreshState::now(initial)),
            materialized: Arc::new(materialized),
            fetch_lock: Mutex::new(()),
            refresh_callback: RwLock::new(None),
            refresh_interval,
            refresh_generation: AtomicU64::new(0),
            last_error: RwLock::new(None),
        })
    }

    pub fn get_materialized_statement_results(&self) -> Arc<MaterializedStatementResults> {
        Arc::clone(&self.materialized)
    }

    pub fn get_statement(&self) -> ProcessedStatement {
        self.statement.read().clone()
    }

    pub fn get_refresh_state(&self) -> FetchState {
        self.refresh_state.read().state
    }

    pub fn get_last_refresh_timestamp(&self) -> DateTime<Local> {
        self.refresh_state.read().timestamp
    }

    /// Error of the last failed fetch; cleared by the next successful one
    pub fn get_last_error(&self) -> Option<StatementError> {
        self.last_error.read().clone()
    }

    pub fn is_refresh_running(&self) -> bool {
        self.get_refresh_state() == FetchState::Running
    }

    pub fn is_table_mode(&self) -> bool {
        self.materialized.is_table_mode()
    }

    pub fn toggle_table_mode(&self) -> bool {
        self.materialized.toggle_table_mode()
    }

    pub fn set_refresh_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.refresh_callback.write() = Some(Arc::new(callback));
    }

    /// Pause a running auto-refresh, or start one.
    ///
    /// Starting spawns a single background task on the current tokio runtime;
    /// pausing lets that task exit after the page it is working on. Nothing
    /// happens once the fetcher is `Completed`.
    pub fn toggle_refresh(self: &Arc<Self>) {
        let generation = {
            let mut refresh_state = self.refresh_state.write();
            match refresh_state.state {
                FetchState::Running => {
                    *refresh_state = RefreshState::now(FetchState::Paused);
                    debug!("[FETCHER] Auto-refresh paused");
                    return;
                },
                FetchState::Completed => return,
                FetchState::Paused | FetchState::Failed => {
                    *refresh_state = RefreshState::now(FetchState::Running);
                },
            }
            self.refresh_generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        debug!("[FETCHER] Auto-refresh started (loop {})", generation);
        let fetcher = Arc::clone(self);
        tokio::spawn(async move {
            fetcher.refresh_loop(generation).await;
        });
    }

    async fn refresh_loop(&self, generation: u64) {
        while self.is_current_loop(generation) {
            self.fetch_next_page_and_update_state().await;

            if self.get_refresh_state() != FetchState::Paused {
                self.notify_refresh();
            }
            if !self.is_current_loop(generation) {
                break;
            }
            tokio::time::sleep(self.refresh_interval).await;
        }
        debug!(
            "[FETCHER] Refresh loop {} exited in state {}",
            generation,
            self.get_refresh_state()
        );
    }

    fn is_current_loop(&self, generation: u64) -> bool {
        self.is_refresh_running() && self.refresh_generation.load(Ordering::SeqCst) == generation
    }

    fn notify_refresh(&self) {
        let callback = self.refresh_callback.read().clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    /// Fetch one page by hand and return the resulting state
    pub async fn fetch_next_page(&self) -> FetchState {
        self.fetch_next_page_and_update_state().await;
        self.get_refresh_state()
    }

    /// Fetch the page after the current snapshot and fold it into the
    /// materialized results. No-op once `Completed`.
    pub async fn fetch_next_page_and_update_state(&self) {
        let _in_flight = self.fetch_lock.lock().await;
        if self.get_refresh_state() == FetchState::Completed {
            return;
        }

        let snapshot = self.get_statement();
        match self.store.fetch_statement_results(&snapshot).await {
            Ok(next) => {
                self.materialized.append(next.rows().iter().cloned());
                let exhausted = !next.has_more_pages();
                *self.statement.write() = next;
                *self.last_error.write() = None;

                // Decided under one guard so a pause issued during the fetch sticks
                let mut refresh_state = self.refresh_state.write();
                let state = match refresh_state.state {
                    FetchState::Completed => return,
                    _ if exhausted => FetchState::Completed,
                    FetchState::Running => FetchState::Running,
                    FetchState::Paused | FetchState::Failed => FetchState::Paused,
                };
                *refresh_state = RefreshState::now(state);
            },
            Err(err) => {
                warn!(
                    "[FETCHER] Fetching results of {} failed: {}",
                    snapshot.statement_name, err
                );
                *self.last_error.write() = Some(err);
                self.set_refresh_state(FetchState::Failed);
            },
        }
    }

    fn set_refresh_state(&self, state: FetchState) {
        let mut refresh_state = self.refresh_state.write();
        if refresh_state.state == FetchState::Completed {
            return;
        }
        *refresh_state = RefreshState::now(state);
    }

    /// Stop auto-refresh and, if the statement still runs on the server,
    /// ask the store to stop it without waiting for the answer.
    pub fn close(&self) {
        {
            let mut refresh_state = self.refresh_state.write();
            if refresh_state.state == FetchState::Running {
                *refresh_state = RefreshState::now(FetchState::Paused);
            }
        }
        self.refresh_generation.fetch_add(1, Ordering::SeqCst);

        let statement = self.get_statement();
        if statement.status != StatementPhase::Running {
            return;
        }

        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(err) = store.stop_statement(&statement.statement_name).await {
                warn!(
                    "[FETCHER] Stopping {} failed: {}",
                    statement.statement_name, err
                );
            }
        });
    }
}
