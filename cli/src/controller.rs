//! Submits a statement and blocks until its results can be shown.
//!
//! [`StatementController::execute_statement`] runs three phases, the last two
//! interruptible from the keyboard:
//!
//! 1. submit the statement to the store
//! 2. wait until it leaves the pending phase (cancel keys)
//! 3. unless already terminal, wait for a terminal phase or streamable
//!    results (cancel and detach keys)
//!
//! A cancel in either wait stops the statement and ends the protocol.

use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use strata_link::{ProcessedStatement, StatementError, StatementPhase, Store, StoreResult};
use tokio_util::sync::CancellationToken;

use crate::keypress::{KeyAction, KeyBindings, KeyListener, SharedInputReader};

/// Invoked when the session is no longer authorized
pub type ExitCallback = Arc<dyn Fn() + Send + Sync>;

pub struct StatementController {
    store: Arc<dyn Store>,
    input: SharedInputReader,
    bindings: KeyBindings,
    exit_application: ExitCallback,
    created_statement_name: Mutex<Option<String>>,
    cancelled: AtomicBool,
}

impl StatementController {
    pub fn new(
        store: Arc<dyn Store>,
        input: SharedInputReader,
        bindings: KeyBindings,
        exit_application: ExitCallback,
    ) -> Self {
        Self {
            store,
            input,
            bindings,
            exit_application,
            created_statement_name: Mutex::new(None),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Whether the last [`execute_statement`](Self::execute_statement) was
    /// cancelled from the keyboard
    pub fn cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Name of the statement submitted last, if submission succeeded
    pub fn created_statement_name(&self) -> Option<String> {
        self.created_statement_name.lock().clone()
    }

    /// Run `statement_text` through submission and both waits.
    ///
    /// Returns the final snapshot. A detach or a cancel returns the snapshot
    /// as it was when waiting stopped. A cancel also asks the store to stop
    /// the statement and sets [`cancelled`](Self::cancelled).
    pub async fn execute_statement(&self, statement_text: &str) -> StoreResult<ProcessedStatement> {
        self.cancelled.store(false, Ordering::SeqCst);
        let statement = match self.store.process_statement(statement_text).await {
            Ok(statement) => statement,
            Err(err) => return Err(self.handle_error(err)),
        };
        info!(
            "[CONTROLLER] Submitted {} (status {})",
            statement.statement_name, statement.status
        );
        *self.created_statement_name.lock() = Some(statement.statement_name.clone());

        let statement = self.wait_pending(statement).await?;
        if self.cancelled() {
            return Ok(statement);
        }
        if statement.is_terminal() {
            return self.check_failed(statement);
        }

        let statement = self.wait_terminal(statement).await?;
        if self.cancelled() {
            return Ok(statement);
        }
        self.check_failed(statement)
    }

    async fn wait_pending(&self, statement: ProcessedStatement) -> StoreResult<ProcessedStatement> {
        let cancel = CancellationToken::new();
        let listener = self.listen(&[KeyAction::Cancel], &cancel);
        let result = self
            .store
            .wait_pending_statement(cancel.clone(), statement)
            .await;
        let action = listener.stop().await;
        self.finish_wait(result, action).await
    }

    async fn wait_terminal(&self, statement: ProcessedStatement) -> StoreResult<ProcessedStatement> {
        let cancel = CancellationToken::new();
        let listener = self.listen(&[KeyAction::Cancel, KeyAction::Detach], &cancel);
        let result = self
            .store
            .wait_for_terminal_statement_state(cancel.clone(), statement)
            .await;
        let action = listener.stop().await;
        self.finish_wait(result, action).await
    }

    fn listen(&self, actions: &[KeyAction], cancel: &CancellationToken) -> KeyListener {
        KeyListener::spawn(
            Arc::clone(&self.input),
            self.bindings.only(actions),
            cancel.clone(),
        )
    }

    async fn finish_wait(
        &self,
        result: StoreResult<ProcessedStatement>,
        action: Option<KeyAction>,
    ) -> StoreResult<ProcessedStatement> {
        let statement = result.map_err(|err| self.handle_error(err))?;

        match action {
            Some(KeyAction::Cancel) => {
                debug!("[CONTROLLER] Wait for {} cancelled", statement.statement_name);
                self.cancelled.store(true, Ordering::SeqCst);
                if let Err(err) = self.store.stop_statement(&statement.statement_name).await {
                    warn!(
                        "[CONTROLLER] Stopping {} failed: {}",
                        statement.statement_name, err
                    );
                }
                Ok(statement)
            },
            Some(KeyAction::Detach) => {
                debug!(
                    "[CONTROLLER] Detached from {} in phase {}",
                    statement.statement_name, statement.status
                );
                Ok(statement)
            },
            None => Ok(statement),
        }
    }

    fn check_failed(&self, statement: ProcessedStatement) -> StoreResult<ProcessedStatement> {
        if statement.status != StatementPhase::Failed {
            return Ok(statement);
        }
        let mut err = StatementError::new(format!(
            "Statement {} failed",
            statement.statement_name
        ));
        if !statement.status_detail().is_empty() {
            err = err.with_failure_message(statement.status_detail());
        }
        Err(err)
    }

    fn handle_error(&self, err: StatementError) -> StatementError {
        if err.is_unauthorized() {
            warn!("[CONTROLLER] Session is no longer authorized: {}", err);
            (self.exit_application)();
        }
        err
    }

    /// Delete the statement submitted last. Failures are only logged.
    pub async fn cleanup_statement(&self) {
        let name = self.created_statement_name.lock().take();
        let Some(name) = name else {
            return;
        };
        match self.store.delete_statement(&name).await {
            Ok(()) => debug!("[CONTROLLER] Deleted statement {}", name),
            Err(err) => warn!("[CONTROLLER] Deleting statement {} failed: {}", name, err),
        }
    }
}
