//! The statement store capability consumed by the result engine.
//!
//! A [`Store`] submits statements, reports their lifecycle and hands out
//! result pages. [`StrataLinkClient`](crate::StrataLinkClient) implements it
//! over HTTP; tests implement it in memory.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::StatementError;
use crate::models::ProcessedStatement;

/// Result type of store operations
pub type StoreResult<T> = std::result::Result<T, StatementError>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Submit a statement. The returned snapshot carries the server-assigned
    /// name and an initial (usually pending) status.
    async fn process_statement(&self, statement: &str) -> StoreResult<ProcessedStatement>;

    /// Fetch the page after `statement.page_token` (the first page when the
    /// token is empty). The returned snapshot replaces `statement`; an empty
    /// `page_token` means no further pages exist.
    async fn fetch_statement_results(
        &self,
        statement: &ProcessedStatement,
    ) -> StoreResult<ProcessedStatement>;

    /// Block until the statement leaves the pending phase.
    ///
    /// When `cancel` fires the wait returns the last known snapshot; a
    /// cancelled wait is not an error.
    async fn wait_pending_statement(
        &self,
        cancel: CancellationToken,
        statement: ProcessedStatement,
    ) -> StoreResult<ProcessedStatement>;

    /// Block until the statement reaches a terminal phase, or until results
    /// of a running query can be streamed. Cancellation behaves as in
    /// [`Store::wait_pending_statement`].
    async fn wait_for_terminal_statement_state(
        &self,
        cancel: CancellationToken,
        statement: ProcessedStatement,
    ) -> StoreResult<ProcessedStatement>;

    /// Ask the server to stop a running statement.
    async fn stop_statement(&self, statement_name: &str) -> StoreResult<()>;

    /// Delete a statement and its results.
    async fn delete_statement(&self, statement_name: &str) -> StoreResult<()>;
}
