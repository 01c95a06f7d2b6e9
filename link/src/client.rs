//! HTTP client for the Strata statement API, with builder pattern.
//!
//! [`StrataLinkClient`] implements [`Store`] on top of these endpoints:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | submit    | `POST   /v1/statements` |
//! | status    | `GET    /v1/statements/{name}` |
//! | results   | `GET    /v1/statements/{name}/results?page_token=..` |
//! | stop      | `POST   /v1/statements/{name}/stop` |
//! | delete    | `DELETE /v1/statements/{name}` |

use crate::{
    auth::AuthProvider,
    error::{Result, StrataLinkError},
    models::{
        ErrorResponse, ProcessedStatement, ResultsPageResponse, StatementPhase, StatementRequest,
        StatementResponse, StatementResults,
    },
    store::{Store, StoreResult},
    timeouts::StrataLinkTimeouts,
};
use async_trait::async_trait;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Statement API client.
///
/// Use [`StrataLinkClientBuilder`] to construct instances with custom configuration.
///
/// # Examples
///
/// ```rust,no_run
/// use strata_link::{Store, StrataLinkClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = StrataLinkClient::builder()
///     .base_url("http://localhost:8080")
///     .bearer_token("my-token")
///     .build()?;
///
/// let statement = client.process_statement("SELECT * FROM orders;").await?;
/// println!("Submitted {}", statement.statement_name);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct StrataLinkClient {
    base_url: String,
    http_client: reqwest::Client,
    auth: AuthProvider,
    timeouts: StrataLinkTimeouts,
    properties: HashMap<String, String>,
}

impl StrataLinkClient {
    /// Create a new builder for configuring the client
    pub fn builder() -> StrataLinkClientBuilder {
        StrataLinkClientBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeouts(&self) -> &StrataLinkTimeouts {
        &self.timeouts
    }

    fn statements_url(&self) -> String {
        format!("{}/v1/statements", self.base_url)
    }

    fn statement_url(&self, statement_name: &str) -> String {
        format!("{}/{}", self.statements_url(), statement_name)
    }

    /// Fetch the current statement resource
    pub async fn get_statement(&self, statement_name: &str) -> Result<StatementResponse> {
        let request = self.http_client.get(self.statement_url(statement_name));
        self.send_json(request).await
    }

    async fn send_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let start = Instant::now();
        let response = self.auth.apply_to_request(request).send().await?;
        debug!(
            "[LINK_HTTP] Response received: status={} duration_ms={}",
            response.status(),
            start.elapsed().as_millis()
        );
        let response = Self::check_status(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn send_empty(&self, request: reqwest::RequestBuilder) -> Result<()> {
        let response = self.auth.apply_to_request(request).send().await?;
        Self::check_status(response).await.map(|_| ())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = match serde_json::from_str::<ErrorResponse>(&error_text) {
            Ok(body) => match body.detail {
                Some(detail) if !detail.is_empty() => format!("{}: {}", body.message, detail),
                _ => body.message,
            },
            Err(_) => error_text,
        };

        warn!(
            "[LINK_HTTP] Server error: status={} message=\"{}\"",
            status.as_u16(),
            message
        );

        Err(StrataLinkError::ServerError {
            status_code: status.as_u16(),
            message,
        })
    }

    /// Poll the statement until `done` accepts it or `cancel` fires.
    async fn poll_until<F>(
        &self,
        cancel: CancellationToken,
        statement: ProcessedStatement,
        done: F,
    ) -> StoreResult<ProcessedStatement>
    where
        F: Fn(&ProcessedStatement) -> bool + Send,
    {
        let mut current = statement;
        loop {
            if done(&current) {
                return Ok(current);
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("[LINK_WAIT] Wait for {} cancelled in phase {}", current.statement_name, current.status);
                    return Ok(current);
                }
                _ = tokio::time::sleep(self.timeouts.poll_interval) => {}
            }

            let response = tokio::select! {
                _ = cancel.cancelled() => return Ok(current),
                response = self.get_statement(&current.statement_name) => response?,
            };
            current = response.apply_to(&current);
        }
    }
}

#[async_trait]
impl Store for StrataLinkClient {
    async fn process_statement(&self, statement: &str) -> StoreResult<ProcessedStatement> {
        let mut request = StatementRequest::new(statement);
        request.properties = self.properties.clone();

        debug!("[LINK_STATEMENT] Submitting statement (len={})", statement.len());
        let response: StatementResponse = self
            .send_json(self.http_client.post(self.statements_url()).json(&request))
            .await?;

        let mut processed = response.into_processed();
        if processed.statement.is_empty() {
            processed.statement = statement.to_string();
        }
        Ok(processed)
    }

    async fn fetch_statement_results(
        &self,
        statement: &ProcessedStatement,
    ) -> StoreResult<ProcessedStatement> {
        let mut request = self
            .http_client
            .get(format!("{}/results", self.statement_url(&statement.statement_name)));
        if statement.has_more_pages() {
            request = request.query(&[("page_token", statement.page_token.as_str())]);
        }

        let page: ResultsPageResponse = self.send_json(request).await?;
        let rows = page.to_rows(&statement.result_schema);
        debug!(
            "[LINK_RESULTS] Fetched {} rows for {} (more pages: {})",
            rows.len(),
            statement.statement_name,
            page.metadata.next_page_token.as_deref().is_some_and(|t| !t.is_empty())
        );

        let mut next = statement.clone();
        next.page_token = page.next_page_token();
        next.statement_results = Some(StatementResults {
            headers: statement.headers(),
            rows,
        });
        Ok(next)
    }

    async fn wait_pending_statement(
        &self,
        cancel: CancellationToken,
        statement: ProcessedStatement,
    ) -> StoreResult<ProcessedStatement> {
        self.poll_until(cancel, statement, |s| s.status != StatementPhase::Pending)
            .await
    }

    async fn wait_for_terminal_statement_state(
        &self,
        cancel: CancellationToken,
        statement: ProcessedStatement,
    ) -> StoreResult<ProcessedStatement> {
        self.poll_until(cancel, statement, |s| {
            s.is_terminal() || (s.status == StatementPhase::Running && s.has_result_schema())
        })
        .await
    }

    async fn stop_statement(&self, statement_name: &str) -> StoreResult<()> {
        let url = format!("{}/stop", self.statement_url(statement_name));
        self.send_empty(self.http_client.post(url)).await?;
        Ok(())
    }

    async fn delete_statement(&self, statement_name: &str) -> StoreResult<()> {
        self.send_empty(self.http_client.delete(self.statement_url(statement_name)))
            .await?;
        Ok(())
    }
}

/// Builder for configuring [`StrataLinkClient`] instances.
pub struct StrataLinkClientBuilder {
    base_url: Option<String>,
    auth: AuthProvider,
    timeouts: StrataLinkTimeouts,
    properties: HashMap<String, String>,
}

impl StrataLinkClientBuilder {
    fn new() -> Self {
        Self {
            base_url: None,
            auth: AuthProvider::none(),
            timeouts: StrataLinkTimeouts::default(),
            properties: HashMap::new(),
        }
    }

    /// Set the base URL of the Strata server
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthProvider::bearer_token(token.into());
        self
    }

    pub fn auth(mut self, auth: AuthProvider) -> Self {
        self.auth = auth;
        self
    }

    pub fn timeouts(mut self, timeouts: StrataLinkTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Session property sent along with every submitted statement
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<StrataLinkClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| StrataLinkError::ConfigurationError("base_url is required".into()))?;
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(StrataLinkError::ConfigurationError(
                "base_url must not be empty".into(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(self.timeouts.request_timeout)
            .connect_timeout(self.timeouts.connection_timeout)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| StrataLinkError::ConfigurationError(e.to_string()))?;

        Ok(StrataLinkClient {
            base_url,
            http_client,
            auth: self.auth,
            timeouts: self.timeouts,
            properties: self.properties,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_base_url() {
        let result = StrataLinkClient::builder().build();
        assert!(matches!(result, Err(StrataLinkError::ConfigurationError(_))));
    }

    #[test]
    fn test_statement_urls_strip_trailing_slash() {
        let client = StrataLinkClient::builder()
            .base_url("http://localhost:8080/")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(
            client.statement_url("stmt-1"),
            "http://localhost:8080/v1/statements/stmt-1"
        );
    }

    #[tokio::test]
    async fn test_cancelled_wait_returns_last_snapshot() {
        // Unroutable address: the poll would fail if it ever got past the cancel check.
        let client = StrataLinkClient::builder()
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let statement = ProcessedStatement {
            statement_name: "stmt-1".into(),
            ..Default::default()
        };

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = client
            .wait_pending_statement(cancel, statement.clone())
            .await
            .unwrap();
        assert_eq!(result, statement);
    }

    #[tokio::test]
    async fn test_wait_returns_immediately_when_already_done() {
        let client = StrataLinkClient::builder()
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let statement = ProcessedStatement {
            statement_name: "stmt-1".into(),
            status: StatementPhase::Completed,
            ..Default::default()
        };

        let result = client
            .wait_for_terminal_statement_state(CancellationToken::new(), statement.clone())
            .await
            .unwrap();
        assert_eq!(result.status, StatementPhase::Completed);
    }
}
