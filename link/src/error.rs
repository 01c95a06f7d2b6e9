//! Error types for strata-link.
//!
//! [`StrataLinkError`] describes transport and protocol failures of the HTTP
//! client. [`StatementError`] is the typed error surfaced through the
//! [`Store`](crate::Store) capability: it keeps the HTTP-like status code of the
//! failed call so callers can special-case authorization failures.

use std::fmt;

/// Result type for strata-link operations
pub type Result<T> = std::result::Result<T, StrataLinkError>;

/// HTTP status code the server uses for expired or missing credentials.
pub const UNAUTHORIZED_STATUS: u16 = 401;

/// Errors that can occur while talking to the statement API
#[derive(Debug, Clone)]
pub enum StrataLinkError {
    /// Connection could not be established or was interrupted
    NetworkError(String),

    /// Credentials were rejected
    AuthenticationError(String),

    /// Client was configured with invalid values
    ConfigurationError(String),

    /// Request did not complete in time
    TimeoutError(String),

    /// Response body could not be decoded
    SerializationError(String),

    /// Server answered with a non-success status
    ServerError { status_code: u16, message: String },

    /// Operation was cancelled by the caller
    Cancelled,

    /// Unexpected client-side failure
    InternalError(String),
}

impl StrataLinkError {
    /// Status code of the failed HTTP call, if the failure came from the server.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            StrataLinkError::ServerError { status_code, .. } => Some(*status_code),
            StrataLinkError::AuthenticationError(_) => Some(UNAUTHORIZED_STATUS),
            _ => None,
        }
    }
}

impl fmt::Display for StrataLinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrataLinkError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            StrataLinkError::AuthenticationError(msg) => write!(f, "Authentication error: {}", msg),
            StrataLinkError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            StrataLinkError::TimeoutError(msg) => write!(f, "Timeout: {}", msg),
            StrataLinkError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            StrataLinkError::ServerError {
                status_code,
                message,
            } => write!(f, "Server error ({}): {}", status_code, message),
            StrataLinkError::Cancelled => write!(f, "Operation cancelled"),
            StrataLinkError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for StrataLinkError {}

impl From<reqwest::Error> for StrataLinkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StrataLinkError::TimeoutError(err.to_string())
        } else if err.is_decode() {
            StrataLinkError::SerializationError(err.to_string())
        } else if let Some(status) = err.status() {
            StrataLinkError::ServerError {
                status_code: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            StrataLinkError::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StrataLinkError {
    fn from(err: serde_json::Error) -> Self {
        StrataLinkError::SerializationError(err.to_string())
    }
}

/// Typed error for a statement operation.
///
/// `status_code` is set when the failure came back from the server; a code of
/// 401 means the session is no longer authorized and the application should
/// exit rather than keep prompting.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatementError {
    /// Short, user-facing description
    pub message: String,

    /// HTTP-like status code of the failed call
    pub status_code: Option<u16>,

    /// Failure detail reported by the statement itself (e.g. a SQL error)
    pub failure_message: Option<String>,
}

impl StatementError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_failure_message(mut self, failure_message: impl Into<String>) -> Self {
        self.failure_message = Some(failure_message.into());
        self
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status_code == Some(UNAUTHORIZED_STATUS)
    }
}

impl fmt::Display for StatementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(failure) = self.failure_message.as_deref() {
            if !failure.is_empty() {
                write!(f, ": {}", failure)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for StatementError {}

impl From<StrataLinkError> for StatementError {
    fn from(err: StrataLinkError) -> Self {
        let status_code = err.status_code();
        let message = match err {
            StrataLinkError::ServerError { message, .. } => message,
            other => other.to_string(),
        };
        StatementError {
            message,
            status_code,
            failure_message: None,
        }
    }
}
