//! Error types for strata-cli
//!
//! Provides user-friendly error messages and context for common CLI failures.

use std::fmt;
use strata_link::{StatementError, StrataLinkError, UNAUTHORIZED_STATUS};

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CLIError>;

/// Errors that can occur in the CLI
#[derive(Debug)]
pub enum CLIError {
    /// Statement could not be submitted, waited on or fetched
    Statement(StatementError),

    /// Client could not be built or reached
    LinkError(StrataLinkError),

    /// Configuration file error
    ConfigurationError(String),

    /// File I/O error
    FileError(String),

    /// Invalid command syntax
    ParseError(String),

    /// User cancelled operation
    Cancelled,

    /// Readline error
    ReadlineError(String),

    /// Format error
    FormatError(String),

    /// Logging could not be initialized
    LoggingError(String),
}

impl CLIError {
    /// Whether the server rejected the session's credentials
    pub fn is_unauthorized(&self) -> bool {
        match self {
            CLIError::Statement(err) => err.is_unauthorized(),
            CLIError::LinkError(err) => err.status_code() == Some(UNAUTHORIZED_STATUS),
            _ => false,
        }
    }

    fn clean_nested_message(message: &str) -> String {
        let mut cleaned = message.trim();
        let prefixes = [
            "Connection failed:",
            "connection failed:",
            "Network error:",
            "network error:",
        ];

        while let Some(rest) = prefixes.iter().find_map(|prefix| cleaned.strip_prefix(prefix)) {
            cleaned = rest.trim_start();
        }

        cleaned.to_string()
    }
}

impl fmt::Display for CLIError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CLIError::Statement(e) => write!(f, "{}", e),
            CLIError::LinkError(StrataLinkError::NetworkError(msg)) => {
                write!(f, "{}", Self::clean_nested_message(msg))
            },
            CLIError::LinkError(e) => write!(f, "{}", e),
            CLIError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            CLIError::FileError(msg) => write!(f, "File error: {}", msg),
            CLIError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            CLIError::Cancelled => write!(f, "Operation cancelled"),
            CLIError::ReadlineError(msg) => write!(f, "Input error: {}", msg),
            CLIError::FormatError(msg) => write!(f, "Format error: {}", msg),
            CLIError::LoggingError(msg) => write!(f, "Logging error: {}", msg),
        }
    }
}

impl std::error::Error for CLIError {}

impl From<StatementError> for CLIError {
    fn from(err: StatementError) -> Self {
        CLIError::Statement(err)
    }
}

impl From<StrataLinkError> for CLIError {
    fn from(err: StrataLinkError) -> Self {
        CLIError::LinkError(err)
    }
}

impl From<rustyline::error::ReadlineError> for CLIError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        match err {
            rustyline::error::ReadlineError::Interrupted => CLIError::Cancelled,
            rustyline::error::ReadlineError::Eof => CLIError::Cancelled,
            e => CLIError::ReadlineError(e.to_string()),
        }
    }
}

impl From<std::io::Error> for CLIError {
    fn from(err: std::io::Error) -> Self {
        CLIError::FileError(err.to_string())
    }
}

impl From<toml::de::Error> for CLIError {
    fn from(err: toml::de::Error) -> Self {
        CLIError::ConfigurationError(format!("TOML parse error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CLIError::ConfigurationError("bad url".into());
        assert_eq!(err.to_string(), "Configuration error: bad url");

        let err = CLIError::Cancelled;
        assert_eq!(err.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_network_error_prefixes_are_stripped() {
        let err = CLIError::LinkError(StrataLinkError::NetworkError(
            "Connection failed: connection refused".into(),
        ));
        assert_eq!(err.to_string(), "connection refused");
    }

    #[test]
    fn test_unauthorized_detection() {
        let err: CLIError = StatementError::new("expired").with_status_code(401).into();
        assert!(err.is_unauthorized());

        let err: CLIError = StrataLinkError::AuthenticationError("bad".into()).into();
        assert!(err.is_unauthorized());

        assert!(!CLIError::Cancelled.is_unauthorized());
    }
}
