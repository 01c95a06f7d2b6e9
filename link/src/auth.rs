//! Authentication provider for the statement API.
//!
//! Handles bearer tokens and HTTP Basic Auth, attaching appropriate headers to HTTP requests.

use base64::{engine::general_purpose, Engine as _};

/// Authentication credentials for the Strata server.
///
/// # Examples
///
/// ```rust
/// use strata_link::AuthProvider;
///
/// let auth = AuthProvider::basic_auth("username".to_string(), "password".to_string());
/// let auth = AuthProvider::bearer_token("eyJhbGc...".to_string());
/// let auth = AuthProvider::none();
/// ```
#[derive(Debug, Clone)]
pub enum AuthProvider {
    /// HTTP Basic Auth (username, password)
    BasicAuth(String, String),

    /// Bearer token (API key or JWT)
    BearerToken(String),

    /// No authentication (local development servers)
    None,
}

impl AuthProvider {
    pub fn basic_auth(username: String, password: String) -> Self {
        Self::BasicAuth(username, password)
    }

    pub fn bearer_token(token: String) -> Self {
        Self::BearerToken(token)
    }

    pub fn none() -> Self {
        Self::None
    }

    /// Attach authentication headers to an HTTP request builder
    ///
    /// - BasicAuth: `Authorization: Basic <base64(username:password)>`
    /// - BearerToken: `Authorization: Bearer <token>`
    /// - None: No headers
    pub fn apply_to_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::BasicAuth(username, password) => {
                request.header("Authorization", Self::basic_header_value(username, password))
            },
            Self::BearerToken(token) => request.bearer_auth(token),
            Self::None => request,
        }
    }

    fn basic_header_value(username: &str, password: &str) -> String {
        let credentials = format!("{}:{}", username, password);
        format!("Basic {}", general_purpose::STANDARD.encode(credentials.as_bytes()))
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::None)
    }
}
