use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Body of `POST /v1/statements`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StatementRequest {
    /// Client-chosen name; the server generates one when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub statement: String,

    /// Session properties applied to the statement
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, String>,
}

impl StatementRequest {
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            ..Default::default()
        }
    }
}
