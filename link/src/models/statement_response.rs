use serde::{Deserialize, Serialize};

use super::column_type::ColumnSchema;
use super::processed_statement::{ProcessedStatement, StatementTraits};
use super::statement_phase::StatementPhase;

/// Statement resource as returned by `POST /v1/statements` and
/// `GET /v1/statements/{name}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatementResponse {
    pub name: String,

    #[serde(default)]
    pub spec: StatementSpec,

    #[serde(default)]
    pub status: StatementStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StatementSpec {
    #[serde(default)]
    pub statement: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StatementStatus {
    #[serde(default)]
    pub phase: StatementPhase,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traits: Option<ResultTraits>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ResultTraits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<ResultSchema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upsert_columns: Option<Vec<usize>>,

    #[serde(default)]
    pub is_append_only: bool,

    #[serde(default)]
    pub is_bounded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ResultSchema {
    #[serde(default)]
    pub columns: Vec<ColumnSchema>,
}

impl StatementResponse {
    /// Fresh snapshot for a statement that has no fetched pages yet
    pub fn into_processed(self) -> ProcessedStatement {
        self.apply_to(&ProcessedStatement::default())
    }

    /// Snapshot carrying this response's status on top of `previous`.
    ///
    /// Page data (token and rows) is not part of the statement resource, so it
    /// is kept from `previous`.
    pub fn apply_to(self, previous: &ProcessedStatement) -> ProcessedStatement {
        let traits = self.status.traits.unwrap_or_default();
        let result_schema = traits.schema.map(|s| s.columns).unwrap_or_default();
        let statement = if self.spec.statement.is_empty() {
            previous.statement.clone()
        } else {
            self.spec.statement
        };

        ProcessedStatement {
            statement_name: self.name,
            statement,
            status: self.status.phase,
            status_detail: self.status.detail.filter(|d| !d.is_empty()),
            page_token: previous.page_token.clone(),
            result_schema,
            statement_results: previous.statement_results.clone(),
            traits: StatementTraits {
                upsert_columns: traits.upsert_columns,
                is_append_only: traits.is_append_only,
                is_bounded: traits.is_bounded,
            },
        }
    }
}
