use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::column_type::{ColumnSchema, ColumnType};
use super::field_type::FieldType;
use super::operation::StatementResultOperation;
use super::statement_result_field::StatementResultField;
use super::statement_result_row::StatementResultRow;

/// Body of `GET /v1/statements/{name}/results`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ResultsPageResponse {
    #[serde(default)]
    pub results: ResultsData,

    #[serde(default)]
    pub metadata: PageMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ResultsData {
    #[serde(default)]
    pub data: Vec<ResultItem>,
}

/// A single changelog event on the wire
///
/// ```json
/// {"op": 2, "row": ["alice", "42"]}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ResultItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<StatementResultOperation>,

    #[serde(default)]
    pub row: Vec<JsonValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PageMetadata {
    /// Token for the following page; absent or empty on the last page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl ResultsPageResponse {
    pub fn next_page_token(&self) -> String {
        self.metadata.next_page_token.clone().unwrap_or_default()
    }

    /// Convert the page into typed rows using the statement's result schema
    pub fn to_rows(&self, schema: &[ColumnSchema]) -> Vec<StatementResultRow> {
        let unknown = ColumnType::scalar(FieldType::Unknown);
        self.results
            .data
            .iter()
            .map(|item| {
                let fields = item
                    .row
                    .iter()
                    .enumerate()
                    .map(|(idx, value)| {
                        let column_type = schema.get(idx).map(|c| &c.column_type).unwrap_or(&unknown);
                        StatementResultField::from_sdk_type(value, column_type)
                    })
                    .collect();
                StatementResultRow::new(item.op.unwrap_or_default(), fields)
            })
            .collect()
    }
}
