use super::column_type::ColumnSchema;
use super::statement_phase::StatementPhase;
use super::statement_result_row::StatementResultRow;

/// Client-side snapshot of a statement and its latest result page.
///
/// The identity (`statement_name`, `statement`) never changes; every
/// successful call against the store returns a new snapshot that replaces the
/// previous one as a whole.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessedStatement {
    /// Server-assigned statement name
    pub statement_name: String,

    /// SQL text as submitted
    pub statement: String,

    pub status: StatementPhase,

    /// Human-readable status detail (failure reason, progress note)
    pub status_detail: Option<String>,

    /// Cursor for the next result page; empty once all pages were read
    pub page_token: String,

    /// Output columns; empty for statements without a result set
    pub result_schema: Vec<ColumnSchema>,

    /// Rows of the page fetched last
    pub statement_results: Option<StatementResults>,

    pub traits: StatementTraits,
}

/// One page of result rows together with its column headers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatementResults {
    pub headers: Vec<String>,
    pub rows: Vec<StatementResultRow>,
}

/// Server-declared properties of a statement's result
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatementTraits {
    /// Field indices that identify a row for upsert compaction
    pub upsert_columns: Option<Vec<usize>>,

    /// Result only ever contains inserts
    pub is_append_only: bool,

    /// Result has a finite number of rows
    pub is_bounded: bool,
}

impl ProcessedStatement {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn has_more_pages(&self) -> bool {
        !self.page_token.is_empty()
    }

    pub fn has_result_schema(&self) -> bool {
        !self.result_schema.is_empty()
    }

    /// Column headers, taken from the schema or else from the last page
    pub fn headers(&self) -> Vec<String> {
        if !self.result_schema.is_empty() {
            return self.result_schema.iter().map(|c| c.name.clone()).collect();
        }
        self.statement_results
            .as_ref()
            .map(|r| r.headers.clone())
            .unwrap_or_default()
    }

    pub fn rows(&self) -> &[StatementResultRow] {
        self.statement_results
            .as_ref()
            .map(|r| r.rows.as_slice())
            .unwrap_or(&[])
    }

    pub fn upsert_columns(&self) -> Option<&[usize]> {
        self.traits.upsert_columns.as_deref()
    }

    pub fn status_detail(&self) -> &str {
        self.status_detail.as_deref().unwrap_or("")
    }
}
