//! Data models for strata-link.
//!
//! Defines the typed result model (fields, rows, statement snapshots) and the
//! request/response structures of the statement REST API.

pub mod column_type;
pub mod error_response;
pub mod field_type;
pub mod operation;
pub mod processed_statement;
pub mod results_page;
pub mod statement_phase;
pub mod statement_request;
pub mod statement_response;
pub mod statement_result_field;
pub mod statement_result_row;


pub use column_type::{ColumnSchema, ColumnType, RowFieldType};
pub use error_response::ErrorResponse;
pub use field_type::FieldType;
pub use operation::StatementResultOperation;
pub use processed_statement::{ProcessedStatement, StatementResults, StatementTraits};
pub use results_page::{PageMetadata, ResultItem, ResultsData, ResultsPageResponse};
pub use statement_phase::StatementPhase;
pub use statement_request::StatementRequest;
pub use statement_response::{
    ResultSchema, ResultTraits, StatementResponse, StatementSpec, StatementStatus,
};
pub use statement_result_field::{MapEntry, StatementResultField, NULL_STRING};
pub use statement_result_row::StatementResultRow;
