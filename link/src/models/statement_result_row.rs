use super::operation::StatementResultOperation;
use super::statement_result_field::StatementResultField;

/// One changelog event: a row of fields tagged with its change operation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatementResultRow {
    pub operation: StatementResultOperation,
    pub fields: Vec<StatementResultField>,
}

impl StatementResultRow {
    pub fn new(operation: StatementResultOperation, fields: Vec<StatementResultField>) -> Self {
        Self { operation, fields }
    }

    pub fn insert(fields: Vec<StatementResultField>) -> Self {
        Self::new(StatementResultOperation::Insert, fields)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Rendered string of every field, in column order
    pub fn field_strings(&self) -> Vec<String> {
        self.fields.iter().map(|field| field.to_string()).collect()
    }
}
