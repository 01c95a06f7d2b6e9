use serde::{Deserialize, Serialize};

use super::field_type::FieldType;

/// Type descriptor of a result column as returned in the statement schema
///
/// Composite types nest further descriptors: `element_type` for `ARRAY` and
/// `MULTISET`, `key_type`/`value_type` for `MAP`, `fields` for `ROW` and
/// `STRUCTURED_TYPE`.
///
/// # Example JSON
///
/// ```json
/// {"type": "ARRAY", "nullable": true, "element_type": {"type": "INTEGER"}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ColumnType {
    #[serde(rename = "type")]
    pub type_name: FieldType,

    #[serde(default = "default_nullable")]
    pub nullable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_type: Option<Box<ColumnType>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_type: Option<Box<ColumnType>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<Box<ColumnType>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<RowFieldType>>,
}

fn default_nullable() -> bool {
    true
}

/// Named member of a `ROW` or `STRUCTURED_TYPE`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFieldType {
    pub name: String,
    pub field_type: ColumnType,
}

/// One column of a statement result schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,

    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnType {
    pub fn scalar(type_name: FieldType) -> Self {
        Self {
            type_name,
            nullable: true,
            ..Default::default()
        }
    }

    pub fn array(element: ColumnType) -> Self {
        Self {
            element_type: Some(Box::new(element)),
            ..Self::scalar(FieldType::Array)
        }
    }

    pub fn map(key: ColumnType, value: ColumnType) -> Self {
        Self {
            key_type: Some(Box::new(key)),
            value_type: Some(Box::new(value)),
            ..Self::scalar(FieldType::Map)
        }
    }

    pub fn row(fields: Vec<RowFieldType>) -> Self {
        Self {
            fields: Some(fields),
            ..Self::scalar(FieldType::Row)
        }
    }

    pub fn structured(fields: Vec<RowFieldType>) -> Self {
        Self {
            fields: Some(fields),
            ..Self::scalar(FieldType::StructuredType)
        }
    }

    /// Element descriptor of an `ARRAY` or `MULTISET`; unknown when absent.
    pub fn element(&self) -> ColumnType {
        self.element_type
            .as_deref()
            .cloned()
            .unwrap_or_else(|| ColumnType::scalar(FieldType::Unknown))
    }

    /// Key descriptor of a `MAP`; a `MULTISET` is keyed by its element type.
    pub fn key(&self) -> ColumnType {
        match self.type_name {
            FieldType::Multiset => self.element(),
            _ => self
                .key_type
                .as_deref()
                .cloned()
                .unwrap_or_else(|| ColumnType::scalar(FieldType::Unknown)),
        }
    }

    /// Value descriptor of a `MAP`; a `MULTISET` maps elements to counts.
    pub fn value(&self) -> ColumnType {
        match self.type_name {
            FieldType::Multiset => ColumnType::scalar(FieldType::Integer),
            _ => self
                .value_type
                .as_deref()
                .cloned()
                .unwrap_or_else(|| ColumnType::scalar(FieldType::Unknown)),
        }
    }

    pub fn row_fields(&self) -> &[RowFieldType] {
        self.fields.as_deref().unwrap_or(&[])
    }
}

impl RowFieldType {
    pub fn new(name: impl Into<String>, field_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}
