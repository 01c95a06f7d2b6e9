use serde::{Deserialize, Serialize};

/// Logical SQL type of a result field
///
/// Scalar types render as a single string value; `Array`, `Map`, `Multiset`,
/// `Row` and `StructuredType` are composite and carry nested fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FieldType {
    #[serde(rename = "NULL")]
    Null,
    #[serde(rename = "CHAR")]
    Char,
    #[default]
    #[serde(rename = "VARCHAR")]
    Varchar,
    #[serde(rename = "BOOLEAN")]
    Boolean,
    #[serde(rename = "BINARY")]
    Binary,
    #[serde(rename = "VARBINARY")]
    Varbinary,
    #[serde(rename = "DECIMAL")]
    Decimal,
    #[serde(rename = "TINYINT")]
    TinyInt,
    #[serde(rename = "SMALLINT")]
    SmallInt,
    #[serde(rename = "INTEGER")]
    Integer,
    #[serde(rename = "BIGINT")]
    BigInt,
    #[serde(rename = "FLOAT")]
    Float,
    #[serde(rename = "DOUBLE")]
    Double,
    #[serde(rename = "DATE")]
    Date,
    #[serde(rename = "TIME_WITHOUT_TIME_ZONE")]
    Time,
    #[serde(rename = "TIMESTAMP_WITHOUT_TIME_ZONE")]
    Timestamp,
    #[serde(rename = "TIMESTAMP_WITH_LOCAL_TIME_ZONE")]
    TimestampLtz,
    #[serde(rename = "INTERVAL_DAY_TIME")]
    IntervalDayTime,
    #[serde(rename = "INTERVAL_YEAR_MONTH")]
    IntervalYearMonth,
    #[serde(rename = "ARRAY")]
    Array,
    #[serde(rename = "MAP")]
    Map,
    #[serde(rename = "MULTISET")]
    Multiset,
    #[serde(rename = "ROW")]
    Row,
    #[serde(rename = "STRUCTURED_TYPE")]
    StructuredType,
    /// Any type this client does not know; rendered as its raw value
    #[serde(other)]
    Unknown,
}

impl FieldType {
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            FieldType::Array
                | FieldType::Map
                | FieldType::Multiset
                | FieldType::Row
                | FieldType::StructuredType
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Null => "NULL",
            FieldType::Char => "CHAR",
            FieldType::Varchar => "VARCHAR",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Binary => "BINARY",
            FieldType::Varbinary => "VARBINARY",
            FieldType::Decimal => "DECIMAL",
            FieldType::TinyInt => "TINYINT",
            FieldType::SmallInt => "SMALLINT",
            FieldType::Integer => "INTEGER",
            FieldType::BigInt => "BIGINT",
            FieldType::Float => "FLOAT",
            FieldType::Double => "DOUBLE",
            FieldType::Date => "DATE",
            FieldType::Time => "TIME_WITHOUT_TIME_ZONE",
            FieldType::Timestamp => "TIMESTAMP_WITHOUT_TIME_ZONE",
            FieldType::TimestampLtz => "TIMESTAMP_WITH_LOCAL_TIME_ZONE",
            FieldType::IntervalDayTime => "INTERVAL_DAY_TIME",
            FieldType::IntervalYearMonth => "INTERVAL_YEAR_MONTH",
            FieldType::Array => "ARRAY",
            FieldType::Map => "MAP",
            FieldType::Multiset => "MULTISET",
            FieldType::Row => "ROW",
            FieldType::StructuredType => "STRUCTURED_TYPE",
            FieldType::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
