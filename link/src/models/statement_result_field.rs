use serde_json::Value as JsonValue;

use super::column_type::ColumnType;
use super::field_type::FieldType;

/// Rendered form of a SQL `NULL`
pub const NULL_STRING: &str = "NULL";

/// One value of a result row.
///
/// Scalars are kept as their server-side string representation; composite
/// values nest further fields. The variant set is closed, so rendering and
/// conversion back to the wire representation are exhaustive matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementResultField {
    /// Scalar leaf, including `NULL` (`field_type == FieldType::Null`)
    Atomic { field_type: FieldType, value: String },

    Array {
        element_type: FieldType,
        values: Vec<StatementResultField>,
    },

    /// Ordered key/value pairs; duplicate keys are kept as received
    Map {
        key_type: FieldType,
        value_type: FieldType,
        entries: Vec<MapEntry>,
    },

    Row {
        element_types: Vec<FieldType>,
        values: Vec<StatementResultField>,
    },

    StructuredType {
        field_names: Vec<String>,
        field_types: Vec<FieldType>,
        values: Vec<StatementResultField>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry {
    pub key: StatementResultField,
    pub value: StatementResultField,
}

impl MapEntry {
    pub fn new(key: StatementResultField, value: StatementResultField) -> Self {
        Self { key, value }
    }
}

impl StatementResultField {
    pub fn atomic(field_type: FieldType, value: impl Into<String>) -> Self {
        StatementResultField::Atomic {
            field_type,
            value: value.into(),
        }
    }

    pub fn varchar(value: impl Into<String>) -> Self {
        Self::atomic(FieldType::Varchar, value)
    }

    pub fn null() -> Self {
        Self::atomic(FieldType::Null, NULL_STRING)
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            StatementResultField::Atomic { field_type, .. } => *field_type,
            StatementResultField::Array { .. } => FieldType::Array,
            StatementResultField::Map { .. } => FieldType::Map,
            StatementResultField::Row { .. } => FieldType::Row,
            StatementResultField::StructuredType { .. } => FieldType::StructuredType,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(
            self,
            StatementResultField::Atomic {
                field_type: FieldType::Null,
                ..
            }
        )
    }

    /// Convert back to the JSON shape the statement API uses for this value.
    ///
    /// Maps become arrays of `[key, value]` pairs; rows and structured types
    /// become positional arrays.
    pub fn to_sdk_type(&self) -> JsonValue {
        match self {
            StatementResultField::Atomic {
                field_type: FieldType::Null,
                ..
            } => JsonValue::Null,
            StatementResultField::Atomic { value, .. } => JsonValue::String(value.clone()),
            StatementResultField::Array { values, .. }
            | StatementResultField::Row { values, .. }
            | StatementResultField::StructuredType { values, .. } => {
                JsonValue::Array(values.iter().map(Self::to_sdk_type).collect())
            },
            StatementResultField::Map { entries, .. } => JsonValue::Array(
                entries
                    .iter()
                    .map(|entry| {
                        JsonValue::Array(vec![entry.key.to_sdk_type(), entry.value.to_sdk_type()])
                    })
                    .collect(),
            ),
        }
    }

    /// Build a field from its JSON wire value, guided by the column type.
    ///
    /// Values that do not have the shape the type asks for (e.g. a string in
    /// an `ARRAY` column) degrade to an atomic field holding the raw text.
    pub fn from_sdk_type(value: &JsonValue, column_type: &ColumnType) -> Self {
        if value.is_null() {
            return Self::null();
        }

        match column_type.type_name {
            FieldType::Array => match value.as_array() {
                Some(items) => {
                    let element = column_type.element();
                    StatementResultField::Array {
                        element_type: element.type_name,
                        values: items.iter().map(|v| Self::from_sdk_type(v, &element)).collect(),
                    }
                },
                None => Self::raw(column_type.type_name, value),
            },
            FieldType::Map | FieldType::Multiset => {
                let key = column_type.key();
                let val = column_type.value();
                let entries = match value {
                    JsonValue::Array(pairs) => pairs
                        .iter()
                        .filter_map(|pair| match pair.as_array().map(|p| p.as_slice()) {
                            Some([k, v]) => Some(MapEntry::new(
                                Self::from_sdk_type(k, &key),
                                Self::from_sdk_type(v, &val),
                            )),
                            _ => None,
                        })
                        .collect(),
                    JsonValue::Object(map) => map
                        .iter()
                        .map(|(k, v)| {
                            MapEntry::new(
                                Self::from_sdk_type(&JsonValue::String(k.clone()), &key),
                                Self::from_sdk_type(v, &val),
                            )
                        })
                        .collect(),
                    other => return Self::raw(column_type.type_name, other),
                };
                StatementResultField::Map {
                    key_type: key.type_name,
                    value_type: val.type_name,
                    entries,
                }
            },
            FieldType::Row | FieldType::StructuredType => {
                let fields = column_type.row_fields();
                let values: Vec<StatementResultField> = match value {
                    JsonValue::Array(items) => items
                        .iter()
                        .enumerate()
                        .map(|(idx, item)| {
                            let item_type = fields
                                .get(idx)
                                .map(|f| f.field_type.clone())
                                .unwrap_or_else(|| ColumnType::scalar(FieldType::Unknown));
                            Self::from_sdk_type(item, &item_type)
                        })
                        .collect(),
                    JsonValue::Object(map) => fields
                        .iter()
                        .map(|f| {
                            map.get(&f.name)
                                .map(|item| Self::from_sdk_type(item, &f.field_type))
                                .unwrap_or_else(Self::null)
                        })
                        .collect(),
                    other => return Self::raw(column_type.type_name, other),
                };
                let element_types = values.iter().map(|v| v.field_type()).collect();

                if column_type.type_name == FieldType::Row {
                    StatementResultField::Row {
                        element_types,
                        values,
                    }
                } else {
                    let mut field_names: Vec<String> = fields.iter().map(|f| f.name.clone()).collect();
                    field_names.resize_with(values.len(), String::new);
                    StatementResultField::StructuredType {
                        field_names,
                        field_types: element_types,
                        values,
                    }
                }
            },
            scalar => Self::raw(scalar, value),
        }
    }

    fn raw(field_type: FieldType, value: &JsonValue) -> Self {
        let text = match value {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        };
        Self::atomic(field_type, text)
    }
}

fn join_fields<'a>(
    f: &mut std::fmt::Formatter<'_>,
    items: impl Iterator<Item = (Option<&'a str>, &'a StatementResultField)>,
) -> std::fmt::Result {
    for (idx, (label, item)) in items.enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        if let Some(label) = label {
            write!(f, "{}=", label)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl std::fmt::Display for StatementResultField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatementResultField::Atomic { value, .. } => f.write_str(value),
            StatementResultField::Array { values, .. } => {
                f.write_str("[")?;
                join_fields(f, values.iter().map(|v| (None, v)))?;
                f.write_str("]")
            },
            StatementResultField::Map { entries, .. } => {
                f.write_str("{")?;
                for (idx, entry) in entries.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", entry.key, entry.value)?;
                }
                f.write_str("}")
            },
            StatementResultField::Row { values, .. } => {
                f.write_str("(")?;
                join_fields(f, values.iter().map(|v| (None, v)))?;
                f.write_str(")")
            },
            StatementResultField::StructuredType {
                field_names,
                values,
                ..
            } => {
                f.write_str("(")?;
                join_fields(
                    f,
                    field_names.iter().map(|n| Some(n.as_str())).zip(values.iter()),
                )?;
                f.write_str(")")
            },
        }
    }
}
