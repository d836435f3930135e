use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Row, VitessError};

/// Column type tag as reported by the service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    /// Zero value; the service omits the key for it.
    #[default]
    NullType,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int24,
    Uint24,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float32,
    Float64,
    Timestamp,
    Date,
    Time,
    Datetime,
    Year,
    Decimal,
    Text,
    Blob,
    Varchar,
    Varbinary,
    Char,
    Binary,
    Bit,
    Enum,
    Set,
    Tuple,
    Geometry,
    Json,
    Expression,
    Hexnum,
    Hexval,
    Bitnum,
    /// Tag not known to this client version.
    Other(String),
}

static TAGS: &[(&str, FieldType)] = &[
    ("NULL_TYPE", FieldType::NullType),
    ("INT8", FieldType::Int8),
    ("UINT8", FieldType::Uint8),
    ("INT16", FieldType::Int16),
    ("UINT16", FieldType::Uint16),
    ("INT24", FieldType::Int24),
    ("UINT24", FieldType::Uint24),
    ("INT32", FieldType::Int32),
    ("UINT32", FieldType::Uint32),
    ("INT64", FieldType::Int64),
    ("UINT64", FieldType::Uint64),
    ("FLOAT32", FieldType::Float32),
    ("FLOAT64", FieldType::Float64),
    ("TIMESTAMP", FieldType::Timestamp),
    ("DATE", FieldType::Date),
    ("TIME", FieldType::Time),
    ("DATETIME", FieldType::Datetime),
    ("YEAR", FieldType::Year),
    ("DECIMAL", FieldType::Decimal),
    ("TEXT", FieldType::Text),
    ("BLOB", FieldType::Blob),
    ("VARCHAR", FieldType::Varchar),
    ("VARBINARY", FieldType::Varbinary),
    ("CHAR", FieldType::Char),
    ("BINARY", FieldType::Binary),
    ("BIT", FieldType::Bit),
    ("ENUM", FieldType::Enum),
    ("SET", FieldType::Set),
    ("TUPLE", FieldType::Tuple),
    ("GEOMETRY", FieldType::Geometry),
    ("JSON", FieldType::Json),
    ("EXPRESSION", FieldType::Expression),
    ("HEXNUM", FieldType::Hexnum),
    ("HEXVAL", FieldType::Hexval),
    ("BITNUM", FieldType::Bitnum),
];

impl FieldType {
    /// Parses a wire tag. Unknown tags are kept as [`FieldType::Other`].
    pub fn from_tag(tag: &str) -> Self {
        TAGS.iter()
            .find(|(name, _)| *name == tag)
            .map(|(_, ty)| ty.clone())
            .unwrap_or_else(|| Self::Other(tag.to_owned()))
    }

    /// Returns the wire tag.
    pub fn as_str(&self) -> &str {
        if let Self::Other(tag) = self {
            return tag;
        }
        TAGS.iter()
            .find(|(_, ty)| ty == self)
            .map(|(name, _)| *name)
            .unwrap_or_default()
    }
}

impl From<String> for FieldType {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<FieldType> for String {
    fn from(ty: FieldType) -> Self {
        ty.as_str().to_owned()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result column description.
///
/// Only `name` and `field_type` drive decoding; the origin metadata is kept
/// for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charset: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_type: Option<String>,
}

impl Field {
    /// Creates a field without origin metadata.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            table: None,
            org_table: None,
            database: None,
            org_name: None,
            column_length: None,
            charset: None,
            flags: None,
            column_type: None,
        }
    }
}

/// Outcome of [`Connection::execute`](crate::Connection::execute).
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutedQuery {
    /// Column names in declared order.
    pub headers: Vec<String>,
    /// Column name to type tag. Later duplicates win.
    pub types: BTreeMap<String, FieldType>,
    pub rows: Vec<Row>,
    /// Always `rows.len()`.
    pub size: usize,
    /// SQL text actually sent.
    pub statement: String,
    /// Kept as text to preserve full 64-bit precision.
    pub insert_id: Option<String>,
    pub rows_affected: Option<u64>,
    /// Statement-level error reported alongside a 2xx response.
    pub error: Option<VitessError>,
    /// Round trip wall time in milliseconds.
    pub time_ms: f64,
}
