//! Decoded Blizzerial values.

use indexmap::IndexMap;
use serde::Serialize;

use super::varint::Integer;

/// Named fields of a decoded hash (or of one array element), in wire order.
pub type Record = IndexMap<&'static str, Value>;

/// One decoded node of a Blizzerial tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// A hash, or one element of an array.
    Record(Record),
    /// An array of elements.
    List(Vec<Record>),
    /// Any of the integer encodings.
    Integer(Integer),
    /// A string decoded as text.
    Text(String),
    /// A string kept as raw bytes.
    Bytes(Vec<u8>),
    /// A zero-length string. Distinct from an empty string.
    Absent,
}

impl Value {
    /// Returns the nested record, if this is one.
    #[must_use]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Returns the array elements, if this is an array.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Record]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the integer, if this is one.
    #[must_use]
    pub fn as_integer(&self) -> Option<&Integer> {
        match self {
            Value::Integer(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the integer as `i64` when it is one and fits.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_integer().and_then(Integer::to_i64)
    }

    /// Returns decoded text, if this is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns raw string bytes; text values expose their UTF-8 encoding.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(bytes) => Some(bytes),
            Value::Text(text) => Some(text.as_bytes()),
            _ => None,
        }
    }

    /// Returns `true` for a zero-length string.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }
}
