//! Schema-less rows.
//!
//! Column sets are only known at runtime, so rows are ordered
//! `(column, value)` pairs rather than fixed records. Order is the store's
//! native column order and is preserved through rendering and serialization.

use rusqlite::types::ValueRef;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<ValueRef<'_>> for ScalarValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => ScalarValue::Null,
            ValueRef::Integer(i) => ScalarValue::Integer(i),
            ValueRef::Real(f) => ScalarValue::Real(f),
            ValueRef::Text(t) => ScalarValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => ScalarValue::Blob(b.to_vec()),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Text(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Real(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Integer(value)
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "NULL"),
            ScalarValue::Integer(i) => write!(f, "{}", i),
            ScalarValue::Real(r) => write!(f, "{}", r),
            ScalarValue::Text(t) => write!(f, "{}", t),
            ScalarValue::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl Serialize for ScalarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScalarValue::Null => serializer.serialize_none(),
            ScalarValue::Integer(i) => serializer.serialize_i64(*i),
            ScalarValue::Real(r) => serializer.serialize_f64(*r),
            ScalarValue::Text(t) => serializer.serialize_str(t),
            ScalarValue::Blob(b) => serializer.serialize_bytes(b),
        }
    }
}

/// One result row, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, ScalarValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<ScalarValue>) {
        self.cells.push((column.into(), value.into()));
    }

    /// Builder form of [`Row::push`], handy in tests and fixtures.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        self.push(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&ScalarValue> {
        self.cells.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScalarValue)> {
        self.cells.iter().map(|(c, v)| (c.as_str(), v))
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .cells
            .iter()
            .map(|(c, v)| format!("{}: {}", c, v))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}", rendered)
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (column, value) in &self.cells {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Rows returned by one executed query. An empty `rows` means the query ran
/// and matched nothing; "not executed" is modelled by the absence of a
/// `QueryResult` altogether.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub rows: Vec<Row>,
    /// Set when the executor stopped at its row cap
    pub truncated: bool,
}

impl QueryResult {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            truncated: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
