//! Cell values and column kinds.
//!
//! This module provides the tagged [`Value`] held in every row cell, plus the
//! [`ColumnKind`] / [`ScalarKind`] pair that fixes what a column may hold.
//!
//! ## Core Types
//!
//! - [`Value`]: null, integer, boolean, float, text, timestamp, bytes, typed array, or nested table
//! - [`ColumnKind`]: the kind a column is created with; never changes afterwards
//! - [`ScalarKind`]: the element kind of a typed-array column
//!
//! ## Creating Values
//!
//! ```rust
//! use serde_dataset::{Value, ColumnKind};
//!
//! let id = Value::from(4);
//! let name = Value::from("A");
//! let tags = Value::array(["rust", "serde"]);
//!
//! assert_eq!(id.kind(), Some(ColumnKind::Integer));
//! assert_eq!(name.as_str(), Some("A"));
//! assert!(tags.is_array());
//! assert_eq!(Value::Null.kind(), None);
//! ```

use crate::table::Table;
use crate::token::format_timestamp;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::fmt;

/// The element kind of a typed array, and the kind of every scalar column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Integer,
    Boolean,
    Float,
    Text,
    Timestamp,
    Bytes,
}

impl ScalarKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Integer => "integer",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Float => "float",
            ScalarKind::Text => "text",
            ScalarKind::Timestamp => "timestamp",
            ScalarKind::Bytes => "bytes",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of a column, fixed when the column is created.
///
/// # Examples
///
/// ```rust
/// use serde_dataset::{ColumnKind, ScalarKind};
///
/// assert_eq!(ColumnKind::Array(ScalarKind::Integer).to_string(), "array<integer>");
/// assert_eq!(ColumnKind::Table.to_string(), "table");
/// assert_eq!(ColumnKind::from(ScalarKind::Text), ColumnKind::Text);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Integer,
    Boolean,
    Float,
    Text,
    Timestamp,
    Bytes,
    Array(ScalarKind),
    Table,
}

impl ColumnKind {
    /// Returns the scalar kind for scalar columns, `None` for arrays and tables.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<ScalarKind> {
        match self {
            ColumnKind::Integer => Some(ScalarKind::Integer),
            ColumnKind::Boolean => Some(ScalarKind::Boolean),
            ColumnKind::Float => Some(ScalarKind::Float),
            ColumnKind::Text => Some(ScalarKind::Text),
            ColumnKind::Timestamp => Some(ScalarKind::Timestamp),
            ColumnKind::Bytes => Some(ScalarKind::Bytes),
            ColumnKind::Array(_) | ColumnKind::Table => None,
        }
    }

    /// Returns `true` if a value of this shape may be stored in a column of this kind.
    ///
    /// Null fits every column. Arrays must hold only nulls or elements of the array's
    /// element kind.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (ColumnKind::Array(element), Value::Array(items)) => items
                .iter()
                .all(|item| item.is_null() || item.scalar_kind() == Some(*element)),
            (ColumnKind::Table, Value::Table(_)) => true,
            (kind, value) => kind.as_scalar().is_some() && value.scalar_kind() == kind.as_scalar(),
        }
    }
}

impl From<ScalarKind> for ColumnKind {
    fn from(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Integer => ColumnKind::Integer,
            ScalarKind::Boolean => ColumnKind::Boolean,
            ScalarKind::Float => ColumnKind::Float,
            ScalarKind::Text => ColumnKind::Text,
            ScalarKind::Timestamp => ColumnKind::Timestamp,
            ScalarKind::Bytes => ColumnKind::Bytes,
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Array(element) => write!(f, "array<{}>", element),
            ColumnKind::Table => f.write_str("table"),
            scalar => match scalar.as_scalar() {
                Some(kind) => f.write_str(kind.as_str()),
                None => Ok(()),
            },
        }
    }
}

/// A single cell of a row.
///
/// `Null` is the explicit "no value" marker; every row holds a value for every column
/// of its table, so absent cells are `Null` rather than missing.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Boolean(bool),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Bytes(Vec<u8>),
    /// A homogeneous typed array; elements are scalars or nulls.
    Array(Vec<Value>),
    /// A nested table snapshot.
    Table(Box<Table>),
}

impl Value {
    /// Builds a typed array from anything convertible into values.
    pub fn array<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Array(items.into_iter().map(Into::into).collect())
    }

    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_table(&self) -> bool {
        matches!(self, Value::Table(_))
    }

    /// Returns the scalar kind of a scalar value, `None` for null, arrays and tables.
    #[must_use]
    pub const fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            Value::Integer(_) => Some(ScalarKind::Integer),
            Value::Boolean(_) => Some(ScalarKind::Boolean),
            Value::Float(_) => Some(ScalarKind::Float),
            Value::Text(_) => Some(ScalarKind::Text),
            Value::Timestamp(_) => Some(ScalarKind::Timestamp),
            Value::Bytes(_) => Some(ScalarKind::Bytes),
            Value::Null | Value::Array(_) | Value::Table(_) => None,
        }
    }

    /// Returns the column kind a column would be created with for this value.
    ///
    /// `None` for null, which carries no kind. An array's element kind comes from its
    /// first non-null element, defaulting to text.
    #[must_use]
    pub fn kind(&self) -> Option<ColumnKind> {
        match self {
            Value::Null => None,
            Value::Array(items) => Some(ColumnKind::Array(
                items
                    .iter()
                    .find_map(Value::scalar_kind)
                    .unwrap_or(ScalarKind::Text),
            )),
            Value::Table(_) => Some(ColumnKind::Table),
            scalar => scalar.scalar_kind().map(ColumnKind::from),
        }
    }

    /// Short description used in type-mismatch messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            other => other.kind().map(|k| k.to_string()).unwrap_or_default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// If the value is text, returns a reference to it. Otherwise returns `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_dataset::Value;
    ///
    /// assert_eq!(Value::from("hello").as_str(), Some("hello"));
    /// assert_eq!(Value::from(42).as_str(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(table) => Some(table),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Text(s) => write!(f, "{}", s),
            Value::Timestamp(ts) => write!(f, "{}", format_timestamp(ts)),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Array(items) => {
                write!(
                    f,
                    "[{}]",
                    items
                        .iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(",")
                )
            }
            Value::Table(table) => write!(f, "Table[{}]", table.len()),
        }
    }
}

// TryFrom implementations for extracting cells
impl TryFrom<Value> for i64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value
            .as_i64()
            .ok_or_else(|| Error::custom(format!("expected integer, found {}", value.describe())))
    }
}

impl TryFrom<Value> for f64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value
            .as_f64()
            .ok_or_else(|| Error::custom(format!("expected float, found {}", value.describe())))
    }
}

impl TryFrom<Value> for bool {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value
            .as_bool()
            .ok_or_else(|| Error::custom(format!("expected boolean, found {}", value.describe())))
    }
}

impl TryFrom<Value> for String {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(Error::custom(format!(
                "expected text, found {}",
                other.describe()
            ))),
        }
    }
}

// From implementations for building cells from primitives
impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i8> for Value {
    fn from(value: i8) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl From<Table> for Value {
    fn from(value: Table) -> Self {
        Value::Table(Box::new(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}
