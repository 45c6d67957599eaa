//! Error types for change-set encoding and decoding.
//!
//! Every decode-time failure aborts the whole table (or dataset) being read;
//! nothing partially built is handed back to the caller.
//!
//! ## Error Categories
//!
//! - **Protocol errors**: a token was present but of the wrong kind or in the wrong order
//! - **Missing fields**: `RowState`, or `Original` on a Modified row, was absent
//! - **Type mismatches**: a value conflicts with the kind already inferred for its column
//! - **Depth exceeded**: nested tables went deeper than [`CodecOptions::max_depth`]
//! - **Syntax errors**: the JSON text itself is malformed (line/column information included)
//!
//! Errors raised while reading a row are wrapped in [`Error::Context`], which records the
//! table name and row index. Use [`Error::kind`] to classify an error regardless of how many
//! context layers surround it.
//!
//! ## Examples
//!
//! ```rust
//! use serde_dataset::{from_str, ErrorKind};
//!
//! let wire = r#"{"Orders":[{"Data":{"Original":{},"Current":{}}}]}"#;
//! let err = from_str(wire).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::MissingField);
//! assert!(err.to_string().contains("Orders"));
//! ```
//!
//! [`CodecOptions::max_depth`]: crate::CodecOptions::max_depth

use crate::state::RowState;
use crate::token::Location;
use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised by the codec and its token adapters.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Malformed JSON text
    #[error("Syntax error at line {line}, column {col}: {msg}")]
    Syntax { line: usize, col: usize, msg: String },

    /// Input ended while a token was still required
    #[error("Unexpected end of input at {location}: expected {expected}")]
    UnexpectedEof { location: Location, expected: String },

    /// A token of the wrong kind, or in the wrong order
    #[error("Protocol error at {location}: expected {expected}, found {found}")]
    Protocol {
        location: Location,
        expected: String,
        found: String,
    },

    /// A required property was absent
    #[error("Missing required field '{field}'{}", location_suffix(.location))]
    MissingField {
        field: String,
        location: Option<Location>,
    },

    /// A value conflicts with the kind already established for its column
    #[error("Type mismatch in column '{column}': expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    /// Nested tables went deeper than the configured maximum
    #[error("Nesting depth exceeded: at most {max} nested table levels are allowed")]
    DepthExceeded { max: usize },

    /// A row state transition that the lifecycle does not allow
    #[error("Invalid row state transition from {from} to {to}")]
    InvalidTransition { from: RowState, to: RowState },

    #[error("Duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    #[error("Row index {index} out of range for table with {len} rows")]
    RowOutOfRange { index: usize, len: usize },

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),

    /// An error raised while reading a specific table (and row)
    #[error("in table '{table}'{}: {source}", row_suffix(.row))]
    Context {
        table: String,
        row: Option<usize>,
        #[source]
        source: Box<Error>,
    },
}

/// Classification of an [`Error`], looking through any [`Error::Context`] layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Syntax,
    UnexpectedEof,
    Protocol,
    MissingField,
    TypeMismatch,
    DepthExceeded,
    InvalidTransition,
    DuplicateColumn,
    UnknownColumn,
    RowOutOfRange,
    Custom,
}

fn location_suffix(location: &Option<Location>) -> String {
    location
        .map(|l| format!(" at {}", l))
        .unwrap_or_default()
}

fn row_suffix(row: &Option<usize>) -> String {
    row.map(|r| format!(", row {}", r)).unwrap_or_default()
}

impl Error {
    /// Creates a protocol error describing the expected and the actual token.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_dataset::{Error, Location};
    ///
    /// let err = Error::protocol(Location::Token(3), "StartObject", "EndArray");
    /// assert!(err.to_string().contains("expected StartObject"));
    /// ```
    pub fn protocol(location: Location, expected: &str, found: &str) -> Self {
        Error::Protocol {
            location,
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Creates a missing-field error for a property the wire format requires.
    pub fn missing_field(field: &str, location: Option<Location>) -> Self {
        Error::MissingField {
            field: field.to_string(),
            location,
        }
    }

    /// Creates a type mismatch error for a column whose kind is already fixed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_dataset::Error;
    ///
    /// let err = Error::type_mismatch("IdTest", "integer", "text");
    /// assert!(err.to_string().contains("expected integer"));
    /// ```
    pub fn type_mismatch(column: &str, expected: &str, found: &str) -> Self {
        Error::TypeMismatch {
            column: column.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub fn syntax(line: usize, col: usize, msg: &str) -> Self {
        Error::Syntax {
            line,
            col,
            msg: msg.to_string(),
        }
    }

    pub fn unexpected_eof(location: Location, expected: &str) -> Self {
        Error::UnexpectedEof {
            location,
            expected: expected.to_string(),
        }
    }

    pub fn depth_exceeded(max: usize) -> Self {
        Error::DepthExceeded { max }
    }

    pub fn invalid_transition(from: RowState, to: RowState) -> Self {
        Error::InvalidTransition { from, to }
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for reader/writer failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Wraps this error with the table (and row) it was raised in.
    #[must_use]
    pub fn in_table(self, table: &str, row: Option<usize>) -> Self {
        Error::Context {
            table: table.to_string(),
            row,
            source: Box::new(self),
        }
    }

    /// Returns the classification of the innermost error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_dataset::{Error, ErrorKind};
    ///
    /// let err = Error::depth_exceeded(4).in_table("Orders", Some(0));
    /// assert_eq!(err.kind(), ErrorKind::DepthExceeded);
    /// ```
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::Syntax { .. } => ErrorKind::Syntax,
            Error::UnexpectedEof { .. } => ErrorKind::UnexpectedEof,
            Error::Protocol { .. } => ErrorKind::Protocol,
            Error::MissingField { .. } => ErrorKind::MissingField,
            Error::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Error::DepthExceeded { .. } => ErrorKind::DepthExceeded,
            Error::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Error::DuplicateColumn(_) => ErrorKind::DuplicateColumn,
            Error::UnknownColumn(_) => ErrorKind::UnknownColumn,
            Error::RowOutOfRange { .. } => ErrorKind::RowOutOfRange,
            Error::Custom(_) => ErrorKind::Custom,
            Error::Context { source, .. } => source.kind(),
        }
    }

    /// Returns the innermost error, skipping context layers.
    #[must_use]
    pub fn root(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_display_includes_table_and_row() {
        let err = Error::type_mismatch("Price", "float", "text").in_table("Items", Some(2));
        let msg = err.to_string();
        assert!(msg.contains("in table 'Items', row 2"));
        assert!(msg.contains("column 'Price'"));
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_nested_context_resolves_root() {
        let err = Error::missing_field("RowState", Some(Location::Text { line: 1, column: 4 }))
            .in_table("Lines", Some(0))
            .in_table("Orders", Some(1));
        assert_eq!(err.kind(), ErrorKind::MissingField);
        assert!(matches!(err.root(), Error::MissingField { .. }));
        assert!(err.to_string().contains("line 1, column 4"));
    }

    #[test]
    fn test_missing_field_without_location() {
        let err = Error::missing_field("IdTest", None);
        assert_eq!(err.to_string(), "Missing required field 'IdTest'");
    }
}
