//! # serde_dataset
//!
//! A streaming codec for change-tracked table snapshots.
//!
//! ## What is a change set?
//!
//! A change set is a collection of named tables in which every row carries its mutation
//! state (Added, Modified, Unchanged or Deleted) and, for Modified rows, the primary-key
//! values it had before it was edited. A receiver can replay exactly the inserts, updates
//! and deletes the sender made, even when a row's key itself changed.
//!
//! ## Key Features
//!
//! - **Lossless round trips**: row state, original keys, column kinds and nested tables
//!   survive encoding and decoding
//! - **Token streams**: codecs drive any [`TokenRead`] / [`TokenWrite`]; JSON text and an
//!   in-memory [`TokenBuffer`] are built in
//! - **Typed columns**: column kinds are inferred from the first value seen and enforced
//!   afterwards
//! - **All-or-nothing decoding**: a failed decode leaves the target untouched
//! - **Serde compatible**: [`Table`] and [`Dataset`] implement `Serialize` and
//!   `Deserialize`
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_dataset::{from_str, row, to_string, Dataset, RowState, Table};
//!
//! let mut table = Table::new("Test");
//! table.append_row(row! { "IdTest" => 2, "Name" => "X" }).unwrap();
//! table.set_primary_key(["IdTest"]).unwrap();
//! table.modify_row(0, row! { "IdTest" => 3, "Name" => "Y" }).unwrap();
//!
//! let mut dataset = Dataset::new();
//! dataset.insert(table);
//!
//! let json = to_string(&dataset).unwrap();
//! assert_eq!(
//!     json,
//!     r#"{"Test":[{"Props":{"RowState":"Modified"},"Data":{"Original":{"IdTest":2},"Current":{"IdTest":3,"Name":"Y"}}}]}"#
//! );
//!
//! let back = from_str(&json).unwrap();
//! let row = back.get("Test").unwrap().row(0).unwrap();
//! assert_eq!(row.state(), RowState::Modified);
//! assert_eq!(row.original("IdTest").and_then(|v| v.as_i64()), Some(2));
//! assert_eq!(back, dataset);
//! ```
//!
//! ### Working with Single Tables
//!
//! ```rust
//! use serde_dataset::{row, table_from_str, table_to_string, Table};
//!
//! let mut table = Table::new("Test");
//! table.insert_row(row! { "IdTest" => 4, "Name" => "A" }).unwrap();
//!
//! let json = table_to_string(&table).unwrap();
//! let back = table_from_str("Test", &json).unwrap();
//! assert_eq!(back, table);
//! ```
//!
//! ### Streaming Tokens Directly
//!
//! ```rust
//! use serde_dataset::{row, Table, TableCodec, Token, TokenBuffer, TokenRead};
//!
//! let mut table = Table::new("Test");
//! table.append_row(row! { "IdTest" => 1 }).unwrap();
//!
//! let mut buffer = TokenBuffer::new();
//! TableCodec::default().encode(&table, &mut buffer).unwrap();
//! assert_eq!(buffer.next_token().unwrap(), Some(Token::StartArray));
//! ```
//!
//! ## Format Reference
//!
//! The wire format is described in the [`format`] module.
//!
//! ## Examples
//!
//! See the `demos/` directory:
//!
//! - **`change_set.rs`** - Producing, encoding and replaying a change set
//! - **`nested_tables.rs`** - Tables nested inside cells
//!
//! Run any example with: `cargo run --example <name>`

pub mod bridge;
pub mod changes;
pub mod codec;
pub mod dataset;
pub mod de;
pub mod error;
pub mod format;
pub mod infer;
pub mod macros;
pub mod map;
pub mod options;
pub mod row;
pub mod ser;
pub mod state;
pub mod table;
pub mod token;
pub mod value;

pub use changes::Change;
pub use codec::{DatasetCodec, TableCodec};
pub use dataset::Dataset;
pub use de::JsonReader;
pub use error::{Error, ErrorKind, Result};
pub use map::ValueMap;
pub use options::{CodecOptions, WireFormat, DEFAULT_MAX_DEPTH};
pub use row::Row;
pub use ser::JsonWriter;
pub use state::RowState;
pub use table::{Column, Table};
pub use token::{Location, Scalar, Token, TokenBuffer, TokenKind, TokenRead, TokenWrite};
pub use value::{ColumnKind, ScalarKind, Value};

use std::io;

fn writer_for(options: &CodecOptions) -> JsonWriter {
    if options.pretty {
        JsonWriter::pretty(options.indent)
    } else {
        JsonWriter::new()
    }
}

fn reader_for<'a>(s: &'a str, options: &CodecOptions) -> JsonReader<'a> {
    JsonReader::from_str(s).with_timestamp_detection(options.detect_timestamps)
}

/// Encode a dataset as compact JSON.
///
/// # Examples
///
/// ```rust
/// use serde_dataset::{to_string, Dataset, Table};
///
/// let mut dataset = Dataset::new();
/// dataset.insert(Table::new("Empty"));
/// assert_eq!(to_string(&dataset).unwrap(), r#"{"Empty":[]}"#);
/// ```
///
/// # Errors
///
/// Returns an error if a cell holds a value the wire format cannot carry.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string(dataset: &Dataset) -> Result<String> {
    to_string_with_options(dataset, CodecOptions::default())
}

/// Encode a dataset as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if a cell holds a value the wire format cannot carry.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_pretty(dataset: &Dataset) -> Result<String> {
    to_string_with_options(dataset, CodecOptions::pretty())
}

/// Encode a dataset as JSON with custom options.
///
/// # Examples
///
/// ```rust
/// use serde_dataset::{row, to_string_with_options, CodecOptions, Dataset};
///
/// let mut dataset = Dataset::new();
/// dataset.table_mut("T").append_row(row! { "a" => 1, "b" => null }).unwrap();
///
/// let json = to_string_with_options(&dataset, CodecOptions::new().with_skip_nulls(true)).unwrap();
/// assert!(json.contains(r#""Current":{"a":1}"#));
/// ```
///
/// # Errors
///
/// Returns an error if a cell holds a value the wire format cannot carry.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options(dataset: &Dataset, options: CodecOptions) -> Result<String> {
    let mut writer = writer_for(&options);
    DatasetCodec::new(options).encode(dataset, &mut writer)?;
    Ok(writer.into_inner())
}

/// Encode a dataset as JSON into a writer.
///
/// # Errors
///
/// Returns an error if encoding fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W>(writer: W, dataset: &Dataset) -> Result<()>
where
    W: io::Write,
{
    to_writer_with_options(writer, dataset, CodecOptions::default())
}

/// Encode a dataset as JSON into a writer, with custom options.
///
/// # Errors
///
/// Returns an error if encoding fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer_with_options<W>(mut writer: W, dataset: &Dataset, options: CodecOptions) -> Result<()>
where
    W: io::Write,
{
    let json = to_string_with_options(dataset, options)?;
    writer
        .write_all(json.as_bytes())
        .map_err(|e| Error::io(&e.to_string()))?;
    Ok(())
}

/// Decode a dataset from JSON text.
///
/// # Errors
///
/// Returns an error if the text is not valid JSON or does not follow the wire format.
/// Errors name the table and row they occurred in.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str(s: &str) -> Result<Dataset> {
    from_str_with_options(s, CodecOptions::default())
}

/// Decode a dataset from JSON text with custom options.
///
/// # Examples
///
/// ```rust
/// use serde_dataset::{from_str_with_options, CodecOptions, RowState, WireFormat};
///
/// let json = r#"{"T":[{"RowState":"Deleted"},{"Id":5}]}"#;
/// let options = CodecOptions::new().with_wire_format(WireFormat::Legacy);
/// let dataset = from_str_with_options(json, options).unwrap();
/// assert_eq!(dataset.get("T").unwrap().row(0).unwrap().state(), RowState::Deleted);
/// ```
///
/// # Errors
///
/// Returns an error if the text is not valid JSON or does not follow the wire format.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str_with_options(s: &str, options: CodecOptions) -> Result<Dataset> {
    let mut dataset = Dataset::new();
    merge_from_str_with_options(s, &mut dataset, options)?;
    Ok(dataset)
}

/// Decode a dataset from JSON text and merge it into `dataset`.
///
/// Rows of tables that already exist are appended; new tables are added at the end. On
/// error, `dataset` is left as it was.
///
/// # Examples
///
/// ```rust
/// use serde_dataset::{merge_from_str, row, Dataset};
///
/// let mut dataset = Dataset::new();
/// dataset.table_mut("Test").append_row(row! { "IdTest" => 1 }).unwrap();
///
/// let json = r#"{"Test":[{"Props":{"RowState":"Added"},"Data":{"Original":{},"Current":{"IdTest":2}}}]}"#;
/// merge_from_str(json, &mut dataset).unwrap();
/// assert_eq!(dataset.get("Test").unwrap().len(), 2);
/// ```
///
/// # Errors
///
/// Returns an error if the text is not valid JSON or does not follow the wire format.
pub fn merge_from_str(s: &str, dataset: &mut Dataset) -> Result<()> {
    merge_from_str_with_options(s, dataset, CodecOptions::default())
}

/// Decode a dataset from JSON text with custom options and merge it into `dataset`.
///
/// # Errors
///
/// Returns an error if the text is not valid JSON or does not follow the wire format.
pub fn merge_from_str_with_options(s: &str, dataset: &mut Dataset, options: CodecOptions) -> Result<()> {
    let mut reader = reader_for(s, &options);
    let codec = DatasetCodec::new(options);
    let checkpoint = dataset.checkpoint();
    codec.decode_into(&mut reader, dataset)?;
    if let Err(e) = reader.finish() {
        dataset.rollback(checkpoint);
        return Err(e);
    }
    Ok(())
}

/// Decode a dataset from a JSON I/O stream.
///
/// # Errors
///
/// Returns an error if reading fails, or if the input is not valid JSON in the wire format.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R>(mut reader: R) -> Result<Dataset>
where
    R: io::Read,
{
    let mut string = String::new();
    reader
        .read_to_string(&mut string)
        .map_err(|e| Error::io(&e.to_string()))?;
    from_str(&string)
}

/// Decode a dataset from JSON bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid UTF-8, or not valid JSON in the wire format.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice(v: &[u8]) -> Result<Dataset> {
    let s = std::str::from_utf8(v).map_err(|e| Error::custom(e.to_string()))?;
    from_str(s)
}

/// Encode a single table as a compact JSON array of row elements.
///
/// # Errors
///
/// Returns an error if a cell holds a value the wire format cannot carry.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn table_to_string(table: &Table) -> Result<String> {
    table_to_string_with_options(table, CodecOptions::default())
}

/// Encode a single table as JSON with custom options.
///
/// # Errors
///
/// Returns an error if a cell holds a value the wire format cannot carry.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn table_to_string_with_options(table: &Table, options: CodecOptions) -> Result<String> {
    let mut writer = writer_for(&options);
    TableCodec::new(options).encode(table, &mut writer)?;
    Ok(writer.into_inner())
}

/// Decode a single table called `name` from a JSON array of row elements.
///
/// # Errors
///
/// Returns an error if the text is not valid JSON or does not follow the wire format.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn table_from_str(name: &str, s: &str) -> Result<Table> {
    table_from_str_with_options(name, s, CodecOptions::default())
}

/// Decode a single table called `name` with custom options.
///
/// # Errors
///
/// Returns an error if the text is not valid JSON or does not follow the wire format.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn table_from_str_with_options(name: &str, s: &str, options: CodecOptions) -> Result<Table> {
    let mut reader = reader_for(s, &options);
    let table = TableCodec::new(options).decode_named(name, &mut reader)?;
    reader.finish()?;
    Ok(table)
}
