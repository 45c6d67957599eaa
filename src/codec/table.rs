//! The table codec: row elements in the nested `Props`/`Data` layout.

use super::{
    describe_token, expect_kind, expect_object, next_required, unexpected, CURRENT, DATA,
    ORIGINAL, PROPS, ROW_STATE,
};
use crate::row::order_original_key;
use crate::{
    CodecOptions, Error, Location, Result, Row, RowState, Scalar, Table, Token, TokenKind,
    TokenRead, TokenWrite, Value, ValueMap, WireFormat,
};

/// Encodes and decodes a single [`Table`] as an array of row elements.
///
/// # Examples
///
/// ```rust
/// use serde_dataset::{row, JsonReader, JsonWriter, Table, TableCodec};
///
/// let mut table = Table::new("Test");
/// table.insert_row(row! { "IdTest" => 4, "Name" => "A" }).unwrap();
///
/// let codec = TableCodec::default();
/// let mut writer = JsonWriter::new();
/// codec.encode(&table, &mut writer).unwrap();
/// let json = writer.into_inner();
/// assert_eq!(
///     json,
///     r#"[{"Props":{"RowState":"Added"},"Data":{"Original":{},"Current":{"IdTest":4,"Name":"A"}}}]"#
/// );
///
/// let decoded = codec.decode_named("Test", &mut JsonReader::from_str(&json)).unwrap();
/// assert_eq!(decoded, table);
/// ```
#[derive(Clone, Debug, Default)]
pub struct TableCodec {
    options: CodecOptions,
}

impl TableCodec {
    #[must_use]
    pub fn new(options: CodecOptions) -> Self {
        TableCodec { options }
    }

    #[must_use]
    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Writes `table` as an array with one element per row, in row order.
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    pub fn encode<W: TokenWrite + ?Sized>(&self, table: &Table, writer: &mut W) -> Result<()> {
        tracing::debug!(
            "encoding table '{}' ({} rows, {} columns)",
            table.name(),
            table.len(),
            table.columns().len()
        );
        self.write_rows(table, writer)
    }

    /// Reads an array of row elements into a new, unnamed table.
    ///
    /// A `null` in place of the array decodes as an empty table.
    ///
    /// # Errors
    ///
    /// Protocol, missing-field, type-mismatch and depth errors, wrapped with the table name
    /// and row index where they occurred.
    pub fn decode<R: TokenRead + ?Sized>(&self, reader: &mut R) -> Result<Table> {
        self.decode_named("", reader)
    }

    /// Reads an array of row elements into a new table called `name`.
    pub fn decode_named<R: TokenRead + ?Sized>(&self, name: &str, reader: &mut R) -> Result<Table> {
        let mut table = Table::new(name);
        self.decode_into(reader, &mut table)?;
        Ok(table)
    }

    /// Reads an array of row elements and appends the rows to `table`.
    ///
    /// Columns are reused by name and new ones are added. On error, `table` is restored to
    /// the columns, rows and primary key it had before the call.
    pub fn decode_into<R: TokenRead + ?Sized>(&self, reader: &mut R, table: &mut Table) -> Result<()> {
        let checkpoint = table.checkpoint();
        match self.read_table(reader, table) {
            Ok(()) => {
                table.seal_columns();
                Ok(())
            }
            Err(e) => {
                tracing::debug!("decoding table '{}' failed, rolling back: {}", table.name(), e);
                table.rollback(checkpoint);
                Err(e)
            }
        }
    }

    /// Reads a top-level table value (`[...]` or `null`) without any rollback.
    pub(crate) fn read_table<R: TokenRead + ?Sized>(&self, reader: &mut R, table: &mut Table) -> Result<()> {
        let before = table.len();
        match next_required(reader, "StartArray")? {
            Token::StartArray => self.read_rows(reader, table, 0)?,
            Token::Null => {}
            other => {
                let e = unexpected(reader.location(), "StartArray", &other);
                return Err(e.in_table(table.name(), None));
            }
        }
        tracing::debug!(
            "decoded {} rows into table '{}'",
            table.len() - before,
            table.name()
        );
        Ok(())
    }

    /// Reads row elements up to and including the closing `]`.
    pub(crate) fn read_rows<R: TokenRead + ?Sized>(
        &self,
        reader: &mut R,
        table: &mut Table,
        depth: usize,
    ) -> Result<()> {
        if depth > self.options.max_depth {
            return Err(Error::depth_exceeded(self.options.max_depth).in_table(table.name(), None));
        }
        loop {
            let index = table.len();
            if reader.peek()? == Some(TokenKind::EndArray) {
                reader.next_token()?;
                return Ok(());
            }
            let result = match self.options.wire_format {
                WireFormat::Nested => self.read_row(reader, table, depth),
                WireFormat::Legacy => self.read_legacy_row(reader, table, depth),
            };
            result.map_err(|e| e.in_table(table.name(), Some(index)))?;
        }
    }

    pub(crate) fn write_rows<W: TokenWrite + ?Sized>(&self, table: &Table, writer: &mut W) -> Result<()> {
        writer.write_start_array()?;
        for (index, row) in table.rows().iter().enumerate() {
            let result = match self.options.wire_format {
                WireFormat::Nested => self.write_row(row, writer),
                WireFormat::Legacy => self.write_legacy_row(row, writer),
            };
            result.map_err(|e| e.in_table(table.name(), Some(index)))?;
        }
        writer.write_end_array()
    }

    fn write_row<W: TokenWrite + ?Sized>(&self, row: &Row, writer: &mut W) -> Result<()> {
        writer.write_start_object()?;

        writer.write_property_name(PROPS)?;
        writer.write_start_object()?;
        writer.write_property_name(ROW_STATE)?;
        writer.write_value(Scalar::Text(row.state().as_str()))?;
        writer.write_end_object()?;

        writer.write_property_name(DATA)?;
        writer.write_start_object()?;
        writer.write_property_name(ORIGINAL)?;
        self.write_original_key(row, writer)?;
        writer.write_property_name(CURRENT)?;
        self.write_cells(row.current(), writer)?;
        writer.write_end_object()?;

        writer.write_end_object()
    }

    /// The original key object: filled for Modified rows, `{}` for everything else.
    pub(crate) fn write_original_key<W: TokenWrite + ?Sized>(&self, row: &Row, writer: &mut W) -> Result<()> {
        writer.write_start_object()?;
        if row.state() == RowState::Modified {
            if let Some(key) = row.original_key() {
                for (column, value) in key {
                    writer.write_property_name(column)?;
                    self.write_cell(value, writer)?;
                }
            }
        }
        writer.write_end_object()
    }

    pub(crate) fn write_cells<W: TokenWrite + ?Sized>(&self, cells: &ValueMap, writer: &mut W) -> Result<()> {
        writer.write_start_object()?;
        for (column, value) in cells {
            if self.options.skip_nulls && value.is_null() {
                continue;
            }
            writer.write_property_name(column)?;
            self.write_cell(value, writer)?;
        }
        writer.write_end_object()
    }

    fn read_row<R: TokenRead + ?Sized>(&self, reader: &mut R, table: &mut Table, depth: usize) -> Result<()> {
        expect_object(reader)?;

        let state = match next_required(reader, "PropertyName 'Props'")? {
            Token::PropertyName(name) if name == PROPS => self.read_props(reader)?,
            Token::PropertyName(name) if name == DATA => {
                return Err(Error::missing_field(ROW_STATE, Some(reader.location())))
            }
            Token::EndObject => return Err(Error::missing_field(ROW_STATE, Some(reader.location()))),
            other => return Err(unexpected(reader.location(), "PropertyName 'Props'", &other)),
        };

        match next_required(reader, "PropertyName 'Data'")? {
            Token::PropertyName(name) if name == DATA => {}
            Token::EndObject => return Err(Error::missing_field(DATA, Some(reader.location()))),
            other => return Err(unexpected(reader.location(), "PropertyName 'Data'", &other)),
        }
        expect_object(reader)?;

        let original = match next_required(reader, "PropertyName 'Original'")? {
            Token::PropertyName(name) if name == ORIGINAL => self.read_cells(reader, table, depth)?,
            Token::PropertyName(name) if name == CURRENT => {
                // Current first: read it so the error can point past it
                self.read_cells(reader, table, depth)?;
                return match next_required(reader, "EndObject")? {
                    Token::PropertyName(name) if name == ORIGINAL => Err(Error::protocol(
                        reader.location(),
                        "PropertyName 'Original' before 'Current'",
                        "PropertyName 'Original' after 'Current'",
                    )),
                    Token::EndObject => Err(Error::missing_field(ORIGINAL, Some(reader.location()))),
                    other => Err(unexpected(reader.location(), "EndObject", &other)),
                };
            }
            Token::EndObject => return Err(Error::missing_field(ORIGINAL, Some(reader.location()))),
            other => return Err(unexpected(reader.location(), "PropertyName 'Original'", &other)),
        };
        let original_location = reader.location();

        match next_required(reader, "PropertyName 'Current'")? {
            Token::PropertyName(name) if name == CURRENT => {}
            Token::EndObject => return Err(Error::missing_field(CURRENT, Some(reader.location()))),
            other => return Err(unexpected(reader.location(), "PropertyName 'Current'", &other)),
        }
        let current = self.read_cells(reader, table, depth)?;

        expect_kind(reader, TokenKind::EndObject)?;
        expect_kind(reader, TokenKind::EndObject)?;

        self.finish_row(table, state, original, current, original_location)
    }

    fn read_props<R: TokenRead + ?Sized>(&self, reader: &mut R) -> Result<RowState> {
        expect_object(reader)?;
        let state = match next_required(reader, "PropertyName 'RowState'")? {
            Token::PropertyName(name) if name == ROW_STATE => self.read_state(reader, false)?,
            Token::PropertyName(_) | Token::EndObject => {
                return Err(Error::missing_field(ROW_STATE, Some(reader.location())))
            }
            other => return Err(unexpected(reader.location(), "PropertyName 'RowState'", &other)),
        };
        expect_kind(reader, TokenKind::EndObject)?;
        Ok(state)
    }

    /// Reads a `RowState` literal.
    pub(crate) fn read_state<R: TokenRead + ?Sized>(&self, reader: &mut R, ignore_case: bool) -> Result<RowState> {
        const EXPECTED: &str = "one of Added, Modified, Unchanged, Deleted";
        match next_required(reader, EXPECTED)? {
            Token::Text(literal) => {
                let state = if ignore_case {
                    RowState::from_literal_ignore_case(&literal)
                } else {
                    RowState::from_literal(&literal)
                };
                state.ok_or_else(|| {
                    Error::protocol(reader.location(), EXPECTED, &format!("Text '{}'", literal))
                })
            }
            other => Err(unexpected(reader.location(), EXPECTED, &other)),
        }
    }

    /// Reads an object of `column: value` pairs.
    pub(crate) fn read_cells<R: TokenRead + ?Sized>(
        &self,
        reader: &mut R,
        table: &mut Table,
        depth: usize,
    ) -> Result<ValueMap> {
        expect_object(reader)?;
        let mut cells = ValueMap::new();
        loop {
            match next_required(reader, "PropertyName or EndObject")? {
                Token::PropertyName(column) => {
                    let value = self.read_cell(reader, table, &column, depth)?;
                    cells.insert(column, value);
                }
                Token::EndObject => return Ok(cells),
                other => {
                    return Err(Error::protocol(
                        reader.location(),
                        "PropertyName or EndObject",
                        &describe_token(&other),
                    ))
                }
            }
        }
    }

    /// Builds the decoded row: an Unchanged baseline (for Modified rows, the current
    /// values with the original key restored) put through the recorded transition.
    pub(crate) fn finish_row(
        &self,
        table: &mut Table,
        state: RowState,
        original: ValueMap,
        current: ValueMap,
        location: Location,
    ) -> Result<()> {
        if state != RowState::Modified && !original.is_empty() {
            return Err(Error::protocol(
                location,
                "empty original key for a row that is not Modified",
                &format!("{} original value(s) on a {} row", original.len(), state),
            ));
        }

        let row = match state {
            RowState::Modified => self.modified_row(table, original, current, location)?,
            _ => {
                let mut row = Row::new(table.normalize(current));
                match state {
                    RowState::Added => row.mark_added()?,
                    RowState::Deleted => row.mark_deleted()?,
                    _ => {}
                }
                row
            }
        };
        table.push_row(row);
        Ok(())
    }

    fn modified_row(
        &self,
        table: &mut Table,
        original: ValueMap,
        current: ValueMap,
        location: Location,
    ) -> Result<Row> {
        if original.is_empty() {
            if self.options.require_original_key || !table.primary_key().is_empty() {
                return Err(Error::missing_field(ORIGINAL, Some(location)));
            }
            let mut row = Row::new(table.normalize(current));
            row.mark_modified_keyless()?;
            return Ok(row);
        }

        if table.primary_key().is_empty() {
            tracing::trace!(
                "table '{}' adopts primary key ({}) from an original key",
                table.name(),
                original.keys().cloned().collect::<Vec<_>>().join(", ")
            );
            table.adopt_primary_key(original.keys().cloned().collect());
        }
        let primary_key = table.primary_key().to_vec();
        if let Err(e) = order_original_key(&primary_key, &original) {
            tracing::warn!(
                "original key of a row in table '{}' does not match its primary key ({})",
                table.name(),
                primary_key.join(", ")
            );
            return Err(e);
        }

        // baseline carries the original key; the current key is applied on top of it
        let mut baseline = current;
        let mut changes = ValueMap::with_capacity(primary_key.len());
        for column in &primary_key {
            let now = baseline.remove(column).unwrap_or(Value::Null);
            changes.insert(column.clone(), now);
            if let Some(was) = original.get(column) {
                baseline.insert(column.clone(), was.clone());
            }
        }
        let mut row = Row::new(table.normalize(baseline));
        row.modify(&primary_key, changes)?;
        Ok(row)
    }
}
