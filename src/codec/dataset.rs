//! The dataset codec: an object mapping table names to row arrays.

use super::{next_required, unexpected, TableCodec};
use crate::{CodecOptions, Dataset, Error, Result, Token, TokenRead, TokenWrite};

/// Encodes and decodes a [`Dataset`] as `{"<table>": [<row elements>], ...}`.
///
/// Decoding into a non-empty dataset merges: rows for a table that already exists are
/// appended to it, and tables seen for the first time are added after the existing ones,
/// in the order they appear.
///
/// # Examples
///
/// ```rust
/// use serde_dataset::{DatasetCodec, JsonReader};
///
/// let json = r#"{"Test":[{"Props":{"RowState":"Deleted"},"Data":{"Original":{},"Current":{"IdTest":5}}}]}"#;
/// let dataset = DatasetCodec::default().decode(&mut JsonReader::from_str(json)).unwrap();
/// assert_eq!(dataset.get("Test").unwrap().len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct DatasetCodec {
    tables: TableCodec,
}

impl DatasetCodec {
    #[must_use]
    pub fn new(options: CodecOptions) -> Self {
        DatasetCodec {
            tables: TableCodec::new(options),
        }
    }

    #[must_use]
    pub fn options(&self) -> &CodecOptions {
        self.tables.options()
    }

    /// Writes every table, in dataset order.
    pub fn encode<W: TokenWrite + ?Sized>(&self, dataset: &Dataset, writer: &mut W) -> Result<()> {
        tracing::debug!("encoding dataset with {} tables", dataset.len());
        writer.write_start_object()?;
        for (name, table) in dataset.iter() {
            writer.write_property_name(name)?;
            self.tables.encode(table, writer)?;
        }
        writer.write_end_object()
    }

    /// Reads a dataset object into a new dataset. A `null` decodes as an empty dataset.
    ///
    /// # Errors
    ///
    /// Any table error, wrapped with the name of the table it occurred in.
    pub fn decode<R: TokenRead + ?Sized>(&self, reader: &mut R) -> Result<Dataset> {
        let mut dataset = Dataset::new();
        self.decode_into(reader, &mut dataset)?;
        Ok(dataset)
    }

    /// Reads a dataset object and merges it into `dataset`.
    ///
    /// On error nothing is merged: tables added by this call are removed and existing
    /// tables are restored to their previous columns, rows and primary key.
    pub fn decode_into<R: TokenRead + ?Sized>(&self, reader: &mut R, dataset: &mut Dataset) -> Result<()> {
        let checkpoint = dataset.checkpoint();
        match self.read_dataset(reader, dataset) {
            Ok(()) => {
                for table in dataset.tables_mut() {
                    table.seal_columns();
                }
                Ok(())
            }
            Err(e) => {
                tracing::debug!("decoding dataset failed, rolling back: {}", e);
                dataset.rollback(checkpoint);
                Err(e)
            }
        }
    }

    fn read_dataset<R: TokenRead + ?Sized>(&self, reader: &mut R, dataset: &mut Dataset) -> Result<()> {
        match reader.next_object()? {
            Some(Token::StartObject) => {}
            Some(Token::Null) => return Ok(()),
            Some(other) => return Err(unexpected(reader.location(), "StartObject", &other)),
            None => return Err(Error::protocol(reader.location(), "StartObject", "end of input")),
        }
        loop {
            match next_required(reader, "table name or EndObject")? {
                Token::PropertyName(name) => {
                    if dataset.get(&name).is_some() {
                        tracing::trace!("merging rows into existing table '{}'", name);
                    }
                    let table = dataset.table_mut(&name);
                    self.tables.read_table(reader, table)?;
                }
                Token::EndObject => return Ok(()),
                other => return Err(unexpected(reader.location(), "table name or EndObject", &other)),
            }
        }
    }
}
