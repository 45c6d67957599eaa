//! The legacy flat row layout.
//!
//! Each row is a run of sibling objects inside the table array:
//!
//! ```text
//! {"RowState":"Modified"}, {"OriginalKey":{"IdTest":2}}, {"IdTest":3,"Name":"Y"}
//! ```
//!
//! The `OriginalKey` object appears for Modified rows only. Property names and state
//! literals are matched case-insensitively.

use super::{expect_kind, expect_object, next_required, unexpected, TableCodec, ORIGINAL_KEY, ROW_STATE};
use crate::{Error, Result, Row, RowState, Scalar, Table, Token, TokenKind, TokenRead, TokenWrite, ValueMap};

impl TableCodec {
    pub(crate) fn write_legacy_row<W: TokenWrite + ?Sized>(&self, row: &Row, writer: &mut W) -> Result<()> {
        writer.write_start_object()?;
        writer.write_property_name(ROW_STATE)?;
        writer.write_value(Scalar::Text(row.state().as_str()))?;
        writer.write_end_object()?;

        if row.state() == RowState::Modified {
            writer.write_start_object()?;
            writer.write_property_name(ORIGINAL_KEY)?;
            self.write_original_key(row, writer)?;
            writer.write_end_object()?;
        }

        self.write_cells(row.current(), writer)
    }

    pub(crate) fn read_legacy_row<R: TokenRead + ?Sized>(
        &self,
        reader: &mut R,
        table: &mut Table,
        depth: usize,
    ) -> Result<()> {
        expect_object(reader)?;
        let state = match next_required(reader, "PropertyName 'RowState'")? {
            Token::PropertyName(name) if name.eq_ignore_ascii_case(ROW_STATE) => {
                self.read_state(reader, true)?
            }
            Token::PropertyName(_) | Token::EndObject => {
                return Err(Error::missing_field(ROW_STATE, Some(reader.location())))
            }
            other => return Err(unexpected(reader.location(), "PropertyName 'RowState'", &other)),
        };
        expect_kind(reader, TokenKind::EndObject)?;

        let mut original = ValueMap::new();
        if state == RowState::Modified {
            expect_object(reader)?;
            match next_required(reader, "PropertyName 'OriginalKey'")? {
                Token::PropertyName(name) if name.eq_ignore_ascii_case(ORIGINAL_KEY) => {
                    original = self.read_cells(reader, table, depth)?;
                }
                Token::PropertyName(_) | Token::EndObject => {
                    return Err(Error::missing_field(ORIGINAL_KEY, Some(reader.location())))
                }
                other => {
                    return Err(unexpected(reader.location(), "PropertyName 'OriginalKey'", &other))
                }
            }
            expect_kind(reader, TokenKind::EndObject)?;
        }
        let location = reader.location();

        let current = self.read_cells(reader, table, depth)?;
        self.finish_row(table, state, original, current, location)
    }
}
