//! Cell values: scalars, typed arrays and nested tables.

use super::{next_required, peek_required, unexpected, TableCodec};
use crate::infer::{self, coerce, infer_array, infer_value};
use crate::{
    ColumnKind, Error, Result, Scalar, ScalarKind, Table, Token, TokenKind, TokenRead, TokenWrite,
    Value,
};

impl TableCodec {
    /// Writes one cell. Nested tables are written as row arrays in the codec's layout.
    pub(crate) fn write_cell<W: TokenWrite + ?Sized>(&self, value: &Value, writer: &mut W) -> Result<()> {
        match value {
            Value::Null => writer.write_null(),
            Value::Array(items) => {
                writer.write_start_array()?;
                for item in items {
                    write_scalar(item, writer)?;
                }
                writer.write_end_array()
            }
            Value::Table(table) => self.write_rows(table, writer),
            scalar => write_scalar(scalar, writer),
        }
    }

    /// Reads the value of `column` for the row being decoded into `table`, creating or
    /// settling the column from what the value looks like.
    pub(crate) fn read_cell<R: TokenRead + ?Sized>(
        &self,
        reader: &mut R,
        table: &mut Table,
        column: &str,
        depth: usize,
    ) -> Result<Value> {
        let kind = peek_required(reader, "column value")?;

        if kind == TokenKind::StartArray {
            reader.next_token()?;
            let first = peek_required(reader, "array element or EndArray")?;
            let inferred = infer_array(first).ok_or_else(|| {
                Error::protocol(reader.location(), "array element", infer::describe(first))
            })?;
            let evidence = match first {
                TokenKind::EndArray | TokenKind::Null => None,
                _ => Some(inferred),
            };
            return match table.resolve_column(column, evidence, inferred) {
                ColumnKind::Table => {
                    let mut nested = Table::new(column);
                    self.read_rows(reader, &mut nested, depth + 1)?;
                    nested.seal_columns();
                    Ok(Value::Table(Box::new(nested)))
                }
                ColumnKind::Array(element) => read_array(reader, column, element),
                other => Err(Error::type_mismatch(column, &other.to_string(), "array")),
            };
        }

        let inferred = infer_value(kind).ok_or_else(|| {
            Error::protocol(reader.location(), "column value", infer::describe(kind))
        })?;
        let evidence = if kind == TokenKind::Null { None } else { Some(inferred) };
        let column_kind = table.resolve_column(column, evidence, inferred);

        let token = next_required(reader, "column value")?;
        match (column_kind.as_scalar(), token) {
            (Some(scalar), token) => coerce(column, scalar, token),
            (None, Token::Null) => Ok(Value::Null),
            (None, token) => Err(Error::type_mismatch(
                column,
                &column_kind.to_string(),
                infer::describe(token.kind()),
            )),
        }
    }
}

fn write_scalar<W: TokenWrite + ?Sized>(value: &Value, writer: &mut W) -> Result<()> {
    let scalar = match value {
        Value::Null => return writer.write_null(),
        Value::Integer(i) => Scalar::Integer(*i),
        Value::Boolean(b) => Scalar::Boolean(*b),
        Value::Float(f) => Scalar::Float(*f),
        Value::Text(s) => Scalar::Text(s),
        Value::Timestamp(ts) => Scalar::Timestamp(ts),
        Value::Bytes(b) => Scalar::Bytes(b),
        Value::Array(_) | Value::Table(_) => {
            return Err(Error::custom(format!(
                "array elements must be scalars, found {}",
                value.describe()
            )))
        }
    };
    writer.write_value(scalar)
}

/// Reads the elements of a typed array whose `[` has been consumed.
fn read_array<R: TokenRead + ?Sized>(
    reader: &mut R,
    column: &str,
    element: ScalarKind,
) -> Result<Value> {
    let mut items = Vec::new();
    loop {
        match next_required(reader, "array element or EndArray")? {
            Token::EndArray => return Ok(Value::Array(items)),
            token if token.kind().is_scalar() || token == Token::Null => {
                items.push(coerce(column, element, token)?);
            }
            Token::StartArray | Token::StartObject => {
                return Err(Error::type_mismatch(
                    column,
                    &ColumnKind::Array(element).to_string(),
                    "nested container",
                ))
            }
            token => return Err(unexpected(reader.location(), "array element", &token)),
        }
    }
}
