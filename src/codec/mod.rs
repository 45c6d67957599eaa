//! Table and dataset codecs.
//!
//! [`TableCodec`] turns one [`Table`](crate::Table) into an array of row elements and back;
//! [`DatasetCodec`] wraps several tables in an object keyed by table name. Both drive any
//! [`TokenRead`] / [`TokenWrite`], so the same code serves JSON text, in-memory token
//! buffers and the serde bridge.
//!
//! Decoding is all-or-nothing: when it fails, the target table or dataset is restored to
//! the shape it had before the call.

mod cell;
mod dataset;
mod legacy;
mod table;

pub use dataset::DatasetCodec;
pub use table::TableCodec;

use crate::{Error, Result, Token, TokenKind, TokenRead};

pub(crate) const PROPS: &str = "Props";
pub(crate) const ROW_STATE: &str = "RowState";
pub(crate) const DATA: &str = "Data";
pub(crate) const ORIGINAL: &str = "Original";
pub(crate) const CURRENT: &str = "Current";
pub(crate) const ORIGINAL_KEY: &str = "OriginalKey";

/// Describes a token for protocol error messages.
pub(crate) fn describe_token(token: &Token) -> String {
    match token {
        Token::PropertyName(name) => format!("PropertyName '{}'", name),
        Token::Text(s) => format!("Text '{}'", s),
        other => other.kind().to_string(),
    }
}

/// Consumes the next token; running out of input is a protocol error.
pub(crate) fn next_required<R: TokenRead + ?Sized>(reader: &mut R, expected: &str) -> Result<Token> {
    match reader.next_token()? {
        Some(token) => Ok(token),
        None => Err(Error::protocol(reader.location(), expected, "end of input")),
    }
}

/// Peeks the next token kind; running out of input is a protocol error.
pub(crate) fn peek_required<R: TokenRead + ?Sized>(
    reader: &mut R,
    expected: &str,
) -> Result<TokenKind> {
    match reader.peek()? {
        Some(kind) => Ok(kind),
        None => Err(Error::protocol(reader.location(), expected, "end of input")),
    }
}

/// Consumes a token that must be of `kind`.
pub(crate) fn expect_kind<R: TokenRead + ?Sized>(reader: &mut R, kind: TokenKind) -> Result<Token> {
    let token = next_required(reader, kind.as_str())?;
    if token.kind() == kind {
        Ok(token)
    } else {
        Err(Error::protocol(
            reader.location(),
            kind.as_str(),
            &describe_token(&token),
        ))
    }
}

/// Consumes the start of an object the row layout requires (a row, `Props`, `Data`, or a
/// cell object), never an envelope scalar.
pub(crate) fn expect_object<R: TokenRead + ?Sized>(reader: &mut R) -> Result<()> {
    match reader.next_object()? {
        Some(Token::StartObject) => Ok(()),
        Some(token) => Err(unexpected(reader.location(), "StartObject", &token)),
        None => Err(Error::protocol(reader.location(), "StartObject", "end of input")),
    }
}

pub(crate) fn unexpected(location: crate::Location, expected: &str, token: &Token) -> Error {
    Error::protocol(location, expected, &describe_token(token))
}
