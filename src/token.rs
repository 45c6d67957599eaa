//! The token stream the codecs drive.
//!
//! [`TokenRead`] is a pull reader with one token of lookahead and [`TokenWrite`] is the
//! symmetric push writer. The table and dataset codecs only ever talk to these two traits;
//! [`JsonReader`](crate::JsonReader) and [`JsonWriter`](crate::JsonWriter) adapt them to JSON
//! text and [`TokenBuffer`] keeps tokens in memory.
//!
//! ## Examples
//!
//! ```rust
//! use serde_dataset::{Token, TokenBuffer, TokenRead, TokenWrite, TokenKind, Scalar};
//!
//! let mut buffer = TokenBuffer::new();
//! buffer.write_start_array().unwrap();
//! buffer.write_value(Scalar::Integer(4)).unwrap();
//! buffer.write_end_array().unwrap();
//!
//! assert_eq!(buffer.peek().unwrap(), Some(TokenKind::StartArray));
//! assert_eq!(buffer.next_token().unwrap(), Some(Token::StartArray));
//! assert_eq!(buffer.next_token().unwrap(), Some(Token::Integer(4)));
//! ```

use crate::{Error, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;

/// Property name of the envelope object carrying a base64 byte blob.
pub const BYTES_ENVELOPE: &str = "$bytes";
/// Property name of the envelope object carrying an RFC 3339 timestamp.
pub const TIMESTAMP_ENVELOPE: &str = "$timestamp";
/// Property name of the envelope object carrying a non-finite float.
pub const FLOAT_ENVELOPE: &str = "$f64";

/// The kind of a [`Token`], available through [`TokenRead::peek`] without consuming it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    PropertyName,
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    Integer,
    Boolean,
    Float,
    Text,
    Timestamp,
    Bytes,
    Null,
}

impl TokenKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TokenKind::PropertyName => "PropertyName",
            TokenKind::StartObject => "StartObject",
            TokenKind::EndObject => "EndObject",
            TokenKind::StartArray => "StartArray",
            TokenKind::EndArray => "EndArray",
            TokenKind::Integer => "Integer",
            TokenKind::Boolean => "Boolean",
            TokenKind::Float => "Float",
            TokenKind::Text => "Text",
            TokenKind::Timestamp => "Timestamp",
            TokenKind::Bytes => "Bytes",
            TokenKind::Null => "Null",
        }
    }

    /// Returns `true` for literal value tokens (everything but names and structure).
    #[inline]
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(
            self,
            TokenKind::Integer
                | TokenKind::Boolean
                | TokenKind::Float
                | TokenKind::Text
                | TokenKind::Timestamp
                | TokenKind::Bytes
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single token of the structured-text stream.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    PropertyName(String),
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    Integer(i64),
    Boolean(bool),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Bytes(Vec<u8>),
    Null,
}

impl Token {
    #[must_use]
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::PropertyName(_) => TokenKind::PropertyName,
            Token::StartObject => TokenKind::StartObject,
            Token::EndObject => TokenKind::EndObject,
            Token::StartArray => TokenKind::StartArray,
            Token::EndArray => TokenKind::EndArray,
            Token::Integer(_) => TokenKind::Integer,
            Token::Boolean(_) => TokenKind::Boolean,
            Token::Float(_) => TokenKind::Float,
            Token::Text(_) => TokenKind::Text,
            Token::Timestamp(_) => TokenKind::Timestamp,
            Token::Bytes(_) => TokenKind::Bytes,
            Token::Null => TokenKind::Null,
        }
    }

    /// Borrows a literal token as a [`Scalar`]. Returns `None` for names, structure and null.
    #[must_use]
    pub fn as_scalar(&self) -> Option<Scalar<'_>> {
        match self {
            Token::Integer(i) => Some(Scalar::Integer(*i)),
            Token::Boolean(b) => Some(Scalar::Boolean(*b)),
            Token::Float(f) => Some(Scalar::Float(*f)),
            Token::Text(s) => Some(Scalar::Text(s)),
            Token::Timestamp(ts) => Some(Scalar::Timestamp(ts)),
            Token::Bytes(b) => Some(Scalar::Bytes(b)),
            _ => None,
        }
    }
}

impl From<Scalar<'_>> for Token {
    fn from(scalar: Scalar<'_>) -> Self {
        match scalar {
            Scalar::Integer(i) => Token::Integer(i),
            Scalar::Boolean(b) => Token::Boolean(b),
            Scalar::Float(f) => Token::Float(f),
            Scalar::Text(s) => Token::Text(s.to_string()),
            Scalar::Timestamp(ts) => Token::Timestamp(*ts),
            Scalar::Bytes(b) => Token::Bytes(b.to_vec()),
        }
    }
}

/// A borrowed literal value handed to [`TokenWrite::write_value`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar<'a> {
    Integer(i64),
    Boolean(bool),
    Float(f64),
    Text(&'a str),
    Timestamp(&'a DateTime<Utc>),
    Bytes(&'a [u8]),
}

/// Where a token was read from, for error messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    /// Position in JSON text (1-based).
    Text { line: usize, column: usize },
    /// Index into an in-memory token sequence.
    Token(usize),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Text { line, column } => write!(f, "line {}, column {}", line, column),
            Location::Token(index) => write!(f, "token {}", index),
        }
    }
}

/// Pull-style token reader with one token of lookahead.
pub trait TokenRead {
    /// Returns the kind of the next token without consuming it, or `None` at end of input.
    fn peek(&mut self) -> Result<Option<TokenKind>>;

    /// Consumes and returns the next token, or `None` at end of input.
    fn next_token(&mut self) -> Result<Option<Token>>;

    /// Consumes the next token at a position where only an object may appear.
    ///
    /// Readers that collapse `{"$f64": ..}`-style envelopes into scalars must read an
    /// envelope-shaped object as an ordinary object here, even after peeking it: a row's
    /// cell object may have a single column named `$f64`.
    fn next_object(&mut self) -> Result<Option<Token>> {
        self.next_token()
    }

    /// Location of the most recently peeked or consumed token.
    fn location(&self) -> Location;
}

/// Push-style token writer, symmetric to [`TokenRead`].
pub trait TokenWrite {
    fn write_start_object(&mut self) -> Result<()>;
    fn write_end_object(&mut self) -> Result<()>;
    fn write_start_array(&mut self) -> Result<()>;
    fn write_end_array(&mut self) -> Result<()>;
    fn write_property_name(&mut self, name: &str) -> Result<()>;
    fn write_value(&mut self, value: Scalar<'_>) -> Result<()>;
    fn write_null(&mut self) -> Result<()>;
}

impl<R: TokenRead + ?Sized> TokenRead for &mut R {
    fn peek(&mut self) -> Result<Option<TokenKind>> {
        (**self).peek()
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        (**self).next_token()
    }

    fn next_object(&mut self) -> Result<Option<Token>> {
        (**self).next_object()
    }

    fn location(&self) -> Location {
        (**self).location()
    }
}

impl<W: TokenWrite + ?Sized> TokenWrite for &mut W {
    fn write_start_object(&mut self) -> Result<()> {
        (**self).write_start_object()
    }

    fn write_end_object(&mut self) -> Result<()> {
        (**self).write_end_object()
    }

    fn write_start_array(&mut self) -> Result<()> {
        (**self).write_start_array()
    }

    fn write_end_array(&mut self) -> Result<()> {
        (**self).write_end_array()
    }

    fn write_property_name(&mut self, name: &str) -> Result<()> {
        (**self).write_property_name(name)
    }

    fn write_value(&mut self, value: Scalar<'_>) -> Result<()> {
        (**self).write_value(value)
    }

    fn write_null(&mut self) -> Result<()> {
        (**self).write_null()
    }
}

/// An in-memory token sequence that can be written to and then read back.
///
/// Reading starts at the first token regardless of how many were written; [`rewind`]
/// resets the read cursor.
///
/// [`rewind`]: TokenBuffer::rewind
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TokenBuffer {
    tokens: Vec<Token>,
    cursor: usize,
}

impl TokenBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        TokenBuffer { tokens, cursor: 0 }
    }

    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    #[must_use]
    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Returns `true` once every token has been consumed.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.tokens.len()
    }
}

impl TokenRead for TokenBuffer {
    fn peek(&mut self) -> Result<Option<TokenKind>> {
        Ok(self.tokens.get(self.cursor).map(Token::kind))
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        let token = self.tokens.get(self.cursor).cloned();
        if token.is_some() {
            self.cursor += 1;
        }
        Ok(token)
    }

    fn location(&self) -> Location {
        Location::Token(self.cursor.saturating_sub(1))
    }
}

impl TokenWrite for TokenBuffer {
    fn write_start_object(&mut self) -> Result<()> {
        self.push(Token::StartObject);
        Ok(())
    }

    fn write_end_object(&mut self) -> Result<()> {
        self.push(Token::EndObject);
        Ok(())
    }

    fn write_start_array(&mut self) -> Result<()> {
        self.push(Token::StartArray);
        Ok(())
    }

    fn write_end_array(&mut self) -> Result<()> {
        self.push(Token::EndArray);
        Ok(())
    }

    fn write_property_name(&mut self, name: &str) -> Result<()> {
        self.push(Token::PropertyName(name.to_string()));
        Ok(())
    }

    fn write_value(&mut self, value: Scalar<'_>) -> Result<()> {
        self.push(Token::from(value));
        Ok(())
    }

    fn write_null(&mut self) -> Result<()> {
        self.push(Token::Null);
        Ok(())
    }
}

/// Renders a timestamp the way every writer in this crate does.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

pub(crate) fn encode_bytes(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

pub(crate) fn decode_bytes(s: &str) -> Option<Vec<u8>> {
    BASE64.decode(s).ok()
}

/// The payload of a `$f64` envelope, or `None` for finite values.
pub(crate) fn non_finite_name(f: f64) -> Option<&'static str> {
    if f.is_nan() {
        Some("NaN")
    } else if f == f64::INFINITY {
        Some("+Inf")
    } else if f == f64::NEG_INFINITY {
        Some("-Inf")
    } else {
        None
    }
}

/// Turns an envelope `{"<name>": "<payload>"}` back into the token it stands for.
pub(crate) fn unwrap_envelope(name: &str, payload: &str) -> Result<Token> {
    match name {
        BYTES_ENVELOPE => decode_bytes(payload)
            .map(Token::Bytes)
            .ok_or_else(|| Error::custom(format!("invalid base64 in {}", BYTES_ENVELOPE))),
        TIMESTAMP_ENVELOPE => parse_timestamp(payload)
            .map(Token::Timestamp)
            .ok_or_else(|| Error::custom(format!("invalid RFC 3339 timestamp '{}'", payload))),
        FLOAT_ENVELOPE => match payload {
            "NaN" => Ok(Token::Float(f64::NAN)),
            "+Inf" | "Infinity" => Ok(Token::Float(f64::INFINITY)),
            "-Inf" | "-Infinity" => Ok(Token::Float(f64::NEG_INFINITY)),
            other => Err(Error::custom(format!("invalid {} payload '{}'", FLOAT_ENVELOPE, other))),
        },
        other => Err(Error::custom(format!("unknown envelope '{}'", other))),
    }
}

pub(crate) fn is_envelope(name: &str) -> bool {
    matches!(name, BYTES_ENVELOPE | TIMESTAMP_ENVELOPE | FLOAT_ENVELOPE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_buffer_reads_back_written_tokens() {
        let mut buffer = TokenBuffer::new();
        buffer.write_start_object().unwrap();
        buffer.write_property_name("Name").unwrap();
        buffer.write_value(Scalar::Text("A")).unwrap();
        buffer.write_end_object().unwrap();

        assert_eq!(buffer.peek().unwrap(), Some(TokenKind::StartObject));
        assert_eq!(buffer.next_token().unwrap(), Some(Token::StartObject));
        assert_eq!(
            buffer.next_token().unwrap(),
            Some(Token::PropertyName("Name".to_string()))
        );
        assert_eq!(buffer.location(), Location::Token(1));
        assert_eq!(buffer.next_token().unwrap(), Some(Token::Text("A".to_string())));
        assert_eq!(buffer.next_token().unwrap(), Some(Token::EndObject));
        assert!(buffer.is_exhausted());
        assert_eq!(buffer.next_token().unwrap(), None);
        assert_eq!(buffer.peek().unwrap(), None);
    }

    #[test]
    fn test_envelopes() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(
            unwrap_envelope(TIMESTAMP_ENVELOPE, &format_timestamp(&ts)).unwrap(),
            Token::Timestamp(ts)
        );
        assert_eq!(
            unwrap_envelope(BYTES_ENVELOPE, &encode_bytes(&[0, 1, 255])).unwrap(),
            Token::Bytes(vec![0, 1, 255])
        );
        match unwrap_envelope(FLOAT_ENVELOPE, "NaN").unwrap() {
            Token::Float(f) => assert!(f.is_nan()),
            other => panic!("Expected float, got {:?}", other),
        }
        assert!(unwrap_envelope(BYTES_ENVELOPE, "not base64!").is_err());
    }

    #[test]
    fn test_scalar_classification() {
        assert!(TokenKind::Timestamp.is_scalar());
        assert!(!TokenKind::Null.is_scalar());
        assert!(!TokenKind::StartArray.is_scalar());
        assert_eq!(Token::Float(1.5).as_scalar(), Some(Scalar::Float(1.5)));
        assert_eq!(Token::Null.as_scalar(), None);
    }
}
