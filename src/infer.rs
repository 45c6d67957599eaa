//! Column kind inference and value coercion.
//!
//! The first token observed for a column decides its [`ColumnKind`]:
//!
//! | First token                    | Column kind                 |
//! |--------------------------------|-----------------------------|
//! | integer / boolean / float      | integer / boolean / float   |
//! | text / timestamp / bytes       | text / timestamp / bytes    |
//! | null                           | text                        |
//! | `[` then scalar                | array of that scalar's kind |
//! | `[` then null or `]`           | array of text               |
//! | `[` then `{`                   | nested table                |
//!
//! Later values are coerced into the established kind by [`coerce`], or rejected with a
//! type mismatch. Text columns take any scalar in its textual form; integer columns take
//! whole-number floats; float columns take integers; timestamp and bytes columns take
//! text in RFC 3339 and base64 form respectively.

use crate::token::{decode_bytes, format_timestamp, parse_timestamp};
use crate::{ColumnKind, Error, Result, ScalarKind, Token, TokenKind, Value};

/// Kind of a scalar token, `None` for null and structural tokens.
#[must_use]
pub fn scalar_kind_of(kind: TokenKind) -> Option<ScalarKind> {
    match kind {
        TokenKind::Integer => Some(ScalarKind::Integer),
        TokenKind::Boolean => Some(ScalarKind::Boolean),
        TokenKind::Float => Some(ScalarKind::Float),
        TokenKind::Text => Some(ScalarKind::Text),
        TokenKind::Timestamp => Some(ScalarKind::Timestamp),
        TokenKind::Bytes => Some(ScalarKind::Bytes),
        _ => None,
    }
}

/// Column kind for a column whose first value starts with a token of `kind`.
///
/// Returns `None` for [`TokenKind::StartArray`]: arrays need the element after the
/// bracket, see [`infer_array`]. Also `None` for names, objects and closing tokens.
///
/// # Examples
///
/// ```rust
/// use serde_dataset::{infer, ColumnKind, TokenKind};
///
/// assert_eq!(infer::infer_value(TokenKind::Integer), Some(ColumnKind::Integer));
/// assert_eq!(infer::infer_value(TokenKind::Null), Some(ColumnKind::Text));
/// assert_eq!(infer::infer_value(TokenKind::StartArray), None);
/// ```
#[must_use]
pub fn infer_value(kind: TokenKind) -> Option<ColumnKind> {
    match kind {
        TokenKind::Null => Some(ColumnKind::Text),
        other => scalar_kind_of(other).map(ColumnKind::from),
    }
}

/// Column kind for an array whose first element starts with `first`.
///
/// # Examples
///
/// ```rust
/// use serde_dataset::{infer, ColumnKind, ScalarKind, TokenKind};
///
/// assert_eq!(infer::infer_array(TokenKind::StartObject), Some(ColumnKind::Table));
/// assert_eq!(infer::infer_array(TokenKind::Float), Some(ColumnKind::Array(ScalarKind::Float)));
/// assert_eq!(infer::infer_array(TokenKind::EndArray), Some(ColumnKind::Array(ScalarKind::Text)));
/// ```
#[must_use]
pub fn infer_array(first: TokenKind) -> Option<ColumnKind> {
    match first {
        TokenKind::StartObject => Some(ColumnKind::Table),
        TokenKind::EndArray | TokenKind::Null => Some(ColumnKind::Array(ScalarKind::Text)),
        other => scalar_kind_of(other).map(ColumnKind::Array),
    }
}

/// Converts a scalar or null token into a value of `kind`.
///
/// # Errors
///
/// Returns [`Error::TypeMismatch`] naming `column` when the token cannot be converted.
///
/// # Examples
///
/// ```rust
/// use serde_dataset::{infer, ScalarKind, Token, Value, ErrorKind};
///
/// let v = infer::coerce("Price", ScalarKind::Float, Token::Integer(3)).unwrap();
/// assert_eq!(v, Value::Float(3.0));
///
/// let err = infer::coerce("IdTest", ScalarKind::Integer, Token::Text("x".into())).unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::TypeMismatch);
/// ```
pub fn coerce(column: &str, kind: ScalarKind, token: Token) -> Result<Value> {
    let found = token.kind();
    let value = match (kind, token) {
        (_, Token::Null) => Some(Value::Null),

        (ScalarKind::Integer, Token::Integer(i)) => Some(Value::Integer(i)),
        (ScalarKind::Integer, Token::Float(f))
            // i64::MAX as f64 rounds up to 2^63, one past the range
            if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 =>
        {
            Some(Value::Integer(f as i64))
        }

        (ScalarKind::Boolean, Token::Boolean(b)) => Some(Value::Boolean(b)),

        (ScalarKind::Float, Token::Float(f)) => Some(Value::Float(f)),
        (ScalarKind::Float, Token::Integer(i)) => Some(Value::Float(i as f64)),

        (ScalarKind::Text, Token::Text(s)) => Some(Value::Text(s)),
        (ScalarKind::Text, Token::Integer(i)) => Some(Value::Text(i.to_string())),
        (ScalarKind::Text, Token::Float(f)) => Some(Value::Text(f.to_string())),
        (ScalarKind::Text, Token::Boolean(b)) => Some(Value::Text(b.to_string())),
        (ScalarKind::Text, Token::Timestamp(ts)) => Some(Value::Text(format_timestamp(&ts))),

        (ScalarKind::Timestamp, Token::Timestamp(ts)) => Some(Value::Timestamp(ts)),
        (ScalarKind::Timestamp, Token::Text(s)) => parse_timestamp(&s).map(Value::Timestamp),

        (ScalarKind::Bytes, Token::Bytes(b)) => Some(Value::Bytes(b)),
        (ScalarKind::Bytes, Token::Text(s)) => decode_bytes(&s).map(Value::Bytes),

        _ => None,
    };

    value.ok_or_else(|| Error::type_mismatch(column, kind.as_str(), describe(found)))
}

/// Human name of a token kind in type-mismatch messages.
pub(crate) fn describe(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::StartArray | TokenKind::EndArray => "array",
        TokenKind::StartObject | TokenKind::EndObject => "object",
        TokenKind::PropertyName => "property name",
        TokenKind::Null => "null",
        other => scalar_kind_of(other).map(|k| k.as_str()).unwrap_or("token"),
    }
}
