//! JSON text → token stream.
//!
//! This module provides [`JsonReader`], a pull tokenizer over JSON text that implements
//! [`TokenRead`]. It is what the crate-level `from_str` family hands to the codecs.
//!
//! ## Overview
//!
//! - **Single pass**: characters are consumed once, with one token of lookahead
//! - **Typed literals**: numbers without `.` or exponent are integers, all others floats
//! - **Envelopes**: `{"$bytes":"<base64>"}`, `{"$timestamp":"<rfc3339>"}` and
//!   `{"$f64":"NaN"}` collapse into a single bytes, timestamp or float token
//! - **Error reporting**: syntax errors carry line and column
//!
//! ## Usage
//!
//! ```rust
//! use serde_dataset::{JsonReader, Token, TokenRead};
//!
//! let mut reader = JsonReader::from_str(r#"{"IdTest":4,"Blob":{"$bytes":"AQI="}}"#);
//!
//! assert_eq!(reader.next_token().unwrap(), Some(Token::StartObject));
//! assert_eq!(reader.next_token().unwrap(), Some(Token::PropertyName("IdTest".into())));
//! assert_eq!(reader.next_token().unwrap(), Some(Token::Integer(4)));
//! assert_eq!(reader.next_token().unwrap(), Some(Token::PropertyName("Blob".into())));
//! assert_eq!(reader.next_token().unwrap(), Some(Token::Bytes(vec![1, 2])));
//! assert_eq!(reader.next_token().unwrap(), Some(Token::EndObject));
//! assert_eq!(reader.next_token().unwrap(), None);
//! ```

use crate::token::{is_envelope, parse_timestamp, unwrap_envelope};
use crate::{Error, Location, Result, Token, TokenKind, TokenRead};

#[derive(Clone, Copy, Debug, PartialEq)]
enum Frame {
    /// Inside an object; `expect_value` is set right after a property name.
    Object { first: bool, expect_value: bool },
    Array { first: bool },
}

/// Reader state just before an envelope object, for reading it again as a plain object.
#[derive(Clone, Copy, Debug)]
struct Rewind {
    position: usize,
    line: usize,
    column: usize,
    frame: Option<Frame>,
    root_done: bool,
}

struct Peeked {
    token: Token,
    location: Location,
    envelope: Option<Rewind>,
}

/// The JSON tokenizer.
///
/// Created via [`JsonReader::from_str`].
pub struct JsonReader<'a> {
    input: &'a str,
    position: usize,
    line: usize,
    column: usize,
    stack: Vec<Frame>,
    root_done: bool,
    detect_timestamps: bool,
    raw_object: bool,
    envelope: Option<Rewind>,
    peeked: Option<Peeked>,
    last_location: Location,
}

impl<'a> JsonReader<'a> {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(input: &'a str) -> Self {
        JsonReader {
            input,
            position: 0,
            line: 1,
            column: 1,
            stack: Vec::new(),
            root_done: false,
            detect_timestamps: false,
            raw_object: false,
            envelope: None,
            peeked: None,
            last_location: Location::Text { line: 1, column: 1 },
        }
    }

    /// Reads bare RFC 3339 strings as timestamp tokens.
    #[must_use]
    pub fn with_timestamp_detection(mut self, detect: bool) -> Self {
        self.detect_timestamps = detect;
        self
    }

    /// Fails unless only whitespace remains after the root value.
    pub fn finish(&mut self) -> Result<()> {
        if self.peeked.is_some() || !self.stack.is_empty() {
            return Err(Error::syntax(self.line, self.column, "Unconsumed tokens"));
        }
        self.skip_whitespace();
        if self.at_end() {
            Ok(())
        } else {
            Err(Error::syntax(
                self.line,
                self.column,
                "Trailing characters after JSON value",
            ))
        }
    }

    fn here(&self) -> Location {
        Location::Text {
            line: self.line,
            column: self.column,
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn next_char(&mut self) -> Option<char> {
        if let Some(ch) = self.input[self.position..].chars().next() {
            self.position += ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            Some(ch)
        } else {
            None
        }
    }

    fn at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch == ' ' || ch == '\t' || ch == '\n' || ch == '\r' {
                self.next_char();
            } else {
                break;
            }
        }
    }

    fn expect_char(&mut self, expected: char) -> Result<()> {
        self.skip_whitespace();
        match self.next_char() {
            Some(ch) if ch == expected => Ok(()),
            Some(ch) => Err(Error::syntax(
                self.line,
                self.column,
                &format!("Expected '{}', found '{}'", expected, ch),
            )),
            None => Err(Error::unexpected_eof(self.here(), &format!("'{}'", expected))),
        }
    }

    fn parse_string(&mut self) -> Result<String> {
        if self.peek_char() != Some('"') {
            return Err(Error::syntax(self.line, self.column, "Expected string"));
        }
        self.next_char(); // consume opening quote
        let mut result = String::new();

        while let Some(ch) = self.next_char() {
            match ch {
                '"' => return Ok(result),
                '\\' => match self.next_char() {
                    Some('\\') => result.push('\\'),
                    Some('"') => result.push('"'),
                    Some('/') => result.push('/'),
                    Some('n') => result.push('\n'),
                    Some('r') => result.push('\r'),
                    Some('t') => result.push('\t'),
                    Some('b') => result.push('\u{0008}'),
                    Some('f') => result.push('\u{000C}'),
                    Some('u') => {
                        let high = self.parse_hex4()?;
                        let code_point = if (0xD800..0xDC00).contains(&high) {
                            // surrogate pair: a second \uXXXX must follow
                            if self.next_char() != Some('\\') || self.next_char() != Some('u') {
                                return Err(Error::syntax(
                                    self.line,
                                    self.column,
                                    "Unpaired surrogate in unicode escape",
                                ));
                            }
                            let low = self.parse_hex4()?;
                            if !(0xDC00..0xE000).contains(&low) {
                                return Err(Error::syntax(
                                    self.line,
                                    self.column,
                                    "Invalid low surrogate in unicode escape",
                                ));
                            }
                            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
                        } else {
                            high
                        };
                        let ch = char::from_u32(code_point).ok_or_else(|| {
                            Error::syntax(self.line, self.column, "Invalid unicode code point")
                        })?;
                        result.push(ch);
                    }
                    Some(other) => {
                        return Err(Error::syntax(
                            self.line,
                            self.column,
                            &format!("Invalid escape '\\{}'", other),
                        ))
                    }
                    None => {
                        return Err(Error::unexpected_eof(self.here(), "end of string"));
                    }
                },
                other => result.push(other),
            }
        }
        Err(Error::unexpected_eof(self.here(), "closing '\"'"))
    }

    fn parse_hex4(&mut self) -> Result<u32> {
        let mut hex = String::with_capacity(4);
        for _ in 0..4 {
            match self.next_char() {
                Some(ch) if ch.is_ascii_hexdigit() => hex.push(ch),
                _ => {
                    return Err(Error::syntax(
                        self.line,
                        self.column,
                        "Invalid unicode escape sequence (expected 4 hex digits)",
                    ))
                }
            }
        }
        u32::from_str_radix(&hex, 16)
            .map_err(|_| Error::syntax(self.line, self.column, "Invalid hex in unicode escape"))
    }

    fn parse_number(&mut self) -> Result<Token> {
        let start = self.position;

        if self.peek_char() == Some('-') {
            self.next_char();
        }

        let mut is_float = false;
        let mut digits = 0;
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.next_char();
            } else if ch == '.' || ch == 'e' || ch == 'E' {
                is_float = true;
                self.next_char();
                if (ch == 'e' || ch == 'E') && matches!(self.peek_char(), Some('+') | Some('-')) {
                    self.next_char();
                }
            } else {
                break;
            }
        }

        if digits == 0 {
            return Err(Error::syntax(self.line, self.column, "Invalid number"));
        }

        let number_str = &self.input[start..self.position];
        if !is_float {
            if let Ok(i) = number_str.parse::<i64>() {
                return Ok(Token::Integer(i));
            }
        }
        // integers beyond i64 fall back to float, like most JSON readers
        number_str
            .parse::<f64>()
            .map(Token::Float)
            .map_err(|_| Error::syntax(self.line, self.column, "Invalid number"))
    }

    fn parse_keyword(&mut self, keyword: &str, token: Token) -> Result<Token> {
        if self.input[self.position..].starts_with(keyword) {
            for _ in 0..keyword.len() {
                self.next_char();
            }
            Ok(token)
        } else {
            Err(Error::syntax(self.line, self.column, "Unexpected character"))
        }
    }

    fn rewind_point(&self) -> Rewind {
        Rewind {
            position: self.position,
            line: self.line,
            column: self.column,
            frame: self.stack.last().copied(),
            root_done: self.root_done,
        }
    }

    fn rewind(&mut self, to: Rewind) {
        self.position = to.position;
        self.line = to.line;
        self.column = to.column;
        self.root_done = to.root_done;
        if let (Some(top), Some(frame)) = (self.stack.last_mut(), to.frame) {
            *top = frame;
        }
    }

    /// Tries to read `{"$envelope": "payload"}` at the current `{`.
    ///
    /// Leaves the position untouched and returns `None` for any other object, including
    /// one with an envelope name but a non-string value or further properties.
    fn try_envelope(&mut self) -> Result<Option<Token>> {
        let saved = self.rewind_point();
        self.next_char(); // consume '{'
        self.skip_whitespace();

        if let Some((name, payload)) = self.envelope_parts()? {
            let token = unwrap_envelope(&name, &payload)
                .map_err(|e| Error::syntax(self.line, self.column, &e.to_string()))?;
            return Ok(Some(token));
        }

        self.rewind(saved);
        Ok(None)
    }

    fn envelope_parts(&mut self) -> Result<Option<(String, String)>> {
        if self.peek_char() != Some('"') {
            return Ok(None);
        }
        let name = self.parse_string()?;
        if !is_envelope(&name) {
            return Ok(None);
        }
        self.skip_whitespace();
        if self.next_char() != Some(':') {
            return Ok(None);
        }
        self.skip_whitespace();
        if self.peek_char() != Some('"') {
            return Ok(None);
        }
        let payload = self.parse_string()?;
        self.skip_whitespace();
        if self.next_char() != Some('}') {
            return Ok(None);
        }
        Ok(Some((name, payload)))
    }

    fn parse_value(&mut self) -> Result<Token> {
        match self.peek_char() {
            Some('{') => {
                if !self.raw_object {
                    let start = self.rewind_point();
                    if let Some(token) = self.try_envelope()? {
                        self.value_done();
                        // read_token moves this back before any separator
                        self.envelope = Some(start);
                        return Ok(token);
                    }
                }
                self.next_char();
                self.stack.push(Frame::Object {
                    first: true,
                    expect_value: false,
                });
                Ok(Token::StartObject)
            }
            Some('[') => {
                self.next_char();
                self.stack.push(Frame::Array { first: true });
                Ok(Token::StartArray)
            }
            Some('"') => {
                let s = self.parse_string()?;
                self.value_done();
                if self.detect_timestamps {
                    if let Some(ts) = parse_timestamp(&s) {
                        return Ok(Token::Timestamp(ts));
                    }
                }
                Ok(Token::Text(s))
            }
            Some('t') => {
                let token = self.parse_keyword("true", Token::Boolean(true))?;
                self.value_done();
                Ok(token)
            }
            Some('f') => {
                let token = self.parse_keyword("false", Token::Boolean(false))?;
                self.value_done();
                Ok(token)
            }
            Some('n') => {
                let token = self.parse_keyword("null", Token::Null)?;
                self.value_done();
                Ok(token)
            }
            Some(ch) if ch.is_ascii_digit() || ch == '-' => {
                let token = self.parse_number()?;
                self.value_done();
                Ok(token)
            }
            Some(ch) => Err(Error::syntax(
                self.line,
                self.column,
                &format!("Unexpected character '{}'", ch),
            )),
            None => Err(Error::unexpected_eof(self.here(), "value")),
        }
    }

    /// Records that a complete value was read in the innermost container.
    fn value_done(&mut self) {
        match self.stack.last_mut() {
            Some(Frame::Object {
                first,
                expect_value,
            }) => {
                *first = false;
                *expect_value = false;
            }
            Some(Frame::Array { first }) => *first = false,
            None => self.root_done = true,
        }
    }

    /// Reads the next token. When it is a collapsed envelope, `self.envelope` holds the
    /// point to rewind to for reading it again as an object.
    fn read_token(&mut self) -> Result<Option<Token>> {
        let start = self.rewind_point();
        self.envelope = None;
        let token = self.read_next()?;
        if self.envelope.is_some() {
            self.envelope = Some(start);
        }
        Ok(token)
    }

    fn read_next(&mut self) -> Result<Option<Token>> {
        self.skip_whitespace();
        self.last_location = self.here();

        match self.stack.last().copied() {
            None => {
                if self.root_done || self.at_end() {
                    return Ok(None);
                }
                self.parse_value().map(Some)
            }
            Some(Frame::Object {
                expect_value: true, ..
            }) => self.parse_value().map(Some),
            Some(Frame::Object { first, .. }) => {
                if self.peek_char() == Some('}') {
                    self.next_char();
                    self.stack.pop();
                    self.value_done();
                    return Ok(Some(Token::EndObject));
                }
                if !first {
                    self.expect_char(',')?;
                    self.skip_whitespace();
                    self.last_location = self.here();
                }
                let name = self.parse_string()?;
                self.expect_char(':')?;
                if let Some(Frame::Object { expect_value, .. }) = self.stack.last_mut() {
                    *expect_value = true;
                }
                Ok(Some(Token::PropertyName(name)))
            }
            Some(Frame::Array { first }) => {
                if self.peek_char() == Some(']') {
                    self.next_char();
                    self.stack.pop();
                    self.value_done();
                    return Ok(Some(Token::EndArray));
                }
                if !first {
                    self.expect_char(',')?;
                    self.skip_whitespace();
                    self.last_location = self.here();
                }
                self.parse_value().map(Some)
            }
        }
    }
}

impl TokenRead for JsonReader<'_> {
    fn peek(&mut self) -> Result<Option<TokenKind>> {
        if self.peeked.is_none() {
            if let Some(token) = self.read_token()? {
                self.peeked = Some(Peeked {
                    token,
                    location: self.last_location,
                    envelope: self.envelope.take(),
                });
            }
        }
        Ok(self.peeked.as_ref().map(|peeked| peeked.token.kind()))
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        match self.peeked.take() {
            Some(peeked) => {
                self.last_location = peeked.location;
                Ok(Some(peeked.token))
            }
            None => self.read_token(),
        }
    }

    fn next_object(&mut self) -> Result<Option<Token>> {
        match self.peeked.take() {
            Some(Peeked {
                envelope: Some(start),
                ..
            }) => self.rewind(start),
            Some(peeked) => {
                self.last_location = peeked.location;
                return Ok(Some(peeked.token));
            }
            None => {}
        }
        self.raw_object = true;
        let token = self.read_token();
        self.raw_object = false;
        token
    }

    fn location(&self) -> Location {
        match &self.peeked {
            Some(peeked) => peeked.location,
            None => self.last_location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use chrono::{TimeZone, Utc};

    fn tokens(input: &str) -> Result<Vec<Token>> {
        let mut reader = JsonReader::from_str(input);
        let mut out = Vec::new();
        while let Some(token) = reader.next_token()? {
            out.push(token);
        }
        reader.finish()?;
        Ok(out)
    }

    #[test]
    fn test_nested_structure() {
        let tokens = tokens(r#" [ {"a": [1, 2.5, true]}, null, "x" ] "#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::StartArray,
                Token::StartObject,
                Token::PropertyName("a".to_string()),
                Token::StartArray,
                Token::Integer(1),
                Token::Float(2.5),
                Token::Boolean(true),
                Token::EndArray,
                Token::EndObject,
                Token::Null,
                Token::Text("x".to_string()),
                Token::EndArray,
            ]
        );
    }

    #[test]
    fn test_number_kinds() {
        assert_eq!(tokens("-12").unwrap(), vec![Token::Integer(-12)]);
        assert_eq!(tokens("3.0").unwrap(), vec![Token::Float(3.0)]);
        assert_eq!(tokens("1e3").unwrap(), vec![Token::Float(1000.0)]);
        assert_eq!(
            tokens("99999999999999999999").unwrap(),
            vec![Token::Float(1e20)]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            tokens(r#""a\"b\\c\né😀""#).unwrap(),
            vec![Token::Text("a\"b\\c\né😀".to_string())]
        );
    }

    #[test]
    fn test_envelopes() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let parsed = tokens(
            r#"[{"$timestamp":"2024-01-15T10:30:00Z"},{ "$f64" : "-Inf" },{"$other":1}]"#,
        )
        .unwrap();
        assert_eq!(parsed[1], Token::Timestamp(ts));
        assert_eq!(parsed[2], Token::Float(f64::NEG_INFINITY));
        // unknown `$` names are ordinary objects
        assert_eq!(parsed[3], Token::StartObject);
        assert_eq!(parsed[4], Token::PropertyName("$other".to_string()));
    }

    #[test]
    fn test_envelope_name_with_other_shape_is_an_object() {
        let parsed = tokens(r#"[{"$f64":1},{"$bytes":"AQI=","Name":"x"}]"#).unwrap();
        assert_eq!(parsed[1], Token::StartObject);
        assert_eq!(parsed[2], Token::PropertyName("$f64".to_string()));
        assert_eq!(parsed[3], Token::Integer(1));
        assert_eq!(parsed[5], Token::StartObject);
        assert_eq!(parsed[6], Token::PropertyName("$bytes".to_string()));
        assert_eq!(parsed[7], Token::Text("AQI=".to_string()));
    }

    #[test]
    fn test_object_position_reads_envelope_as_object() {
        let mut reader = JsonReader::from_str(r#"{"Current":{"$f64":"NaN"},"Next":{"$f64":"NaN"}}"#);
        assert_eq!(reader.next_object().unwrap(), Some(Token::StartObject));
        reader.next_token().unwrap();

        // without lookahead
        assert_eq!(reader.next_object().unwrap(), Some(Token::StartObject));
        assert_eq!(reader.next_token().unwrap(), Some(Token::PropertyName("$f64".into())));
        assert_eq!(reader.next_token().unwrap(), Some(Token::Text("NaN".into())));
        assert_eq!(reader.next_token().unwrap(), Some(Token::EndObject));
        reader.next_token().unwrap();

        // after a peek already collapsed it
        assert_eq!(reader.peek().unwrap(), Some(TokenKind::Float));
        assert_eq!(reader.next_object().unwrap(), Some(Token::StartObject));
        assert_eq!(reader.next_token().unwrap(), Some(Token::PropertyName("$f64".into())));
        assert_eq!(reader.next_token().unwrap(), Some(Token::Text("NaN".into())));
        assert_eq!(reader.next_token().unwrap(), Some(Token::EndObject));
        assert_eq!(reader.next_token().unwrap(), Some(Token::EndObject));
        assert_eq!(reader.next_token().unwrap(), None);
        reader.finish().unwrap();
    }

    #[test]
    fn test_later_array_element_reads_envelope_as_object() {
        let mut reader = JsonReader::from_str(r#"[{"$f64":"NaN"}, {"$f64":"+Inf"}]"#);
        assert_eq!(reader.next_token().unwrap(), Some(Token::StartArray));
        for payload in ["NaN", "+Inf"] {
            assert_eq!(reader.peek().unwrap(), Some(TokenKind::Float));
            assert_eq!(reader.next_object().unwrap(), Some(Token::StartObject));
            assert_eq!(reader.next_token().unwrap(), Some(Token::PropertyName("$f64".into())));
            assert_eq!(reader.next_token().unwrap(), Some(Token::Text(payload.into())));
            assert_eq!(reader.next_token().unwrap(), Some(Token::EndObject));
        }
        assert_eq!(reader.next_token().unwrap(), Some(Token::EndArray));
        reader.finish().unwrap();
    }

    #[test]
    fn test_timestamp_detection() {
        let mut reader =
            JsonReader::from_str(r#""2024-01-15T10:30:00Z""#).with_timestamp_detection(true);
        assert_eq!(reader.peek().unwrap(), Some(TokenKind::Timestamp));

        let mut reader = JsonReader::from_str(r#""2024-01-15T10:30:00Z""#);
        assert_eq!(reader.peek().unwrap(), Some(TokenKind::Text));
    }

    #[test]
    fn test_location_tracks_lines() {
        let mut reader = JsonReader::from_str("{\n  \"a\": 1\n}");
        reader.next_token().unwrap();
        reader.peek().unwrap();
        assert_eq!(reader.location(), Location::Text { line: 2, column: 3 });
    }

    #[test]
    fn test_syntax_errors() {
        let err = tokens(r#"{"a" 1}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);

        let err = tokens("[1 2]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);

        let err = tokens("[1,").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);

        let err = tokens("1 2").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);

        let err = tokens(r#"{"$bytes":"%%%"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }
}
