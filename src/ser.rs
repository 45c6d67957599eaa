//! Token stream → JSON text.
//!
//! This module provides [`JsonWriter`], the [`TokenWrite`] implementation behind the
//! crate-level `to_string` family.
//!
//! ## Overview
//!
//! - **Compact or pretty**: pretty output breaks non-empty containers over lines
//! - **Typed floats**: floats always carry a fraction or exponent (`3.0`, `1e16`) so a
//!   reader can tell them from integers
//! - **Envelopes**: bytes, timestamps and non-finite floats are written as
//!   `{"$bytes":"<base64>"}`, `{"$timestamp":"<rfc3339>"}` and `{"$f64":"NaN"}`
//!
//! ## Direct Usage
//!
//! ```rust
//! use serde_dataset::{JsonWriter, Scalar, TokenWrite};
//!
//! let mut writer = JsonWriter::new();
//! writer.write_start_object().unwrap();
//! writer.write_property_name("Price").unwrap();
//! writer.write_value(Scalar::Float(3.0)).unwrap();
//! writer.write_property_name("Blob").unwrap();
//! writer.write_value(Scalar::Bytes(&[1, 2])).unwrap();
//! writer.write_end_object().unwrap();
//!
//! assert_eq!(writer.into_inner(), r#"{"Price":3.0,"Blob":{"$bytes":"AQI="}}"#);
//! ```

use crate::token::{
    encode_bytes, format_timestamp, non_finite_name, BYTES_ENVELOPE, FLOAT_ENVELOPE,
    TIMESTAMP_ENVELOPE,
};
use crate::{Error, Result, Scalar, TokenWrite};

#[derive(Clone, Copy, Debug)]
struct Frame {
    is_object: bool,
    count: usize,
}

/// The JSON writer.
///
/// Created via [`JsonWriter::new`] (compact) or [`JsonWriter::pretty`].
pub struct JsonWriter {
    output: String,
    pretty: bool,
    indent: usize,
    stack: Vec<Frame>,
    after_name: bool,
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonWriter {
    #[must_use]
    pub fn new() -> Self {
        // typical single-table change sets fit without reallocating
        JsonWriter {
            output: String::with_capacity(256),
            pretty: false,
            indent: 2,
            stack: Vec::new(),
            after_name: false,
        }
    }

    /// A writer that breaks containers over lines, indenting `indent` spaces per level.
    #[must_use]
    pub fn pretty(indent: usize) -> Self {
        JsonWriter {
            pretty: true,
            indent,
            ..Self::new()
        }
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.output
    }

    fn write_newline(&mut self) {
        if self.pretty {
            self.output.push('\n');
            let width = self.stack.len() * self.indent;
            self.output.extend(std::iter::repeat(' ').take(width));
        }
    }

    /// Separator and indentation before a value or property name.
    fn before_item(&mut self) {
        if self.after_name {
            self.after_name = false;
            return;
        }
        let count = match self.stack.last_mut() {
            Some(frame) => {
                frame.count += 1;
                frame.count
            }
            None => return,
        };
        if count > 1 {
            self.output.push(',');
        }
        self.write_newline();
    }

    fn open(&mut self, is_object: bool) {
        self.before_item();
        self.output.push(if is_object { '{' } else { '[' });
        self.stack.push(Frame {
            is_object,
            count: 0,
        });
    }

    fn close(&mut self, is_object: bool) -> Result<()> {
        match self.stack.pop() {
            Some(frame) if frame.is_object == is_object && !self.after_name => {
                if frame.count > 0 {
                    self.write_newline();
                }
                self.output.push(if is_object { '}' } else { ']' });
                Ok(())
            }
            _ => Err(Error::custom(format!(
                "unbalanced {} in JSON output",
                if is_object { "end of object" } else { "end of array" }
            ))),
        }
    }

    fn write_string(&mut self, s: &str) {
        self.output.push('"');
        for ch in s.chars() {
            match ch {
                '"' => self.output.push_str("\\\""),
                '\\' => self.output.push_str("\\\\"),
                '\n' => self.output.push_str("\\n"),
                '\r' => self.output.push_str("\\r"),
                '\t' => self.output.push_str("\\t"),
                '\u{0008}' => self.output.push_str("\\b"), // backspace
                '\u{000C}' => self.output.push_str("\\f"), // form feed
                c if (c as u32) < 0x20 => {
                    self.output.push_str(&format!("\\u{:04x}", c as u32));
                }
                _ => self.output.push(ch),
            }
        }
        self.output.push('"');
    }

    fn write_envelope(&mut self, name: &str, payload: &str) {
        self.output.push('{');
        self.write_string(name);
        self.output.push(':');
        if self.pretty {
            self.output.push(' ');
        }
        self.write_string(payload);
        self.output.push('}');
    }
}

impl TokenWrite for JsonWriter {
    fn write_start_object(&mut self) -> Result<()> {
        self.open(true);
        Ok(())
    }

    fn write_end_object(&mut self) -> Result<()> {
        self.close(true)
    }

    fn write_start_array(&mut self) -> Result<()> {
        self.open(false);
        Ok(())
    }

    fn write_end_array(&mut self) -> Result<()> {
        self.close(false)
    }

    fn write_property_name(&mut self, name: &str) -> Result<()> {
        match self.stack.last() {
            Some(frame) if frame.is_object && !self.after_name => {}
            _ => return Err(Error::custom("property name outside of an object")),
        }
        self.before_item();
        self.write_string(name);
        self.output.push(':');
        if self.pretty {
            self.output.push(' ');
        }
        self.after_name = true;
        Ok(())
    }

    fn write_value(&mut self, value: Scalar<'_>) -> Result<()> {
        self.before_item();
        match value {
            Scalar::Integer(i) => self.output.push_str(&i.to_string()),
            Scalar::Boolean(b) => self.output.push_str(if b { "true" } else { "false" }),
            Scalar::Float(f) => match non_finite_name(f) {
                Some(name) => self.write_envelope(FLOAT_ENVELOPE, name),
                // Debug keeps ".0" on whole numbers and switches to exponents at the extremes
                None => self.output.push_str(&format!("{:?}", f)),
            },
            Scalar::Text(s) => self.write_string(s),
            Scalar::Timestamp(ts) => self.write_envelope(TIMESTAMP_ENVELOPE, &format_timestamp(ts)),
            Scalar::Bytes(b) => self.write_envelope(BYTES_ENVELOPE, &encode_bytes(b)),
        }
        Ok(())
    }

    fn write_null(&mut self) -> Result<()> {
        self.before_item();
        self.output.push_str("null");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JsonReader, Token, TokenRead};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_compact_output() {
        let mut writer = JsonWriter::new();
        writer.write_start_array().unwrap();
        writer.write_start_object().unwrap();
        writer.write_property_name("a").unwrap();
        writer.write_null().unwrap();
        writer.write_property_name("b").unwrap();
        writer.write_start_object().unwrap();
        writer.write_end_object().unwrap();
        writer.write_end_object().unwrap();
        writer.write_value(Scalar::Text("q\"uote\n")).unwrap();
        writer.write_end_array().unwrap();

        assert_eq!(writer.into_inner(), r#"[{"a":null,"b":{}},"q\"uote\n"]"#);
    }

    #[test]
    fn test_pretty_output() {
        let mut writer = JsonWriter::pretty(2);
        writer.write_start_object().unwrap();
        writer.write_property_name("Orders").unwrap();
        writer.write_start_array().unwrap();
        writer.write_value(Scalar::Integer(1)).unwrap();
        writer.write_value(Scalar::Integer(2)).unwrap();
        writer.write_end_array().unwrap();
        writer.write_property_name("Empty").unwrap();
        writer.write_start_array().unwrap();
        writer.write_end_array().unwrap();
        writer.write_end_object().unwrap();

        assert_eq!(
            writer.into_inner(),
            "{\n  \"Orders\": [\n    1,\n    2\n  ],\n  \"Empty\": []\n}"
        );
    }

    #[test]
    fn test_floats_stay_floats() {
        let mut writer = JsonWriter::new();
        writer.write_start_array().unwrap();
        for f in [3.0, 0.1, 1e16, -2.5e-8, f64::NAN] {
            writer.write_value(Scalar::Float(f)).unwrap();
        }
        writer.write_end_array().unwrap();
        let json = writer.into_inner();

        let mut reader = JsonReader::from_str(&json);
        assert_eq!(reader.next_token().unwrap(), Some(Token::StartArray));
        assert_eq!(reader.next_token().unwrap(), Some(Token::Float(3.0)));
        assert_eq!(reader.next_token().unwrap(), Some(Token::Float(0.1)));
        assert_eq!(reader.next_token().unwrap(), Some(Token::Float(1e16)));
        assert_eq!(reader.next_token().unwrap(), Some(Token::Float(-2.5e-8)));
        match reader.next_token().unwrap() {
            Some(Token::Float(f)) => assert!(f.is_nan()),
            other => panic!("Expected NaN, got {:?}", other),
        }
    }

    #[test]
    fn test_timestamp_envelope() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let mut writer = JsonWriter::new();
        writer.write_value(Scalar::Timestamp(&ts)).unwrap();
        assert_eq!(
            writer.into_inner(),
            r#"{"$timestamp":"2024-01-15T10:30:00Z"}"#
        );
    }

    #[test]
    fn test_unbalanced_is_rejected() {
        let mut writer = JsonWriter::new();
        writer.write_start_array().unwrap();
        assert!(writer.write_end_object().is_err());
        assert!(JsonWriter::new().write_property_name("x").is_err());
    }
}
