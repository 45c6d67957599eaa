//! Serde support for [`Table`] and [`Dataset`].
//!
//! Both types serialize to the same shape the table and dataset codecs write, through any
//! serde data format. The codec output is captured in a [`TokenBuffer`], turned into a
//! small tree, and the tree is handed to the serializer; deserializing walks the tree back
//! into the codecs as tokens. Timestamps, byte blobs and non-finite floats travel as the
//! single-entry envelope maps `{"$timestamp": ..}`, `{"$bytes": ..}` and `{"$f64": ..}`;
//! such a map is read back as a scalar only where a cell value may appear.
//!
//! ```rust
//! use serde_dataset::{row, Table};
//!
//! let mut table = Table::new("");
//! table.insert_row(row! { "IdTest" => 4 }).unwrap();
//!
//! let json = serde_json::to_string(&table).unwrap();
//! assert_eq!(
//!     json,
//!     r#"[{"Props":{"RowState":"Added"},"Data":{"Original":{},"Current":{"IdTest":4}}}]"#
//! );
//! let back: Table = serde_json::from_str(&json).unwrap();
//! assert_eq!(back, table);
//! ```
//!
//! A deserialized table has no name; tables inside a deserialized dataset are named by
//! their keys.

use crate::token::{
    encode_bytes, format_timestamp, is_envelope, non_finite_name, unwrap_envelope,
    BYTES_ENVELOPE, FLOAT_ENVELOPE, TIMESTAMP_ENVELOPE,
};
use crate::{
    Dataset, DatasetCodec, Error, Location, Result, Table, TableCodec, Token, TokenBuffer,
    TokenKind, TokenRead,
};
use chrono::{DateTime, Utc};
use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::fmt;

/// A token stream folded into a tree, the form serde formats consume.
#[derive(Clone, Debug, PartialEq)]
enum Node {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Bytes(Vec<u8>),
    Array(Vec<Node>),
    Object(Vec<(String, Node)>),
}

impl Node {
    fn read<R: TokenRead + ?Sized>(reader: &mut R) -> Result<Node> {
        let token = reader
            .next_token()?
            .ok_or_else(|| Error::unexpected_eof(reader.location(), "value"))?;
        Ok(match token {
            Token::Null => Node::Null,
            Token::Boolean(b) => Node::Bool(b),
            Token::Integer(i) => Node::Integer(i),
            Token::Float(f) => Node::Float(f),
            Token::Text(s) => Node::Text(s),
            Token::Timestamp(ts) => Node::Timestamp(ts),
            Token::Bytes(b) => Node::Bytes(b),
            Token::StartArray => {
                let mut items = Vec::new();
                while reader.peek()? != Some(TokenKind::EndArray) {
                    items.push(Node::read(reader)?);
                }
                reader.next_token()?;
                Node::Array(items)
            }
            Token::StartObject => {
                let mut entries = Vec::new();
                loop {
                    match reader.next_token()? {
                        Some(Token::PropertyName(name)) => {
                            let value = Node::read(reader)?;
                            entries.push((name, value));
                        }
                        Some(Token::EndObject) => break,
                        _ => {
                            return Err(Error::protocol(
                                reader.location(),
                                "PropertyName or EndObject",
                                "a value",
                            ))
                        }
                    }
                }
                Node::Object(entries)
            }
            other => {
                return Err(Error::protocol(
                    reader.location(),
                    "value",
                    other.kind().as_str(),
                ))
            }
        })
    }
}

fn serialize_envelope<S: Serializer>(serializer: S, name: &str, payload: &str) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(name, payload)?;
    map.end()
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Node::Null => serializer.serialize_unit(),
            Node::Bool(b) => serializer.serialize_bool(*b),
            Node::Integer(i) => serializer.serialize_i64(*i),
            Node::Float(f) => match non_finite_name(*f) {
                Some(name) => serialize_envelope(serializer, FLOAT_ENVELOPE, name),
                None => serializer.serialize_f64(*f),
            },
            Node::Text(s) => serializer.serialize_str(s),
            Node::Timestamp(ts) => {
                serialize_envelope(serializer, TIMESTAMP_ENVELOPE, &format_timestamp(ts))
            }
            Node::Bytes(b) => serialize_envelope(serializer, BYTES_ENVELOPE, &encode_bytes(b)),
            Node::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Node::Object(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct NodeVisitor;

        impl<'de> Visitor<'de> for NodeVisitor {
            type Value = Node;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a table or dataset value")
            }

            fn visit_bool<E>(self, value: bool) -> std::result::Result<Self::Value, E> {
                Ok(Node::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> std::result::Result<Self::Value, E> {
                Ok(Node::Integer(value))
            }

            fn visit_u64<E>(self, value: u64) -> std::result::Result<Self::Value, E> {
                if value <= i64::MAX as u64 {
                    Ok(Node::Integer(value as i64))
                } else {
                    Ok(Node::Float(value as f64))
                }
            }

            fn visit_f64<E>(self, value: f64) -> std::result::Result<Self::Value, E> {
                Ok(Node::Float(value))
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E> {
                Ok(Node::Text(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> std::result::Result<Self::Value, E> {
                Ok(Node::Text(value))
            }

            fn visit_bytes<E>(self, value: &[u8]) -> std::result::Result<Self::Value, E> {
                Ok(Node::Bytes(value.to_vec()))
            }

            fn visit_unit<E>(self) -> std::result::Result<Self::Value, E> {
                Ok(Node::Null)
            }

            fn visit_none<E>(self) -> std::result::Result<Self::Value, E> {
                Ok(Node::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut items = Vec::new();
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Node::Array(items))
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut entries: Vec<(String, Node)> = Vec::new();
                while let Some((key, value)) = map.next_entry()? {
                    entries.push((key, value));
                }
                Ok(Node::Object(entries))
            }
        }

        deserializer.deserialize_any(NodeVisitor)
    }
}

/// The scalar an envelope map stands for, `None` for any other node.
fn collapse(node: &Node) -> Result<Option<Token>> {
    match node {
        Node::Object(entries) => match entries.as_slice() {
            [(name, Node::Text(payload))] if is_envelope(name) => {
                unwrap_envelope(name, payload).map(Some)
            }
            _ => Ok(None),
        },
        _ => Ok(None),
    }
}

enum Cursor<'a> {
    Array(std::slice::Iter<'a, Node>),
    Object {
        entries: std::slice::Iter<'a, (String, Node)>,
        value: Option<&'a Node>,
    },
}

enum Step<'a> {
    Value(&'a Node),
    Name(&'a str),
    Close(Token),
}

/// Walks a node tree as a token stream.
///
/// Envelope maps read as scalars, except through [`TokenRead::next_object`] where the
/// codec needs an object.
struct NodeReader<'a> {
    root: Option<&'a Node>,
    stack: Vec<Cursor<'a>>,
    /// The peeked token, with the envelope node it was collapsed from.
    peeked: Option<(Token, Option<&'a Node>)>,
    consumed: usize,
}

impl<'a> NodeReader<'a> {
    fn new(root: &'a Node) -> Self {
        NodeReader {
            root: Some(root),
            stack: Vec::new(),
            peeked: None,
            consumed: 0,
        }
    }

    fn step(&mut self) -> Option<Step<'a>> {
        let step = match self.stack.last_mut() {
            None => return self.root.take().map(Step::Value),
            Some(Cursor::Array(items)) => items.next().map(Step::Value),
            Some(Cursor::Object { entries, value }) => match value.take() {
                Some(node) => Some(Step::Value(node)),
                None => entries.next().map(|(name, node)| {
                    *value = Some(node);
                    Step::Name(name.as_str())
                }),
            },
        };
        step.or_else(|| match self.stack.pop() {
            Some(Cursor::Array(_)) => Some(Step::Close(Token::EndArray)),
            Some(Cursor::Object { .. }) => Some(Step::Close(Token::EndObject)),
            None => None,
        })
    }

    fn open(&mut self, node: &'a Node) -> Token {
        match node {
            Node::Null => Token::Null,
            Node::Bool(b) => Token::Boolean(*b),
            Node::Integer(i) => Token::Integer(*i),
            Node::Float(f) => Token::Float(*f),
            Node::Text(s) => Token::Text(s.clone()),
            Node::Timestamp(ts) => Token::Timestamp(*ts),
            Node::Bytes(b) => Token::Bytes(b.clone()),
            Node::Array(items) => {
                self.stack.push(Cursor::Array(items.iter()));
                Token::StartArray
            }
            Node::Object(entries) => {
                self.stack.push(Cursor::Object {
                    entries: entries.iter(),
                    value: None,
                });
                Token::StartObject
            }
        }
    }

    fn read(&mut self, raw: bool) -> Result<Option<(Token, Option<&'a Node>)>> {
        let node = match self.step() {
            None => return Ok(None),
            Some(Step::Name(name)) => return Ok(Some((Token::PropertyName(name.to_string()), None))),
            Some(Step::Close(token)) => return Ok(Some((token, None))),
            Some(Step::Value(node)) => node,
        };
        if !raw {
            if let Some(token) = collapse(node)? {
                return Ok(Some((token, Some(node))));
            }
        }
        Ok(Some((self.open(node), None)))
    }
}

impl TokenRead for NodeReader<'_> {
    fn peek(&mut self) -> Result<Option<TokenKind>> {
        if self.peeked.is_none() {
            self.peeked = self.read(false)?;
        }
        Ok(self.peeked.as_ref().map(|(token, _)| token.kind()))
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        let next = match self.peeked.take() {
            Some(peeked) => Some(peeked),
            None => self.read(false)?,
        };
        if next.is_some() {
            self.consumed += 1;
        }
        Ok(next.map(|(token, _)| token))
    }

    fn next_object(&mut self) -> Result<Option<Token>> {
        let next = match self.peeked.take() {
            Some((_, Some(envelope))) => Some((self.open(envelope), None)),
            Some(peeked) => Some(peeked),
            None => self.read(true)?,
        };
        if next.is_some() {
            self.consumed += 1;
        }
        Ok(next.map(|(token, _)| token))
    }

    fn location(&self) -> Location {
        Location::Token(self.consumed.saturating_sub(1))
    }
}

fn encode_node(encode: impl FnOnce(&mut TokenBuffer) -> Result<()>) -> Result<Node> {
    let mut buffer = TokenBuffer::new();
    encode(&mut buffer)?;
    Node::read(&mut buffer)
}

fn decode_node<T>(node: &Node, decode: impl FnOnce(&mut NodeReader<'_>) -> Result<T>) -> Result<T> {
    decode(&mut NodeReader::new(node))
}

impl Serialize for Table {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let node = encode_node(|buffer| TableCodec::default().encode(self, buffer))
            .map_err(serde::ser::Error::custom)?;
        node.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Table {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let node = Node::deserialize(deserializer)?;
        decode_node(&node, |buffer| TableCodec::default().decode(buffer)).map_err(de::Error::custom)
    }
}

impl Serialize for Dataset {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let node = encode_node(|buffer| DatasetCodec::default().encode(self, buffer))
            .map_err(serde::ser::Error::custom)?;
        node.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Dataset {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let node = Node::deserialize(deserializer)?;
        decode_node(&node, |buffer| DatasetCodec::default().decode(buffer))
            .map_err(de::Error::custom)
    }
}
