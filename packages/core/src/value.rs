//! The Value type - the decoded payload stored at one key.
//!
//! Every stored value starts with a one-byte tag:
//!
//! | Tag | Meaning | Payload |
//! |-----|---------|---------|
//! | `A` | array header | decimal child count |
//! | `O` | object header | decimal child count |
//! | `S` | string | UTF-8 text |
//! | `N` | number | JSON number text |
//! | `B` | boolean | `true` / `false` |
//! | `Z` | null | empty |

use std::fmt;

use bytes::Bytes;

/// Errors from decoding a stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The stored bytes are empty.
    Empty,
    /// The first byte is not a known tag.
    UnknownTag(u8),
    /// A container header carries a non-numeric size.
    InvalidSize(String),
    /// A scalar payload does not match its tag.
    InvalidPayload { tag: char, message: String },
    /// A directory or wildcard read found a scalar.
    NotAContainer(u8),
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueError::Empty => write!(f, "empty value"),
            ValueError::UnknownTag(tag) => write!(f, "unknown value tag {:#04x}", tag),
            ValueError::InvalidSize(size) => write!(f, "invalid container size '{}'", size),
            ValueError::InvalidPayload { tag, message } => {
                write!(f, "invalid '{}' payload: {}", tag, message)
            }
            ValueError::NotAContainer(tag) => {
                write!(f, "expected a container header, found tag {:#04x}", tag)
            }
        }
    }
}

impl std::error::Error for ValueError {}

/// The two container shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Array,
    Object,
}

impl ContainerKind {
    fn tag(self) -> u8 {
        match self {
            ContainerKind::Array => b'A',
            ContainerKind::Object => b'O',
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'A' => Some(ContainerKind::Array),
            b'O' => Some(ContainerKind::Object),
            _ => None,
        }
    }
}

/// Type tag of a decoded value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    String,
    Number,
    Boolean,
    Array,
    Object,
    Range,
}

/// A number kept as its JSON text, so nothing is lost between load and dump.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Number(String);

impl Number {
    /// Validate JSON number syntax. The value must also be a finite `f64`.
    pub fn parse(text: &str) -> Result<Self, ValueError> {
        let invalid = |message: String| ValueError::InvalidPayload { tag: 'N', message };
        if !is_json_number(text) {
            return Err(invalid(format!("'{}' is not a number", text)));
        }
        if !text.parse::<f64>().is_ok_and(f64::is_finite) {
            return Err(invalid(format!("'{}' is out of range", text)));
        }
        Ok(Number(text.to_string()))
    }

    /// Build from a float. `None` for NaN and infinities.
    pub fn from_f64(f: f64) -> Option<Self> {
        if !f.is_finite() {
            return None;
        }
        let text = f.to_string();
        Number::parse(&text).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Number(v.to_string())
    }
}

impl From<u64> for Number {
    fn from(v: u64) -> Self {
        Number(v.to_string())
    }
}

impl From<i32> for Number {
    fn from(v: i32) -> Self {
        Number(v.to_string())
    }
}

fn is_json_number(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    let digits = |i: &mut usize| {
        let start = *i;
        while *i < bytes.len() && bytes[*i].is_ascii_digit() {
            *i += 1;
        }
        *i > start
    };

    if bytes.get(i) == Some(&b'-') {
        i += 1;
    }
    match bytes.get(i) {
        Some(b'0') => i += 1,
        Some(b'1'..=b'9') => {
            digits(&mut i);
        }
        _ => return false,
    }
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        if !digits(&mut i) {
            return false;
        }
    }
    if matches!(bytes.get(i), Some(b'e') | Some(b'E')) {
        i += 1;
        if matches!(bytes.get(i), Some(b'+') | Some(b'-')) {
            i += 1;
        }
        if !digits(&mut i) {
            return false;
        }
    }
    i == bytes.len()
}

/// The decoded entry at one key.
///
/// Containers carry only their declared child count; the children live at
/// their own keys. `Range` is what a wildcard read yields: the container
/// it selects, standing for all of its children.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Null,
    String(String),
    Number(Number),
    Boolean(bool),
    Array(usize),
    Object(usize),
    Range(ContainerKind, usize),
}

impl Value {
    /// A container header.
    pub fn header(kind: ContainerKind, size: usize) -> Self {
        match kind {
            ContainerKind::Array => Value::Array(size),
            ContainerKind::Object => Value::Object(size),
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::String(_) => ValueType::String,
            Value::Number(_) => ValueType::Number,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Array(_) => ValueType::Array,
            Value::Object(_) => ValueType::Object,
            Value::Range(..) => ValueType::Range,
        }
    }

    /// The container shape, for headers and ranges.
    pub fn container_kind(&self) -> Option<ContainerKind> {
        match self {
            Value::Array(_) => Some(ContainerKind::Array),
            Value::Object(_) => Some(ContainerKind::Object),
            Value::Range(kind, _) => Some(*kind),
            _ => None,
        }
    }

    /// The declared child count, for headers and ranges.
    pub fn size(&self) -> Option<usize> {
        match self {
            Value::Array(n) | Value::Object(n) | Value::Range(_, n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        self.container_kind().is_some()
    }

    pub fn is_scalar(&self) -> bool {
        !self.is_container()
    }

    /// Encode into stored bytes.
    pub fn encode(&self) -> Bytes {
        let mut out = Vec::new();
        match self {
            Value::Null => out.push(b'Z'),
            Value::String(s) => {
                out.push(b'S');
                out.extend_from_slice(s.as_bytes());
            }
            Value::Number(n) => {
                out.push(b'N');
                out.extend_from_slice(n.as_str().as_bytes());
            }
            Value::Boolean(b) => {
                out.push(b'B');
                out.extend_from_slice(if *b { b"true" } else { b"false" });
            }
            Value::Array(n) => encode_header(&mut out, ContainerKind::Array, *n),
            Value::Object(n) => encode_header(&mut out, ContainerKind::Object, *n),
            Value::Range(kind, n) => encode_header(&mut out, *kind, *n),
        }
        Bytes::from(out)
    }

    /// Decode stored bytes.
    ///
    /// With `is_directory` or `is_wildcard` set the bytes must hold a
    /// container header; a wildcard yields `Range`. Otherwise the tag alone
    /// decides, so a plain read of a header yields `Array` or `Object`.
    pub fn decode(bytes: &[u8], is_directory: bool, is_wildcard: bool) -> Result<Value, ValueError> {
        let (&tag, payload) = bytes.split_first().ok_or(ValueError::Empty)?;

        if let Some(kind) = ContainerKind::from_tag(tag) {
            let text = String::from_utf8_lossy(payload);
            if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ValueError::InvalidSize(text.to_string()));
            }
            let size: usize = text
                .parse()
                .map_err(|_| ValueError::InvalidSize(text.to_string()))?;
            return Ok(if is_wildcard {
                Value::Range(kind, size)
            } else {
                Value::header(kind, size)
            });
        }

        if is_directory || is_wildcard {
            return Err(match tag {
                b'S' | b'N' | b'B' | b'Z' => ValueError::NotAContainer(tag),
                other => ValueError::UnknownTag(other),
            });
        }

        let text = || {
            std::str::from_utf8(payload).map_err(|_| ValueError::InvalidPayload {
                tag: tag as char,
                message: "not valid UTF-8".to_string(),
            })
        };

        match tag {
            b'S' => Ok(Value::String(text()?.to_string())),
            b'N' => Ok(Value::Number(Number::parse(text()?)?)),
            b'B' => match payload {
                b"true" => Ok(Value::Boolean(true)),
                b"false" => Ok(Value::Boolean(false)),
                _ => Err(ValueError::InvalidPayload {
                    tag: 'B',
                    message: format!("'{}' is not a boolean", String::from_utf8_lossy(payload)),
                }),
            },
            b'Z' if payload.is_empty() => Ok(Value::Null),
            b'Z' => Err(ValueError::InvalidPayload {
                tag: 'Z',
                message: "null carries no payload".to_string(),
            }),
            other => Err(ValueError::UnknownTag(other)),
        }
    }
}

fn encode_header(out: &mut Vec<u8>, kind: ContainerKind, size: usize) {
    out.push(kind.tag());
    out.extend_from_slice(size.to_string().as_bytes());
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Array(n) => write!(f, "array[{}]", n),
            Value::Object(n) => write!(f, "object[{}]", n),
            Value::Range(kind, n) => write!(f, "range({:?}, {})", kind, n),
        }
    }
}

// Conversion from common types

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v.into())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(v.into())
    }
}

impl From<Number> for Value {
    fn from(v: Number) -> Self {
        Value::Number(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}
