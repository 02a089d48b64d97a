use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::NaiveDateTime;

use crate::protocol::error::{Result, XmlRpcError};
use crate::value::Value;

/// `strftime` pattern of `dateTime.iso8601` values (`yyyyMMdd'T'HH:mm:ss`).
pub const DATE_TIME_FORMAT: &str = "%Y%m%dT%H:%M:%S";

/// How a resolved tag is parsed.
///
/// Scalars terminate the recursion: their character data is converted in
/// one step once the closing tag arrives. Containers and nodes hand control
/// back to the [`ValueParser`](crate::parser::ValueParser) stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeParser {
    Scalar(ScalarKind),
    Array,
    Struct,
    Node,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Bool,
    Int,
    I1,
    I2,
    I8,
    Double,
    Float,
    DateTime,
    Base64,
    Serializable,
    Nil,
}

impl ScalarKind {
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Bool => "boolean",
            ScalarKind::Int => "int",
            ScalarKind::I1 => "i1",
            ScalarKind::I2 => "i2",
            ScalarKind::I8 => "i8",
            ScalarKind::Double => "double",
            ScalarKind::Float => "float",
            ScalarKind::DateTime => "dateTime.iso8601",
            ScalarKind::Base64 => "base64",
            ScalarKind::Serializable => "serializable",
            ScalarKind::Nil => "nil",
        }
    }

    /// Converts accumulated character data to a typed value.
    ///
    /// Numeric, boolean and date literals that do not parse fail with
    /// [`XmlRpcError::MalformedValue`]; nothing is coerced.
    pub fn parse(self, text: &str) -> Result<Value> {
        let kind = self.name();
        let trimmed = text.trim();
        let value = match self {
            ScalarKind::String => Value::String(text.to_string()),
            ScalarKind::Bool => match trimmed {
                "1" => Value::Bool(true),
                "0" => Value::Bool(false),
                other => return Err(XmlRpcError::malformed(kind, format!("expected 0 or 1, got '{}'", other))),
            },
            ScalarKind::Int => Value::Int(parse_number(kind, trimmed)?),
            ScalarKind::I1 => Value::I1(parse_number(kind, trimmed)?),
            ScalarKind::I2 => Value::I2(parse_number(kind, trimmed)?),
            ScalarKind::I8 => Value::I8(parse_number(kind, trimmed)?),
            ScalarKind::Double => Value::Double(parse_number(kind, trimmed)?),
            ScalarKind::Float => Value::Float(parse_number(kind, trimmed)?),
            ScalarKind::DateTime => Value::DateTime(
                NaiveDateTime::parse_from_str(trimmed, DATE_TIME_FORMAT)
                    .map_err(|e| XmlRpcError::malformed(kind, format!("'{}': {}", trimmed, e)))?,
            ),
            ScalarKind::Base64 => Value::Base64(decode_base64(kind, text)?),
            ScalarKind::Serializable => Value::Serializable(decode_base64(kind, text)?),
            ScalarKind::Nil => {
                if !trimmed.is_empty() {
                    return Err(XmlRpcError::malformed(kind, "nil must be empty"));
                }
                Value::Nil
            }
        };
        Ok(value)
    }
}

fn parse_number<T>(kind: &'static str, text: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    text.parse::<T>()
        .map_err(|e| XmlRpcError::malformed(kind, format!("'{}': {}", text, e)))
}

fn decode_base64(kind: &'static str, text: &str) -> Result<Vec<u8>> {
    // line breaks are allowed inside encoded data
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| XmlRpcError::malformed(kind, e.to_string()))
}
