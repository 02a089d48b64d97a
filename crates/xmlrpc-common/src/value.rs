//! XML-RPC Value Model
//!
//! [`Value`] is the tagged union every parameter and result is built from.
//! The base variants are understood by every XML-RPC peer. The extension
//! variants (`Nil`, `I1`, `I2`, `I8`, `Float`, `ExternalNode`,
//! `Serializable`) only travel when the active [`StreamConfig`] has
//! extensions enabled.
//!
//! Native Rust values convert by exact type: an `i8` always becomes
//! [`Value::I1`], never a range-fitted `Int`.
//!
//! [`StreamConfig`]: crate::config::StreamConfig

use chrono::NaiveDateTime;
use std::collections::BTreeMap;

/// A single XML-RPC value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `<ex:nil/>` (extension)
    Nil,
    /// Bare character data or `<string>`
    String(String),
    /// `<boolean>` encoded as `0`/`1`
    Bool(bool),
    /// `<int>` / `<i4>`
    Int(i32),
    /// `<double>`
    Double(f64),
    /// `<dateTime.iso8601>` in `yyyyMMddTHH:mm:ss` form
    DateTime(NaiveDateTime),
    /// `<base64>`
    Base64(Vec<u8>),
    /// `<array><data>...</data></array>`
    Array(Vec<Value>),
    /// `<struct>`; member order is not significant
    Struct(BTreeMap<String, Value>),
    /// `<ex:i1>` (extension)
    I1(i8),
    /// `<ex:i2>` (extension)
    I2(i16),
    /// `<ex:i8>` (extension)
    I8(i64),
    /// `<ex:float>` (extension)
    Float(f32),
    /// `<ex:dom>` carrying an XML fragment (extension)
    ///
    /// The fragment is one self-contained element. It travels in canonical
    /// form: empty elements as `<a/>`, attributes kept, and only `<`, `>`
    /// and `&` escaped in text. Prefixes must be declared inside it.
    ExternalNode(String),
    /// `<ex:serializable>` carrying opaque bytes (extension)
    Serializable(Vec<u8>),
}

impl Value {
    /// Wire tag name of this value's representation.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::String(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "int",
            Value::Double(_) => "double",
            Value::DateTime(_) => "dateTime.iso8601",
            Value::Base64(_) => "base64",
            Value::Array(_) => "array",
            Value::Struct(_) => "struct",
            Value::I1(_) => "i1",
            Value::I2(_) => "i2",
            Value::I8(_) => "i8",
            Value::Float(_) => "float",
            Value::ExternalNode(_) => "dom",
            Value::Serializable(_) => "serializable",
        }
    }

    /// Whether this value itself (not its children) needs extensions.
    pub fn is_extension(&self) -> bool {
        matches!(
            self,
            Value::Nil
                | Value::I1(_)
                | Value::I2(_)
                | Value::I8(_)
                | Value::Float(_)
                | Value::ExternalNode(_)
                | Value::Serializable(_)
        )
    }

    /// Finds the first value in this tree that needs extensions, if any.
    ///
    /// Walks arrays and structs depth-first so that a plain container
    /// holding one extension leaf is reported.
    pub fn find_extension(&self) -> Option<&Value> {
        if self.is_extension() {
            return Some(self);
        }
        match self {
            Value::Array(items) => items.iter().find_map(Value::find_extension),
            Value::Struct(members) => members.values().find_map(Value::find_extension),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            Value::I1(i) => Some(i32::from(*i)),
            Value::I2(i) => Some(i32::from(*i)),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I8(i) => Some(*i),
            other => other.as_i32().map(i64::from),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Float(f) => Some(f64::from(*f)),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Struct(members) => Some(members),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::I1(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::I2(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I8(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Base64(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Struct(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Nil)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Struct(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
