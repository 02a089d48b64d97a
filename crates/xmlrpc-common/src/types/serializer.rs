use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::io::Write;

use super::parser::DATE_TIME_FORMAT;
use super::registry::TypeRegistry;
use crate::config::StreamConfig;
use crate::protocol::error::{Result, XmlRpcError};
use crate::value::Value;
use crate::xml::{fragment, XmlWriter};

/// Writes one value as a `<value>` element.
///
/// Obtained from [`TypeRegistry::serializer_for`]. Container serializers ask
/// the same registry for each child's serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Serializer {
    String,
    Bool,
    Int,
    Double,
    DateTime,
    Base64,
    Array,
    Struct,
    Nil,
    I1,
    I2,
    I8,
    Float,
    Node,
    Serializable,
}

impl Serializer {
    /// Qualified tag written inside `<value>`; `None` for bare strings.
    pub fn tag(self) -> Option<&'static str> {
        let tag = match self {
            Serializer::String => return None,
            Serializer::Bool => "boolean",
            Serializer::Int => "int",
            Serializer::Double => "double",
            Serializer::DateTime => "dateTime.iso8601",
            Serializer::Base64 => "base64",
            Serializer::Array => "array",
            Serializer::Struct => "struct",
            Serializer::Nil => "ex:nil",
            Serializer::I1 => "ex:i1",
            Serializer::I2 => "ex:i2",
            Serializer::I8 => "ex:i8",
            Serializer::Float => "ex:float",
            Serializer::Node => "ex:dom",
            Serializer::Serializable => "ex:serializable",
        };
        Some(tag)
    }

    pub fn is_extension(self) -> bool {
        matches!(
            self,
            Serializer::Nil
                | Serializer::I1
                | Serializer::I2
                | Serializer::I8
                | Serializer::Float
                | Serializer::Node
                | Serializer::Serializable
        )
    }

    pub fn write<W: Write>(
        self,
        registry: &TypeRegistry,
        config: &StreamConfig,
        writer: &mut XmlWriter<W>,
        value: &Value,
    ) -> Result<()> {
        writer.start("value")?;
        match (self, value) {
            (Serializer::String, Value::String(s)) => writer.text(s)?,
            (Serializer::Bool, Value::Bool(b)) => {
                writer.element("boolean", if *b { "1" } else { "0" })?
            }
            (Serializer::Int, Value::Int(i)) => writer.element("int", &i.to_string())?,
            (Serializer::Double, Value::Double(d)) => writer.element("double", &d.to_string())?,
            (Serializer::DateTime, Value::DateTime(dt)) => {
                writer.element("dateTime.iso8601", &dt.format(DATE_TIME_FORMAT).to_string())?
            }
            (Serializer::Base64, Value::Base64(bytes)) => {
                writer.element("base64", &STANDARD.encode(bytes))?
            }
            (Serializer::Array, Value::Array(items)) => {
                writer.start("array")?;
                writer.start("data")?;
                for item in items {
                    registry
                        .serializer_for(config, item)?
                        .write(registry, config, writer, item)?;
                }
                writer.end("data")?;
                writer.end("array")?;
            }
            (Serializer::Struct, Value::Struct(members)) => {
                writer.start("struct")?;
                for (name, member) in members {
                    writer.start("member")?;
                    writer.element("name", name)?;
                    registry
                        .serializer_for(config, member)?
                        .write(registry, config, writer, member)?;
                    writer.end("member")?;
                }
                writer.end("struct")?;
            }
            (Serializer::Nil, Value::Nil) => writer.empty("ex:nil")?,
            (Serializer::I1, Value::I1(i)) => writer.element("ex:i1", &i.to_string())?,
            (Serializer::I2, Value::I2(i)) => writer.element("ex:i2", &i.to_string())?,
            (Serializer::I8, Value::I8(i)) => writer.element("ex:i8", &i.to_string())?,
            (Serializer::Float, Value::Float(f)) => writer.element("ex:float", &f.to_string())?,
            (Serializer::Node, Value::ExternalNode(fragment)) => {
                let canonical = fragment::canonicalize(fragment)?;
                writer.start("ex:dom")?;
                writer.raw(&canonical)?;
                writer.end("ex:dom")?;
            }
            (Serializer::Serializable, Value::Serializable(bytes)) => {
                writer.element("ex:serializable", &STANDARD.encode(bytes))?
            }
            (serializer, value) => {
                return Err(XmlRpcError::UnsupportedType(format!(
                    "{:?} serializer cannot write a {} value",
                    serializer,
                    value.type_name()
                )))
            }
        }
        writer.end("value")?;
        Ok(())
    }
}
