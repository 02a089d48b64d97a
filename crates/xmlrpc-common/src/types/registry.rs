use std::collections::HashMap;

use super::parser::{ScalarKind, TypeParser};
use super::serializer::Serializer;
use crate::config::StreamConfig;
use crate::protocol::error::{Result, XmlRpcError};
use crate::value::Value;
use crate::xml::EXTENSIONS_URI;

/// Maps values to serializers and wire tags to parsers.
///
/// Built once and shared read-only between every concurrent call, usually
/// behind an `Arc`.
///
/// # Example
///
/// ```
/// use xmlrpc_common::{StreamConfig, TypeRegistry, Value};
///
/// let registry = TypeRegistry::new();
/// let config = StreamConfig::default();
///
/// assert!(registry.serializer_for(&config, &Value::Int(1)).is_ok());
/// // 8-bit integers only exist as an extension type
/// assert!(registry.serializer_for(&config, &Value::I1(1)).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    base: HashMap<&'static str, TypeParser>,
    extensions: HashMap<&'static str, TypeParser>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        let base = HashMap::from([
            ("int", TypeParser::Scalar(ScalarKind::Int)),
            ("i4", TypeParser::Scalar(ScalarKind::Int)),
            ("boolean", TypeParser::Scalar(ScalarKind::Bool)),
            ("string", TypeParser::Scalar(ScalarKind::String)),
            ("double", TypeParser::Scalar(ScalarKind::Double)),
            ("dateTime.iso8601", TypeParser::Scalar(ScalarKind::DateTime)),
            ("base64", TypeParser::Scalar(ScalarKind::Base64)),
            ("array", TypeParser::Array),
            ("struct", TypeParser::Struct),
        ]);
        let extensions = HashMap::from([
            ("nil", TypeParser::Scalar(ScalarKind::Nil)),
            ("i1", TypeParser::Scalar(ScalarKind::I1)),
            ("i2", TypeParser::Scalar(ScalarKind::I2)),
            ("i8", TypeParser::Scalar(ScalarKind::I8)),
            ("float", TypeParser::Scalar(ScalarKind::Float)),
            ("serializable", TypeParser::Scalar(ScalarKind::Serializable)),
            ("dom", TypeParser::Node),
        ]);
        Self { base, extensions }
    }

    /// Returns the serializer for `value`.
    ///
    /// Dispatch is by exact variant. Extension-only values fail with
    /// [`XmlRpcError::ExtensionRequired`] unless the config enables
    /// extensions; they are never downgraded to a base type.
    pub fn serializer_for(&self, config: &StreamConfig, value: &Value) -> Result<Serializer> {
        let serializer = match value {
            Value::String(_) => Serializer::String,
            Value::Bool(_) => Serializer::Bool,
            Value::Int(_) => Serializer::Int,
            Value::Double(_) => Serializer::Double,
            Value::DateTime(_) => Serializer::DateTime,
            Value::Base64(_) => Serializer::Base64,
            Value::Array(_) => Serializer::Array,
            Value::Struct(_) => Serializer::Struct,
            Value::Nil => Serializer::Nil,
            Value::I1(_) => Serializer::I1,
            Value::I2(_) => Serializer::I2,
            Value::I8(_) => Serializer::I8,
            Value::Float(_) => Serializer::Float,
            Value::ExternalNode(_) => Serializer::Node,
            Value::Serializable(_) => Serializer::Serializable,
        };

        if serializer.is_extension() && !config.enabled_for_extensions {
            return Err(XmlRpcError::ExtensionRequired(value.type_name()));
        }
        Ok(serializer)
    }

    /// Looks up the parser for a `(namespace, tag)` pair.
    ///
    /// Returns `None` for unknown pairs, and for every extension tag while
    /// extensions are disabled.
    pub fn parser_for(&self, config: &StreamConfig, namespace: &str, name: &str) -> Option<TypeParser> {
        if namespace.is_empty() {
            self.base.get(name).copied()
        } else if namespace == EXTENSIONS_URI && config.enabled_for_extensions {
            self.extensions.get(name).copied()
        } else {
            None
        }
    }

    /// Like [`parser_for`](Self::parser_for), but explains a miss.
    pub fn resolve(&self, config: &StreamConfig, namespace: &str, name: &str) -> Result<TypeParser> {
        if let Some(parser) = self.parser_for(config, namespace, name) {
            return Ok(parser);
        }
        if namespace == EXTENSIONS_URI {
            if let Some((&tag, _)) = self.extensions.get_key_value(name) {
                return Err(XmlRpcError::ExtensionRequired(tag));
            }
        }
        if namespace.is_empty() {
            Err(XmlRpcError::UnknownTag(name.to_string()))
        } else {
            Err(XmlRpcError::UnknownTag(format!("{{{}}}{}", namespace, name)))
        }
    }
}
