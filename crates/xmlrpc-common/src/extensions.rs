//! Extension compliance checks.
//!
//! The type registry already refuses to serialize an extension value while
//! extensions are disabled, but only when it reaches that value. These
//! checks walk whole parameter lists and results up front so that a plain
//! array hiding one extension leaf is rejected before any bytes are written.

use crate::config::StreamConfig;
use crate::protocol::error::{Result, XmlRpcError};
use crate::value::Value;

/// Fails with [`XmlRpcError::ExtensionRequired`] if `value`, or anything
/// nested in it, needs extensions that `config` does not enable.
pub fn check_value(config: &StreamConfig, value: &Value) -> Result<()> {
    if config.enabled_for_extensions {
        return Ok(());
    }
    match value.find_extension() {
        Some(found) => Err(XmlRpcError::ExtensionRequired(found.type_name())),
        None => Ok(()),
    }
}

/// Applies [`check_value`] to every parameter in order.
pub fn check_params(config: &StreamConfig, params: &[Value]) -> Result<()> {
    params.iter().try_for_each(|param| check_value(config, param))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_nested_extension_leaf_is_found() {
        let mut members = BTreeMap::new();
        members.insert("inner".to_string(), Value::Array(vec![Value::Int(1), Value::Float(0.5)]));
        let params = vec![Value::from("ok"), Value::Struct(members)];

        let err = check_params(&StreamConfig::default(), &params).unwrap_err();
        assert!(matches!(err, XmlRpcError::ExtensionRequired("float")));
        assert!(check_params(&StreamConfig::default().with_extensions(true), &params).is_ok());
    }

    #[test]
    fn test_plain_values_pass() {
        let params = vec![Value::Int(1), Value::Array(vec![Value::Bool(true)])];
        assert!(check_params(&StreamConfig::default(), &params).is_ok());
    }
}
