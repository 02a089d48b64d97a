//! XML-RPC Fault Types
//!
//! A fault is the application-level error a server returns in place of a
//! result. On the wire it is a struct with the reserved members `faultCode`
//! (int) and `faultString` (string) wrapped in a `<fault>` element.
//!
//! # Error Codes
//!
//! Codes follow the XML-RPC fault code interoperability table:
//! - `-32700`: Parse error (not well formed)
//! - `-32600`: Invalid request
//! - `-32601`: Requested method not found
//! - `-32602`: Invalid method parameters
//! - `-32603`: Internal error
//! - `-32500`: Application error
//! - `-32400`: System error
//! - `-32300`: Transport error
//!
//! Two codes in the system error range are added for conditions the table
//! does not name: `-32401` (not authorized) and `-32402` (extensions
//! required but not enabled).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::XmlRpcError;
use crate::value::Value;

/// Reserved struct member carrying the fault code
pub const FAULT_CODE: &str = "faultCode";
/// Reserved struct member carrying the fault message
pub const FAULT_STRING: &str = "faultString";

/// The request was not well-formed XML or contained a malformed value
pub const PARSE_ERROR: i32 = -32700;
/// The XML was well formed but not a valid method call
pub const INVALID_REQUEST: i32 = -32600;
/// The requested method is not registered
pub const METHOD_NOT_FOUND: i32 = -32601;
/// The parameters did not match what the handler expects
pub const INVALID_PARAMS: i32 = -32602;
/// The server failed outside the handler
pub const INTERNAL_ERROR: i32 = -32603;
/// A handler failed without choosing its own code
pub const APPLICATION_ERROR: i32 = -32500;
/// Generic system error
pub const SYSTEM_ERROR: i32 = -32400;
/// The authentication hook rejected the call
pub const NOT_AUTHORIZED: i32 = -32401;
/// A value required extensions the peer did not enable
pub const EXTENSION_REQUIRED: i32 = -32402;
/// Generic transport error
pub const TRANSPORT_ERROR: i32 = -32300;

/// An application-level error returned instead of a result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Fault {
    /// Fault code
    pub code: i32,
    /// Human readable description
    pub message: String,
}

impl Fault {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Converts a server-side failure into the fault sent back to the caller.
    ///
    /// A handler that returned [`XmlRpcError::Fault`] keeps its own code;
    /// every other error gets a code from the table above.
    pub fn from_error(error: &XmlRpcError) -> Self {
        let code = match error {
            XmlRpcError::Fault(fault) => return fault.clone(),
            XmlRpcError::MalformedValue { .. }
            | XmlRpcError::UnknownTag(_)
            | XmlRpcError::Parse(_)
            | XmlRpcError::Xml(_) => PARSE_ERROR,
            XmlRpcError::NoSuchHandler(_) => METHOD_NOT_FOUND,
            XmlRpcError::NotAuthorized(_) => NOT_AUTHORIZED,
            XmlRpcError::ExtensionRequired(_) => EXTENSION_REQUIRED,
            XmlRpcError::UnsupportedType(_) => INVALID_PARAMS,
            XmlRpcError::BodyTooLarge(_) => INVALID_REQUEST,
            XmlRpcError::Overloaded(_) | XmlRpcError::Config(_) => SYSTEM_ERROR,
            XmlRpcError::Transport(_)
            | XmlRpcError::Connection(_)
            | XmlRpcError::Http(_)
            | XmlRpcError::Io(_)
            | XmlRpcError::Timeout(_) => TRANSPORT_ERROR,
        };
        Self::new(code, error.to_string())
    }

    /// Encodes the fault as the struct value carried inside `<fault>`.
    pub fn to_value(&self) -> Value {
        let mut members = BTreeMap::new();
        members.insert(FAULT_CODE.to_string(), Value::Int(self.code));
        members.insert(FAULT_STRING.to_string(), Value::String(self.message.clone()));
        Value::Struct(members)
    }

    /// Rebuilds a fault from the struct found inside a `<fault>` element.
    pub fn from_value(value: Value) -> Result<Self, XmlRpcError> {
        let Value::Struct(mut members) = value else {
            return Err(XmlRpcError::Parse(format!(
                "Fault must be a struct, got {}",
                value.type_name()
            )));
        };

        let code = match members.remove(FAULT_CODE) {
            Some(Value::Int(code)) => code,
            Some(Value::I1(code)) => i32::from(code),
            Some(Value::I2(code)) => i32::from(code),
            Some(other) => {
                return Err(XmlRpcError::Parse(format!(
                    "{} must be an int, got {}",
                    FAULT_CODE,
                    other.type_name()
                )))
            }
            None => return Err(XmlRpcError::Parse(format!("Fault is missing {}", FAULT_CODE))),
        };

        let message = match members.remove(FAULT_STRING) {
            Some(Value::String(message)) => message,
            Some(Value::Nil) | None => String::new(),
            Some(other) => {
                return Err(XmlRpcError::Parse(format!(
                    "{} must be a string, got {}",
                    FAULT_STRING,
                    other.type_name()
                )))
            }
        };

        Ok(Self { code, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_value_round_trip() {
        let fault = Fault::new(7, "Not found");
        let decoded = Fault::from_value(fault.to_value()).unwrap();
        assert_eq!(decoded, fault);
    }

    #[test]
    fn test_fault_from_handler_fault_keeps_code() {
        let err = XmlRpcError::Fault(Fault::new(42, "custom"));
        assert_eq!(Fault::from_error(&err), Fault::new(42, "custom"));
    }

    #[test]
    fn test_fault_codes_for_errors() {
        assert_eq!(Fault::from_error(&XmlRpcError::NoSuchHandler("x".into())).code, METHOD_NOT_FOUND);
        assert_eq!(Fault::from_error(&XmlRpcError::NotAuthorized("x".into())).code, NOT_AUTHORIZED);
        assert_eq!(Fault::from_error(&XmlRpcError::ExtensionRequired("i8")).code, EXTENSION_REQUIRED);
        assert_eq!(Fault::from_error(&XmlRpcError::malformed("int", "abc")).code, PARSE_ERROR);
        assert_eq!(Fault::from_error(&XmlRpcError::BodyTooLarge(10)).code, INVALID_REQUEST);
        assert_ne!(METHOD_NOT_FOUND, NOT_AUTHORIZED);
    }

    #[test]
    fn test_fault_from_value_missing_code() {
        let mut members = BTreeMap::new();
        members.insert(FAULT_STRING.to_string(), Value::from("oops"));
        assert!(Fault::from_value(Value::Struct(members)).is_err());
    }

    #[test]
    fn test_fault_from_value_rejects_non_struct() {
        assert!(Fault::from_value(Value::Int(1)).is_err());
    }
}
