//! XML-RPC Response Types
//!
//! This module defines the outcome of a method call.

use super::error::{Result, XmlRpcError};
use super::faults::Fault;
use crate::value::Value;

/// The outcome of a method call as carried by a `<methodResponse>`.
///
/// # Response Flow
///
/// 1. The server parses a `Request` and dispatches it to a handler
/// 2. The handler's result (or error, converted to a [`Fault`]) becomes a `Response`
/// 3. The response is serialized and written back on the same connection
/// 4. The client decodes it; a fault is raised as [`XmlRpcError::Fault`]
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// A single result value
    Success(Value),
    /// An application-level error
    Fault(Fault),
}

impl Response {
    pub fn success(result: impl Into<Value>) -> Self {
        Response::Success(result.into())
    }

    pub fn fault(code: i32, message: impl Into<String>) -> Self {
        Response::Fault(Fault::new(code, message))
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, Response::Fault(_))
    }

    /// Returns the result, or raises the fault as an error.
    pub fn into_result(self) -> Result<Value> {
        match self {
            Response::Success(value) => Ok(value),
            Response::Fault(fault) => Err(XmlRpcError::Fault(fault)),
        }
    }
}

impl From<Result<Value>> for Response {
    fn from(result: Result<Value>) -> Self {
        match result {
            Ok(value) => Response::Success(value),
            Err(err) => Response::Fault(Fault::from_error(&err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_result_raises_fault() {
        let response = Response::fault(7, "Not found");
        match response.into_result() {
            Err(XmlRpcError::Fault(fault)) => {
                assert_eq!(fault.code, 7);
                assert_eq!(fault.message, "Not found");
            }
            other => panic!("expected fault, got {:?}", other),
        }
    }

    #[test]
    fn test_from_handler_error() {
        let response = Response::from(Err(XmlRpcError::NoSuchHandler("foo".into())));
        assert!(response.is_fault());
    }
}
