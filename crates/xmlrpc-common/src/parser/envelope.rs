//! Envelope parsers for `<methodCall>` and `<methodResponse>`.
//!
//! Both walk the fixed envelope themselves and delegate every `<value>` to a
//! fresh [`ValueParser`] until it reports completion.

use crate::config::StreamConfig;
use crate::protocol::error::{Result, XmlRpcError};
use crate::protocol::{Fault, Request, Response};
use crate::types::TypeRegistry;
use crate::value::Value;
use crate::xml::{ContentHandler, StartTag};

use super::value_parser::ValueParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallState {
    Start,
    InCall,
    InMethodName,
    InParams,
    InParam { has_value: bool },
    Done,
}

/// Parses a `<methodCall>` document into a [`Request`].
pub struct RequestParser<'a> {
    registry: &'a TypeRegistry,
    config: &'a StreamConfig,
    state: CallState,
    method_name: Option<String>,
    name_text: String,
    params: Vec<Value>,
    value: Option<ValueParser<'a>>,
}

impl<'a> RequestParser<'a> {
    pub fn new(registry: &'a TypeRegistry, config: &'a StreamConfig) -> Self {
        Self {
            registry,
            config,
            state: CallState::Start,
            method_name: None,
            name_text: String::new(),
            params: Vec::new(),
            value: None,
        }
    }

    pub fn into_request(self) -> Result<Request> {
        if self.state != CallState::Done {
            return Err(XmlRpcError::Parse("Incomplete <methodCall>".to_string()));
        }
        let method_name = self
            .method_name
            .ok_or_else(|| XmlRpcError::Parse("Missing <methodName>".to_string()))?;
        Ok(Request::new(method_name, self.params).with_config(self.config.clone()))
    }
}

impl ContentHandler for RequestParser<'_> {
    fn start_element(&mut self, namespace: &str, name: &str) -> Result<()> {
        if let Some(value) = self.value.as_mut() {
            return value.start_element(namespace, name);
        }

        self.state = match (self.state, name) {
            (CallState::Start, "methodCall") => CallState::InCall,
            (CallState::InCall, "methodName") if self.method_name.is_none() => {
                self.name_text.clear();
                CallState::InMethodName
            }
            (CallState::InCall, "params") if self.method_name.is_some() => CallState::InParams,
            (CallState::InParams, "param") => CallState::InParam { has_value: false },
            (CallState::InParam { has_value: false }, "value") => {
                let mut parser = ValueParser::new(self.registry, self.config);
                parser.start_element(namespace, name)?;
                self.value = Some(parser);
                return Ok(());
            }
            (_, name) => {
                return Err(XmlRpcError::Parse(format!(
                    "Unexpected <{}> in method call",
                    name
                )))
            }
        };
        Ok(())
    }

    fn start_tag(&mut self, namespace: &str, tag: &StartTag<'_>) -> Result<()> {
        match self.value.as_mut() {
            Some(value) => value.start_tag(namespace, tag),
            None => self.start_element(namespace, tag.local_name()),
        }
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        if let Some(value) = self.value.as_mut() {
            return value.characters(text);
        }
        if self.state == CallState::InMethodName {
            self.name_text.push_str(text);
        } else if !text.trim().is_empty() {
            return Err(XmlRpcError::Parse(format!(
                "Unexpected character data '{}' in method call",
                text.trim()
            )));
        }
        Ok(())
    }

    fn end_element(&mut self, namespace: &str, name: &str) -> Result<()> {
        if let Some(value) = self.value.as_mut() {
            value.end_element(namespace, name)?;
            if let Some(param) = value.take_value() {
                self.params.push(param);
                self.value = None;
                self.state = CallState::InParam { has_value: true };
            }
            return Ok(());
        }

        self.state = match (self.state, name) {
            (CallState::InMethodName, "methodName") => {
                let method_name = self.name_text.trim();
                if method_name.is_empty() {
                    return Err(XmlRpcError::Parse("Empty <methodName>".to_string()));
                }
                self.method_name = Some(method_name.to_string());
                CallState::InCall
            }
            (CallState::InParam { has_value: true }, "param") => CallState::InParams,
            (CallState::InParam { has_value: false }, "param") => {
                return Err(XmlRpcError::Parse("<param> without <value>".to_string()))
            }
            (CallState::InParams, "params") => CallState::InCall,
            (CallState::InCall, "methodCall") if self.method_name.is_some() => CallState::Done,
            (_, name) => {
                return Err(XmlRpcError::Parse(format!(
                    "Unexpected </{}> in method call",
                    name
                )))
            }
        };
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseState {
    Start,
    InResponse,
    InParams,
    InParam { has_value: bool },
    AfterParams,
    InFault { has_value: bool },
    AfterFault,
    Done,
}

/// Parses a `<methodResponse>` document into a [`Response`].
///
/// A `<fault>` element seen before the contained value marks the response
/// as a fault; its `{faultCode, faultString}` struct becomes a [`Fault`].
pub struct ResponseParser<'a> {
    registry: &'a TypeRegistry,
    config: &'a StreamConfig,
    state: ResponseState,
    is_fault: bool,
    result: Option<Value>,
    value: Option<ValueParser<'a>>,
}

impl<'a> ResponseParser<'a> {
    pub fn new(registry: &'a TypeRegistry, config: &'a StreamConfig) -> Self {
        Self {
            registry,
            config,
            state: ResponseState::Start,
            is_fault: false,
            result: None,
            value: None,
        }
    }

    pub fn into_response(self) -> Result<Response> {
        if self.state != ResponseState::Done {
            return Err(XmlRpcError::Parse("Incomplete <methodResponse>".to_string()));
        }
        let value = self
            .result
            .ok_or_else(|| XmlRpcError::Parse("Response contains no result".to_string()))?;
        if self.is_fault {
            Ok(Response::Fault(Fault::from_value(value)?))
        } else {
            Ok(Response::Success(value))
        }
    }

    fn start_value(&mut self, namespace: &str, name: &str) -> Result<()> {
        let mut parser = ValueParser::new(self.registry, self.config);
        parser.start_element(namespace, name)?;
        self.value = Some(parser);
        Ok(())
    }
}

impl ContentHandler for ResponseParser<'_> {
    fn start_element(&mut self, namespace: &str, name: &str) -> Result<()> {
        if let Some(value) = self.value.as_mut() {
            return value.start_element(namespace, name);
        }

        self.state = match (self.state, name) {
            (ResponseState::Start, "methodResponse") => ResponseState::InResponse,
            (ResponseState::InResponse, "params") => ResponseState::InParams,
            (ResponseState::InResponse, "fault") => {
                self.is_fault = true;
                ResponseState::InFault { has_value: false }
            }
            (ResponseState::InParams, "param") if self.result.is_none() => {
                ResponseState::InParam { has_value: false }
            }
            (ResponseState::InParam { has_value: false }, "value")
            | (ResponseState::InFault { has_value: false }, "value") => {
                return self.start_value(namespace, name);
            }
            (_, name) => {
                return Err(XmlRpcError::Parse(format!(
                    "Unexpected <{}> in method response",
                    name
                )))
            }
        };
        Ok(())
    }

    fn start_tag(&mut self, namespace: &str, tag: &StartTag<'_>) -> Result<()> {
        match self.value.as_mut() {
            Some(value) => value.start_tag(namespace, tag),
            None => self.start_element(namespace, tag.local_name()),
        }
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        if let Some(value) = self.value.as_mut() {
            return value.characters(text);
        }
        if !text.trim().is_empty() {
            return Err(XmlRpcError::Parse(format!(
                "Unexpected character data '{}' in method response",
                text.trim()
            )));
        }
        Ok(())
    }

    fn end_element(&mut self, namespace: &str, name: &str) -> Result<()> {
        if let Some(value) = self.value.as_mut() {
            value.end_element(namespace, name)?;
            if let Some(result) = value.take_value() {
                self.result = Some(result);
                self.value = None;
                self.state = match self.state {
                    ResponseState::InFault { .. } => ResponseState::InFault { has_value: true },
                    _ => ResponseState::InParam { has_value: true },
                };
            }
            return Ok(());
        }

        self.state = match (self.state, name) {
            (ResponseState::InParam { has_value: true }, "param") => ResponseState::InParams,
            (ResponseState::InParams, "params") => ResponseState::AfterParams,
            (ResponseState::InFault { has_value: true }, "fault") => ResponseState::AfterFault,
            (ResponseState::AfterParams, "methodResponse")
            | (ResponseState::AfterFault, "methodResponse") => ResponseState::Done,
            (_, name) => {
                return Err(XmlRpcError::Parse(format!(
                    "Unexpected </{}> in method response",
                    name
                )))
            }
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml;

    fn parse_request(xml_text: &str) -> Result<Request> {
        let registry = TypeRegistry::new();
        let config = StreamConfig::default();
        let mut parser = RequestParser::new(&registry, &config);
        xml::parse(xml_text.as_bytes(), &mut parser)?;
        parser.into_request()
    }

    fn parse_response(xml_text: &str) -> Result<Response> {
        let registry = TypeRegistry::new();
        let config = StreamConfig::default();
        let mut parser = ResponseParser::new(&registry, &config);
        xml::parse(xml_text.as_bytes(), &mut parser)?;
        parser.into_response()
    }

    #[test]
    fn test_parse_method_call() {
        let request = parse_request(
            "<?xml version=\"1.0\"?>\n<methodCall>\n  <methodName>calc.add</methodName>\n  <params>\n\
             <param><value><int>2</int></value></param>\n\
             <param><value>three</value></param>\n  </params>\n</methodCall>",
        )
        .unwrap();
        assert_eq!(request.method_name(), "calc.add");
        assert_eq!(request.params(), &[Value::Int(2), Value::from("three")]);
    }

    #[test]
    fn test_parse_method_call_without_params() {
        let request = parse_request("<methodCall><methodName>ping</methodName></methodCall>").unwrap();
        assert!(request.params().is_empty());
    }

    #[test]
    fn test_method_call_requires_name() {
        assert!(parse_request("<methodCall><params/></methodCall>").is_err());
        assert!(parse_request("<methodCall><methodName> </methodName></methodCall>").is_err());
    }

    #[test]
    fn test_param_requires_value() {
        assert!(parse_request("<methodCall><methodName>a</methodName><params><param/></params></methodCall>").is_err());
    }

    #[test]
    fn test_parse_success_response() {
        let response = parse_response(
            "<methodResponse><params><param><value><boolean>1</boolean></value></param></params></methodResponse>",
        )
        .unwrap();
        assert_eq!(response, Response::Success(Value::Bool(true)));
    }

    #[test]
    fn test_parse_fault_response() {
        let response = parse_response(
            "<methodResponse><fault><value><struct>\
             <member><name>faultCode</name><value><int>7</int></value></member>\
             <member><name>faultString</name><value><string>Not found</string></value></member>\
             </struct></value></fault></methodResponse>",
        )
        .unwrap();
        assert_eq!(response, Response::fault(7, "Not found"));
    }

    #[test]
    fn test_response_with_two_params_fails() {
        assert!(parse_response(
            "<methodResponse><params><param><value>a</value></param>\
             <param><value>b</value></param></params></methodResponse>"
        )
        .is_err());
    }

    #[test]
    fn test_empty_response_fails() {
        assert!(parse_response("<methodResponse><params></params></methodResponse>").is_err());
    }

    #[test]
    fn test_dom_param_keeps_attributes() {
        let registry = TypeRegistry::new();
        let config = StreamConfig::default().with_extensions(true);
        let mut parser = RequestParser::new(&registry, &config);
        let xml_text = format!(
            "<methodCall xmlns:ex=\"{}\"><methodName>a</methodName><params><param>\
             <value><ex:dom><doc id=\"7\"><item/></doc></ex:dom></value>\
             </param></params></methodCall>",
            xml::EXTENSIONS_URI
        );
        xml::parse(xml_text.as_bytes(), &mut parser).unwrap();
        let request = parser.into_request().unwrap();
        assert_eq!(
            request.params(),
            &[Value::ExternalNode(r#"<doc id="7"><item/></doc>"#.to_string())]
        );
    }

    #[test]
    fn test_wrong_root_fails() {
        assert!(parse_response("<methodCall/>").is_err());
        assert!(parse_request("<methodResponse/>").is_err());
    }
}
