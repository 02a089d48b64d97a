use bytes::Bytes;
use std::io::{BufRead, Write};
use std::sync::Arc;

use super::compression::{read_body, write_body, write_body_into};
use crate::config::{StreamConfig, UTF8};
use crate::extensions;
use crate::parser::{RequestParser, ResponseParser};
use crate::protocol::error::{Result, XmlRpcError};
use crate::protocol::{Request, Response};
use crate::types::TypeRegistry;
use crate::value::Value;
use crate::xml::{self, XmlWriter};

/// Encodes and decodes XML-RPC envelopes.
///
/// The same codec serves both roles: a client encodes requests and decodes
/// responses, a server does the opposite. Cloning is cheap; the type
/// registry is shared.
///
/// # Example
///
/// ```
/// use xmlrpc_common::{Request, StreamConfig, Value, XmlRpcCodec};
///
/// let codec = XmlRpcCodec::new();
/// let request = Request::new("calc.add", vec![Value::Int(2), Value::Int(3)]);
///
/// let body = codec.encode_request(&request).unwrap();
/// let decoded = codec.decode_request(&StreamConfig::default(), &body, false).unwrap();
/// assert_eq!(decoded.method_name(), "calc.add");
/// ```
#[derive(Debug, Clone, Default)]
pub struct XmlRpcCodec {
    registry: Arc<TypeRegistry>,
    max_body_size: Option<usize>,
}

impl XmlRpcCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            max_body_size: None,
        }
    }

    /// Caps the decoded body size. For gzip bodies the limit applies to the
    /// inflated bytes.
    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = Some(max_body_size);
        self
    }

    pub fn max_body_size(&self) -> Option<usize> {
        self.max_body_size
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Encodes a request using the request's own config.
    ///
    /// Parameters needing an extension type are rejected before anything is
    /// written. When `gzip_compressing` is set the returned bytes are the
    /// finished gzip stream.
    pub fn encode_request(&self, request: &Request) -> Result<Bytes> {
        let config = request.config();
        check_encoding(config)?;
        extensions::check_params(config, request.params())?;
        let body = write_body(config.gzip_compressing, |sink| {
            self.write_request(config, request, sink)
        })?;
        Ok(Bytes::from(body))
    }

    /// Writes the uncompressed `<methodCall>` document to `sink`.
    pub fn write_request<W: Write + ?Sized>(
        &self,
        config: &StreamConfig,
        request: &Request,
        sink: &mut W,
    ) -> Result<()> {
        check_encoding(config)?;
        let mut writer = XmlWriter::new(sink);
        writer.declaration(&config.encoding)?;
        writer.start_root("methodCall", config.enabled_for_extensions)?;
        writer.element("methodName", request.method_name())?;
        writer.start("params")?;
        for param in request.params() {
            writer.start("param")?;
            self.write_value(config, &mut writer, param)?;
            writer.end("param")?;
        }
        writer.end("params")?;
        writer.end("methodCall")?;
        Ok(())
    }

    /// Parses a request body; `compressed` reflects the received framing.
    pub fn decode_request(
        &self,
        config: &StreamConfig,
        body: &[u8],
        compressed: bool,
    ) -> Result<Request> {
        check_encoding(config)?;
        read_body(body, compressed, self.max_body_size, |reader| {
            self.read_request(config, reader)
        })
    }

    pub fn read_request<R: BufRead + ?Sized>(
        &self,
        config: &StreamConfig,
        reader: &mut R,
    ) -> Result<Request> {
        let mut parser = RequestParser::new(&self.registry, config);
        xml::parse(reader, &mut parser)?;
        parser.into_request()
    }

    /// Encodes a response, gzip-wrapped when `compress` is set.
    ///
    /// A successful result needing an extension type fails with
    /// [`XmlRpcError::ExtensionRequired`]; the caller decides whether to
    /// send a fault instead.
    pub fn encode_response(
        &self,
        config: &StreamConfig,
        response: &Response,
        compress: bool,
    ) -> Result<Bytes> {
        let mut body = Vec::new();
        self.encode_response_into(config, response, compress, &mut body)?;
        Ok(Bytes::from(body))
    }

    /// Like [`encode_response`](Self::encode_response), but replaces the
    /// contents of `buf` so a caller can reuse its allocation.
    pub fn encode_response_into(
        &self,
        config: &StreamConfig,
        response: &Response,
        compress: bool,
        buf: &mut Vec<u8>,
    ) -> Result<()> {
        check_encoding(config)?;
        if let Response::Success(value) = response {
            extensions::check_value(config, value)?;
        }
        buf.clear();
        write_body_into(compress, buf, |sink| self.write_response(config, response, sink))
    }

    /// Writes the uncompressed `<methodResponse>` document to `sink`.
    pub fn write_response<W: Write + ?Sized>(
        &self,
        config: &StreamConfig,
        response: &Response,
        sink: &mut W,
    ) -> Result<()> {
        check_encoding(config)?;
        let mut writer = XmlWriter::new(sink);
        writer.declaration(&config.encoding)?;
        writer.start_root("methodResponse", config.enabled_for_extensions)?;
        match response {
            Response::Success(value) => {
                writer.start("params")?;
                writer.start("param")?;
                self.write_value(config, &mut writer, value)?;
                writer.end("param")?;
                writer.end("params")?;
            }
            Response::Fault(fault) => {
                writer.start("fault")?;
                self.write_value(config, &mut writer, &fault.to_value())?;
                writer.end("fault")?;
            }
        }
        writer.end("methodResponse")?;
        Ok(())
    }

    pub fn read_response<R: BufRead + ?Sized>(
        &self,
        config: &StreamConfig,
        reader: &mut R,
    ) -> Result<Response> {
        let mut parser = ResponseParser::new(&self.registry, config);
        xml::parse(reader, &mut parser)?;
        parser.into_response()
    }

    /// Parses a response body into the call's result.
    ///
    /// A fault sent by the peer comes back as [`XmlRpcError::Fault`].
    pub fn decode_response(
        &self,
        config: &StreamConfig,
        body: &[u8],
        compressed: bool,
    ) -> Result<Value> {
        check_encoding(config)?;
        read_body(body, compressed, self.max_body_size, |reader| {
            self.read_response(config, reader)
        })?
        .into_result()
    }

    fn write_value<W: Write + ?Sized>(
        &self,
        config: &StreamConfig,
        writer: &mut XmlWriter<&mut W>,
        value: &Value,
    ) -> Result<()> {
        self.registry
            .serializer_for(config, value)?
            .write(&self.registry, config, writer, value)
    }
}

fn check_encoding(config: &StreamConfig) -> Result<()> {
    if config.encoding.eq_ignore_ascii_case(UTF8) {
        Ok(())
    } else {
        Err(XmlRpcError::Config(format!(
            "Unsupported encoding: {}",
            config.encoding
        )))
    }
}
