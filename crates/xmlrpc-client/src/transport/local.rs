//! In-process transport.
//!
//! Requests still go through the full byte-level codec in both directions,
//! so a local call observes exactly what an HTTP peer would: extension
//! gating, gzip framing and fault conversion. Useful for tests and for
//! embedding a server behind the client API.

use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, warn};

use xmlrpc_common::extensions;
use xmlrpc_common::{Fault, Handler, Request, Response, Result, Value, XmlRpcCodec};

use super::{Transport, TransportFactory};

#[derive(Clone)]
pub struct LocalTransportFactory {
    handler: Arc<dyn Handler>,
    codec: XmlRpcCodec,
}

impl LocalTransportFactory {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self::with_codec(handler, XmlRpcCodec::new())
    }

    pub fn with_codec(handler: Arc<dyn Handler>, codec: XmlRpcCodec) -> Self {
        Self { handler, codec }
    }
}

impl TransportFactory for LocalTransportFactory {
    fn create(&self) -> Box<dyn Transport> {
        Box::new(LocalTransport {
            handler: self.handler.clone(),
            codec: self.codec.clone(),
        })
    }
}

pub struct LocalTransport {
    handler: Arc<dyn Handler>,
    codec: XmlRpcCodec,
}

impl LocalTransport {
    async fn send(&self, request: &Request) -> Result<Value> {
        let config = request.config();
        let compressed = config.gzip_compressing;
        let compress_reply = config.gzip_requesting;

        let body = self.codec.encode_request(request)?;
        let response = match self.codec.decode_request(config, &body, compressed) {
            Ok(decoded) => {
                let result = self.handler.execute(&decoded).await.and_then(|value| {
                    extensions::check_value(config, &value)?;
                    Ok(value)
                });
                Response::from(result)
            }
            Err(err) => Response::Fault(Fault::from_error(&err)),
        };

        let reply = match self.codec.encode_response(config, &response, compress_reply) {
            Ok(reply) => reply,
            Err(err) => {
                warn!(error = %err, "Failed to encode local result, sending fault instead");
                let fault = Response::Fault(Fault::from_error(&err));
                self.codec.encode_response(config, &fault, compress_reply)?
            }
        };
        debug!(
            method = %request.method_name(),
            bytes = reply.len(),
            "Local call answered"
        );

        self.codec.decode_response(config, &reply, compress_reply)
    }
}

impl Transport for LocalTransport {
    fn send_request<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<Value>> {
        Box::pin(self.send(request))
    }
}
