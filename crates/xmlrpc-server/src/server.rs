//! XML-RPC server core.
//!
//! [`XmlRpcServer`] owns the dispatch pipeline independent of any socket:
//!
//! 1. decode the request body through the codec
//! 2. run the authentication hook
//! 3. dispatch to the handler
//! 4. check the result against the extension setting
//! 5. encode the result, or the fault every failure is converted to
//!
//! The HTTP listener in [`http_server`](crate::http_server) drives
//! [`XmlRpcServer::execute_stream`] once per admitted request, encoding the
//! reply into the admitted worker's slot buffer.

use bytes::Bytes;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, warn};

use xmlrpc_common::extensions;
use xmlrpc_common::{
    ExecutionSlot, Fault, Handler, Request, Response, Result, StreamConfig, Value, Worker,
    WorkerPool, XmlRpcCodec, XmlRpcError,
};

use crate::auth::AuthenticationHandler;
use crate::config::ServerConfig;
use crate::mapping::HandlerMapping;

/// Dispatch pipeline shared by every connection.
///
/// # Example
///
/// ```
/// use xmlrpc_server::{HandlerMapping, ServerConfig, XmlRpcServer};
/// use xmlrpc_common::Value;
///
/// let mut mapping = HandlerMapping::new();
/// mapping.register_fn("ping", |_: &[Value]| Ok(Value::from("pong")));
///
/// let server = XmlRpcServer::new(mapping, ServerConfig::default()).unwrap();
/// assert_eq!(server.pool().max_concurrency(), 100);
/// ```
pub struct XmlRpcServer {
    handler: Arc<dyn Handler>,
    authentication: Option<Arc<dyn AuthenticationHandler>>,
    codec: XmlRpcCodec,
    pool: WorkerPool,
    config: ServerConfig,
}

impl XmlRpcServer {
    /// Creates a server dispatching through `mapping`.
    ///
    /// The mapping's introspection switch follows `config.introspection`.
    pub fn new(mapping: HandlerMapping, config: ServerConfig) -> Result<Self> {
        let mapping = mapping.with_introspection(config.introspection);
        Self::with_handler(Arc::new(mapping), config)
    }

    /// Creates a server dispatching every call to a single handler.
    pub fn with_handler(handler: Arc<dyn Handler>, config: ServerConfig) -> Result<Self> {
        config.validate().map_err(XmlRpcError::Config)?;
        let pool = WorkerPool::new(config.max_concurrency, config.max_idle_workers)?;
        Ok(Self {
            handler,
            authentication: None,
            codec: XmlRpcCodec::new().with_max_body_size(config.max_body_size),
            pool,
            config,
        })
    }

    pub fn with_authentication<A>(mut self, authentication: A) -> Self
    where
        A: AuthenticationHandler + 'static,
    {
        self.authentication = Some(Arc::new(authentication));
        self
    }

    /// Replaces the codec. A codec without its own body limit inherits
    /// `max_body_size` from the server config.
    pub fn with_codec(mut self, codec: XmlRpcCodec) -> Self {
        self.codec = match codec.max_body_size() {
            Some(_) => codec,
            None => codec.with_max_body_size(self.config.max_body_size),
        };
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn codec(&self) -> &XmlRpcCodec {
        &self.codec
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Admits one call or fails at once with [`XmlRpcError::Overloaded`].
    pub fn admit(&self) -> Result<Worker> {
        self.pool.acquire()
    }

    /// Authenticates, dispatches and checks one decoded request.
    ///
    /// Does not take a worker; callers admit the call first.
    pub async fn execute(&self, request: &Request) -> Result<Value> {
        if let Some(authentication) = &self.authentication {
            if !authentication.is_authorized(request) {
                warn!(method = %request.method_name(), "Rejected unauthorized call");
                return Err(XmlRpcError::NotAuthorized(format!(
                    "Not authorized to call {}",
                    request.method_name()
                )));
            }
        }

        debug!(
            method = %request.method_name(),
            params = request.params().len(),
            "Dispatching call"
        );
        let result = self.handler.execute(request).await?;
        extensions::check_value(request.config(), &result)?;
        Ok(result)
    }

    /// Processes one request body into a response body.
    ///
    /// The reply is encoded into `slot.buffer`. Every failure after the body
    /// was received is answered with a fault, including a result that turned
    /// out not to be encodable. An error is returned only when the body
    /// inflated past the size limit ([`XmlRpcError::BodyTooLarge`]) or not
    /// even the fault could be written.
    pub async fn execute_stream(
        &self,
        slot: &mut ExecutionSlot,
        config: &StreamConfig,
        body: &[u8],
        compressed: bool,
        compress_reply: bool,
    ) -> Result<Bytes> {
        let response = match self.codec.decode_request(config, body, compressed) {
            Ok(request) => Response::from(self.execute(&request).await),
            Err(err @ XmlRpcError::BodyTooLarge(_)) => return Err(err),
            Err(err) => {
                debug!(error = %err, "Failed to parse request");
                Response::Fault(Fault::from_error(&err))
            }
        };

        if let Response::Fault(fault) = &response {
            debug!(code = fault.code, message = %fault.message, "Returning fault");
        }

        let buffer = &mut slot.buffer;
        if let Err(err) = self
            .codec
            .encode_response_into(config, &response, compress_reply, buffer)
        {
            warn!(error = %err, "Failed to encode result, sending fault instead");
            let fault = Response::Fault(Fault::from_error(&err));
            self.codec
                .encode_response_into(config, &fault, compress_reply, buffer)?;
        }
        Ok(Bytes::copy_from_slice(buffer))
    }
}

/// A server can itself be mounted as a handler, e.g. behind a local
/// transport. Each call is admitted through the server's pool.
impl Handler for XmlRpcServer {
    fn execute<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<Value>> {
        Box::pin(async move {
            let _worker = self.admit()?;
            XmlRpcServer::execute(self, request).await
        })
    }
}
