//! HTTP/1.1 transport built on hyper-util's client.
//!
//! Each call builds its own client with connection pooling disabled, so it
//! opens a fresh TCP connection, performs one POST and drops the connection
//! afterwards. Concurrent calls never queue behind each other on a shared
//! socket.
//!
//! # Status mapping
//!
//! - `2xx` - the body is decoded as a `<methodResponse>`
//! - `401` - [`XmlRpcError::NotAuthorized`]
//! - `503` - [`XmlRpcError::Overloaded`], the server's admission limit
//! - anything else - [`XmlRpcError::Transport`]

use bytes::Bytes;
use futures::future::BoxFuture;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::Frame;
use hyper::header::{
    HeaderValue, ACCEPT_ENCODING, AUTHORIZATION, CONTENT_ENCODING, CONTENT_TYPE, USER_AGENT,
};
use hyper::{Method, StatusCode, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::convert::Infallible;
use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

use xmlrpc_common::transport::http::{
    authorization_header, content_encoding_is_gzip, CONTENT_TYPE_XML, GZIP,
};
use xmlrpc_common::{Request, Result, StreamConfig, Value, XmlRpcCodec, XmlRpcError};

use super::{Transport, TransportFactory};
use crate::config::ClientConfig;

type RequestBody = BoxBody<Bytes, Infallible>;

#[derive(Debug)]
struct Endpoint {
    uri: Uri,
    user_agent: HeaderValue,
    codec: XmlRpcCodec,
}

/// Creates an [`HttpTransport`] per call, all targeting the same URL.
#[derive(Debug, Clone)]
pub struct HttpTransportFactory {
    endpoint: Arc<Endpoint>,
}

impl HttpTransportFactory {
    /// # Errors
    ///
    /// [`XmlRpcError::Config`] if the server URL or user agent is unusable.
    pub fn new(config: &ClientConfig, codec: XmlRpcCodec) -> Result<Self> {
        let uri = config.server_uri().map_err(XmlRpcError::Config)?;
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| XmlRpcError::Config(format!("invalid user agent: {}", e)))?;

        Ok(Self {
            endpoint: Arc::new(Endpoint {
                uri,
                user_agent,
                codec,
            }),
        })
    }

    pub fn uri(&self) -> &Uri {
        &self.endpoint.uri
    }
}

impl TransportFactory for HttpTransportFactory {
    fn create(&self) -> Box<dyn Transport> {
        Box::new(HttpTransport {
            endpoint: self.endpoint.clone(),
        })
    }
}

/// One HTTP exchange.
#[derive(Debug)]
pub struct HttpTransport {
    endpoint: Arc<Endpoint>,
}

impl HttpTransport {
    async fn send(&self, request: &Request) -> Result<Value> {
        let config = request.config();
        let body = self.endpoint.codec.encode_request(request)?;
        let http_request = self.build_request(request, body)?;

        let client = Self::client(config);
        trace!(method = %request.method_name(), uri = %self.endpoint.uri, "Sending call");

        let exchange = async {
            let response = client
                .request(http_request)
                .await
                .map_err(|e| self.request_error(config, e))?;
            let (parts, body) = response.into_parts();
            let body = body.collect().await?.to_bytes();
            Ok::<_, XmlRpcError>((parts, body))
        };
        let (parts, body) = match config.reply_timeout_ms {
            Some(ms) => tokio::time::timeout(Duration::from_millis(ms), exchange)
                .await
                .map_err(|_| XmlRpcError::Timeout(ms))??,
            None => exchange.await?,
        };

        match parts.status {
            status if status.is_success() => {
                let compressed = content_encoding_is_gzip(&parts.headers);
                self.endpoint
                    .codec
                    .decode_response(config, &body, compressed)
            }
            StatusCode::UNAUTHORIZED => Err(XmlRpcError::NotAuthorized(status_message(&body))),
            StatusCode::SERVICE_UNAVAILABLE => Err(XmlRpcError::Overloaded(status_message(&body))),
            status => Err(XmlRpcError::Transport(format!(
                "HTTP {}: {}",
                status,
                status_message(&body)
            ))),
        }
    }

    fn client(config: &StreamConfig) -> Client<HttpConnector, RequestBody> {
        let mut connector = HttpConnector::new();
        connector.set_nodelay(true);
        connector.set_connect_timeout(config.connection_timeout_ms.map(Duration::from_millis));
        Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .build(connector)
    }

    fn request_error(
        &self,
        config: &StreamConfig,
        error: hyper_util::client::legacy::Error,
    ) -> XmlRpcError {
        if !error.is_connect() {
            return XmlRpcError::Transport(format!("HTTP request failed: {}", error));
        }
        if let Some(ms) = config.connection_timeout_ms {
            if is_timed_out(&error) {
                return XmlRpcError::Timeout(ms);
            }
        }
        XmlRpcError::Connection(format!(
            "Failed to connect to {}: {}",
            self.endpoint.uri,
            error
                .source()
                .map_or_else(|| error.to_string(), |source| source.to_string())
        ))
    }

    fn build_request(&self, request: &Request, body: Bytes) -> Result<hyper::Request<RequestBody>> {
        let config = request.config();
        let endpoint = &self.endpoint;

        let body = if config.content_length_optional {
            StreamBody::new(futures::stream::iter([Ok::<_, Infallible>(Frame::data(body))])).boxed()
        } else {
            Full::new(body).boxed()
        };

        let mut builder = hyper::Request::builder()
            .method(Method::POST)
            .uri(endpoint.uri.clone())
            .header(CONTENT_TYPE, CONTENT_TYPE_XML)
            .header(USER_AGENT, endpoint.user_agent.clone());
        if config.gzip_compressing {
            builder = builder.header(CONTENT_ENCODING, GZIP);
        }
        if config.gzip_requesting {
            builder = builder.header(ACCEPT_ENCODING, GZIP);
        }
        if let Some(authorization) = authorization_header(config) {
            builder = builder.header(AUTHORIZATION, authorization);
        }

        builder
            .body(body)
            .map_err(|e| XmlRpcError::Transport(format!("Failed to build request: {}", e)))
    }
}

impl Transport for HttpTransport {
    fn send_request<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<Value>> {
        Box::pin(self.send(request))
    }
}

fn is_timed_out(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = Some(error);
    while let Some(err) = source {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::TimedOut {
                return true;
            }
        }
        source = err.source();
    }
    false
}

fn status_message(body: &[u8]) -> String {
    String::from_utf8_lossy(body).trim().to_string()
}
