//! HTTP Server for XML-RPC
//!
//! This module provides the HTTP/1.1 listener in front of an
//! [`XmlRpcServer`], built on hyper.
//!
//! # Architecture
//!
//! The HTTP server:
//! - Listens on a TCP socket and spawns a tokio task per connection
//! - Serves requests on a connection strictly one after another
//! - Admits each request through the worker pool before reading its body,
//!   answering `503 Service Unavailable` when the pool is exhausted
//! - Accepts only `POST`, answering `405` otherwise and `413` for bodies
//!   above `max_body_size`, before or after gzip inflation
//! - Counts only `POST` requests against `max_requests_per_connection`
//! - Decompresses `Content-Encoding: gzip` bodies and compresses the reply
//!   when both its own config and the peer's `Accept-Encoding` allow it
//! - Closes the connection when keep-alive is disabled, not requested by the
//!   peer, or the per-connection request cap is reached
//!
//! # Example
//!
//! ```no_run
//! use xmlrpc_server::{HandlerMapping, HttpServer, ServerConfig, XmlRpcServer};
//! use xmlrpc_common::Value;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mapping = HandlerMapping::new();
//!     mapping.register_fn("ping", |_: &[Value]| Ok(Value::from("pong")));
//!
//!     let server = XmlRpcServer::new(mapping, ServerConfig::default()).unwrap();
//!     HttpServer::new(Arc::new(server))
//!         .run("127.0.0.1:8080".parse().unwrap())
//!         .await
//!         .unwrap();
//! }
//! ```

use bytes::Bytes;
use futures::future::Future;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full, Limited, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::header::{HeaderValue, CONNECTION, CONTENT_ENCODING, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode, Version};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

use xmlrpc_common::transport::http::{
    accepts_gzip, content_encoding_is_gzip, keep_alive_requested, request_config,
    CONTENT_TYPE_XML, GZIP,
};
use xmlrpc_common::{Result, XmlRpcError};

use crate::server::XmlRpcServer;

/// Body type of every reply.
pub type ReplyBody = BoxBody<Bytes, Infallible>;

/// HTTP listener for an [`XmlRpcServer`].
pub struct HttpServer {
    server: Arc<XmlRpcServer>,
}

impl HttpServer {
    pub fn new(server: Arc<XmlRpcServer>) -> Self {
        Self { server }
    }

    /// Binds `addr` and serves until the process ends.
    pub async fn run(self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| XmlRpcError::Transport(format!("Failed to bind to {}: {}", addr, e)))?;
        self.serve(listener).await
    }

    /// Serves connections accepted from an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        self.serve_with_shutdown(listener, futures::future::pending())
            .await
    }

    /// Serves until `shutdown` completes.
    ///
    /// Stops accepting at once; connections already accepted finish the
    /// request they are serving on their own tasks.
    pub async fn serve_with_shutdown<S>(self, listener: TcpListener, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()>,
    {
        let local_addr = listener
            .local_addr()
            .map_err(|e| XmlRpcError::Transport(format!("Failed to get local address: {}", e)))?;
        tracing::info!("HTTP server listening on {}", local_addr);

        tokio::pin!(shutdown);
        loop {
            let (stream, peer) = tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::error!("Failed to accept connection: {}", e);
                        continue;
                    }
                },
                _ = &mut shutdown => {
                    tracing::info!("HTTP server on {} shutting down", local_addr);
                    return Ok(());
                }
            };

            let io = TokioIo::new(stream);
            let server = self.server.clone();
            let keep_alive = server.config().keep_alive;

            tokio::task::spawn(async move {
                let served = Arc::new(AtomicUsize::new(0));
                let service = service_fn(move |req| {
                    let server = server.clone();
                    let served = served.clone();
                    async move { Ok::<_, Infallible>(Self::handle_request(server, served, req).await) }
                });

                if let Err(err) = http1::Builder::new()
                    .keep_alive(keep_alive)
                    .serve_connection(io, service)
                    .await
                {
                    tracing::error!("Error serving connection from {}: {}", peer, err);
                }
            });
        }
    }

    /// Handles one HTTP request on a connection.
    ///
    /// `served` counts the `POST` requests this connection has seen so far.
    pub async fn handle_request(
        server: Arc<XmlRpcServer>,
        served: Arc<AtomicUsize>,
        req: Request<Incoming>,
    ) -> Response<ReplyBody> {
        let config = server.config();
        let wants_keep_alive =
            config.keep_alive && keep_alive_requested(req.version(), req.headers());

        if req.method() != Method::POST {
            let keep_alive = wants_keep_alive
                && served.load(Ordering::SeqCst) < config.max_requests_per_connection;
            return status_reply(StatusCode::METHOD_NOT_ALLOWED, "Only POST is supported", keep_alive);
        }

        let count = served.fetch_add(1, Ordering::SeqCst) + 1;
        let keep_alive = wants_keep_alive && count < config.max_requests_per_connection;

        // admission happens before the body is read
        let mut worker = match server.admit() {
            Ok(worker) => worker,
            Err(e) => {
                tracing::warn!("Rejecting request: {}", e);
                return status_reply(StatusCode::SERVICE_UNAVAILABLE, &e.to_string(), keep_alive);
            }
        };

        let version = req.version();
        let stream = request_config(&config.stream, req.headers());
        let compressed = content_encoding_is_gzip(req.headers());
        let compress_reply = config.stream.gzip_compressing && accepts_gzip(req.headers());

        let body = match Limited::new(req.into_body(), config.max_body_size).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                // the rest of the body is unread, so the connection cannot be reused
                if e.is::<http_body_util::LengthLimitError>() {
                    return status_reply(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large", false);
                }
                tracing::error!("Failed to read request body: {}", e);
                return status_reply(StatusCode::BAD_REQUEST, "Failed to read request body", false);
            }
        };

        let reply = match server
            .execute_stream(&mut worker, &stream, &body, compressed, compress_reply)
            .await
        {
            Ok(reply) => reply,
            Err(XmlRpcError::BodyTooLarge(limit)) => {
                tracing::warn!(limit, "Inflated request body too large");
                return status_reply(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large", false);
            }
            Err(e) => {
                tracing::error!("Failed to write response: {}", e);
                return status_reply(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string(), false);
            }
        };

        let chunked = config.stream.content_length_optional && version == Version::HTTP_11;
        let body = if chunked {
            StreamBody::new(futures::stream::iter([Ok::<_, Infallible>(Frame::data(reply))])).boxed()
        } else {
            Full::new(reply).boxed()
        };

        let mut response = Response::new(body);
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_XML));
        if compress_reply {
            headers.insert(CONTENT_ENCODING, HeaderValue::from_static(GZIP));
        }
        set_connection(&mut response, keep_alive);
        response
    }
}

fn status_reply(status: StatusCode, message: &str, keep_alive: bool) -> Response<ReplyBody> {
    let mut response = Response::new(Full::new(Bytes::from(message.to_string())).boxed());
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    set_connection(&mut response, keep_alive);
    response
}

fn set_connection(response: &mut Response<ReplyBody>, keep_alive: bool) {
    let value = if keep_alive { "keep-alive" } else { "close" };
    response
        .headers_mut()
        .insert(CONNECTION, HeaderValue::from_static(value));
}
