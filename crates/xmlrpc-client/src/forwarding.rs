//! Client-as-handler forwarding.

use futures::future::BoxFuture;
use tracing::debug;

use xmlrpc_common::{Handler, Request, Result, Value};

use crate::client::XmlRpcClient;

/// Forwards every call it receives to another server.
///
/// The method name and parameters pass through unchanged; the outgoing
/// call uses the wrapped client's own stream config, not the incoming
/// request's. Faults from the remote server reach the caller with their
/// codes intact.
///
/// ```no_run
/// use std::sync::Arc;
/// use xmlrpc_client::{ClientConfig, ClientHandler, XmlRpcClient};
/// use xmlrpc_server::{HandlerMapping, ServerConfig, XmlRpcServer};
///
/// let upstream = XmlRpcClient::new(ClientConfig::new("http://10.0.0.2:8080/")).unwrap();
/// let mut mapping = HandlerMapping::new();
/// mapping.register_namespace("remote", ClientHandler::new(upstream));
/// let server = XmlRpcServer::new(mapping, ServerConfig::default()).unwrap();
/// ```
#[derive(Clone)]
pub struct ClientHandler {
    client: XmlRpcClient,
}

impl ClientHandler {
    pub fn new(client: XmlRpcClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &XmlRpcClient {
        &self.client
    }
}

impl Handler for ClientHandler {
    fn execute<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<Value>> {
        Box::pin(async move {
            debug!(method = %request.method_name(), "Forwarding call");
            self.client
                .execute(request.method_name(), request.params().to_vec())
                .await
        })
    }
}
