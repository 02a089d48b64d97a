//! Client transports.
//!
//! A [`TransportFactory`] creates one [`Transport`] per call. The transport
//! encodes the request, moves the bytes and decodes the reply; the client
//! only decides which factory to use and how many calls may run at once.
//!
//! - [`HttpTransport`] POSTs to a server over a fresh HTTP/1.1 connection
//! - [`LocalTransport`] hands the encoded bytes to an in-process [`Handler`]
//!
//! [`Handler`]: xmlrpc_common::Handler

use futures::future::BoxFuture;

use xmlrpc_common::{Request, Result, Value};

pub mod http;
pub mod local;

pub use http::{HttpTransport, HttpTransportFactory};
pub use local::{LocalTransport, LocalTransportFactory};

/// Sends a single request and returns the decoded result.
///
/// A fault answered by the peer comes back as
/// [`XmlRpcError::Fault`](xmlrpc_common::XmlRpcError::Fault).
pub trait Transport: Send + Sync {
    fn send_request<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<Value>>;
}

/// Creates the transport for each call.
pub trait TransportFactory: Send + Sync {
    fn create(&self) -> Box<dyn Transport>;
}

impl<F> TransportFactory for F
where
    F: Fn() -> Box<dyn Transport> + Send + Sync,
{
    fn create(&self) -> Box<dyn Transport> {
        self()
    }
}
