//! XML-RPC Client
//!
//! [`XmlRpcClient`] marshals calls, sends them through a pluggable
//! [`Transport`](transport::Transport) and unmarshals the result or fault.
//! Two transports ship with the crate: HTTP/1.1 over hyper and an
//! in-process loopback to any [`Handler`](xmlrpc_common::Handler).
//! [`ClientHandler`] turns a client back into a handler so a server can
//! forward calls to another server.

pub mod client;
pub mod config;
pub mod forwarding;
pub mod transport;

pub use client::XmlRpcClient;
pub use config::ClientConfig;
pub use forwarding::ClientHandler;
pub use transport::{
    HttpTransport, HttpTransportFactory, LocalTransport, LocalTransportFactory, Transport,
    TransportFactory,
};
