//! XML-RPC Server
//!
//! This crate provides the receiving side of XML-RPC: a [`HandlerMapping`]
//! binding method names to handlers, the [`XmlRpcServer`] dispatch pipeline
//! that turns request bodies into response bodies, and the hyper-based
//! [`HttpServer`] listener in front of it.

pub mod auth;
pub mod config;
pub mod http_server;
pub mod mapping;
pub mod server;

pub use auth::{AuthenticationHandler, BasicAuthenticator};
pub use config::ServerConfig;
pub use http_server::HttpServer;
pub use mapping::HandlerMapping;
pub use server::XmlRpcServer;
