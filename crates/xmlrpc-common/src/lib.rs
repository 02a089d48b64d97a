//! XML-RPC Common Types and Transport
//!
//! This crate holds everything the XML-RPC client and server share: the
//! value model, the type registry, the streaming parsers, the envelope codec
//! and the worker pool that bounds concurrent calls.
//!
//! # Architecture
//!
//! Components, leaves first:
//!
//! - [`types`]: [`TypeRegistry`] maps values to serializers and wire tags to parsers
//! - [`parser`]: [`ValueParser`] rebuilds nested values from XML events with an explicit stack
//! - [`transport`]: [`XmlRpcCodec`] encodes and decodes `methodCall` / `methodResponse`
//!   envelopes, optionally gzip-compressed
//! - [`worker`]: [`WorkerPool`] admits a bounded number of calls and recycles execution slots
//!
//! Every entry point takes an explicit [`StreamConfig`]; there is no
//! process-wide state.
//!
//! # Example
//!
//! ```
//! use xmlrpc_common::{Response, StreamConfig, Value, XmlRpcCodec};
//!
//! let codec = XmlRpcCodec::new();
//! let config = StreamConfig::default();
//!
//! let body = codec
//!     .encode_response(&config, &Response::success(Value::from("hello")), false)
//!     .unwrap();
//! let result = codec.decode_response(&config, &body, false).unwrap();
//! assert_eq!(result.as_str(), Some("hello"));
//! ```

pub mod auth;
pub mod config;
pub mod extensions;
pub mod handler;
pub mod parser;
pub mod protocol;
pub mod transport;
pub mod types;
pub mod value;
pub mod worker;
pub mod xml;

pub use config::StreamConfig;
pub use handler::{async_handler_fn, handler_fn, Handler};
pub use parser::{parse_value, RequestParser, ResponseParser, ValueParser};
pub use protocol::*;
pub use transport::XmlRpcCodec;
pub use types::TypeRegistry;
pub use value::Value;
pub use worker::{ExecutionSlot, Worker, WorkerPool};
