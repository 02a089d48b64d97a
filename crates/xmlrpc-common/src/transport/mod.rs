//! XML-RPC transport layer.
//!
//! Everything needed to turn a [`Request`](crate::Request) into bytes and
//! back, independent of how the bytes travel:
//!
//! - **[`XmlRpcCodec`]**: envelope encoding and decoding, with optional gzip
//! - **[`compression`]**: gzip wrapping of bodies
//! - **[`http`]**: header helpers for HTTP framing
//!
//! Sockets live in the client and server crates.

pub mod codec;
pub mod compression;
pub mod http;

pub use codec::XmlRpcCodec;
