//! Parsers driven by [`ContentHandler`](crate::xml::ContentHandler) events.

pub mod envelope;
pub mod value_parser;

pub use envelope::{RequestParser, ResponseParser};
pub use value_parser::{parse_value, ValueParser};
