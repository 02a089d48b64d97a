//! XML plumbing: the event source driving the parsers and the writer the
//! serializers emit through.

pub mod events;
pub mod fragment;
pub mod writer;

pub use events::{parse, ContentHandler, StartTag};
pub use fragment::{canonicalize, FragmentBuilder};
pub use writer::XmlWriter;

/// Namespace URI of the extension types (`nil`, `i1`, `i2`, `i8`, `float`, `dom`, `serializable`).
pub const EXTENSIONS_URI: &str = "http://ws.apache.org/xmlrpc/namespaces/extensions";

/// Prefix bound to [`EXTENSIONS_URI`] on outgoing documents.
pub const EXTENSIONS_PREFIX: &str = "ex";
