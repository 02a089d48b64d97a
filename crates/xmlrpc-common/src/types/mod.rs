//! Type registry: value → serializer and tag → parser.

pub mod parser;
pub mod registry;
pub mod serializer;

pub use parser::{ScalarKind, TypeParser, DATE_TIME_FORMAT};
pub use registry::TypeRegistry;
pub use serializer::Serializer;
