pub mod error;
pub mod faults;
pub mod requests;
pub mod responses;

pub use error::{Result, XmlRpcError};
pub use faults::Fault;
pub use requests::Request;
pub use responses::Response;
