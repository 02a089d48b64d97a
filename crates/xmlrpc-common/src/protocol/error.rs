use thiserror::Error;

use super::faults::Fault;

#[derive(Error, Debug)]
pub enum XmlRpcError {
    #[error("Malformed {kind} value: {message}")]
    MalformedValue { kind: &'static str, message: String },

    #[error("Unknown type tag: {0}")]
    UnknownTag(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    #[error("Extensions must be enabled to transmit {0} values")]
    ExtensionRequired(&'static str),

    #[error("Fault {}: {}", .0.code, .0.message)]
    Fault(Fault),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Body exceeds {0} bytes")]
    BodyTooLarge(usize),

    #[error("Timed out after {0}ms")]
    Timeout(u64),

    #[error("Overloaded: {0}")]
    Overloaded(String),

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("No such handler: {0}")]
    NoSuchHandler(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl XmlRpcError {
    pub fn malformed(kind: &'static str, message: impl Into<String>) -> Self {
        XmlRpcError::MalformedValue {
            kind,
            message: message.into(),
        }
    }

    /// Whether the caller may retry the same call later.
    ///
    /// Only admission failures and timeouts qualify. Parse and encode errors
    /// are deterministic and faults are application answers.
    pub fn is_retryable(&self) -> bool {
        matches!(self, XmlRpcError::Overloaded(_) | XmlRpcError::Timeout(_))
    }

    /// Returns the fault when this error was reported by the peer.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            XmlRpcError::Fault(fault) => Some(fault),
            _ => None,
        }
    }
}

impl From<Fault> for XmlRpcError {
    fn from(fault: Fault) -> Self {
        XmlRpcError::Fault(fault)
    }
}

pub type Result<T> = std::result::Result<T, XmlRpcError>;
