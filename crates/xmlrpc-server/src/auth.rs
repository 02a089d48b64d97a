//! Authentication hook.
//!
//! The server consults an [`AuthenticationHandler`] before dispatching each
//! call. The hook sees the request and the per-request config, which carries
//! any Basic credentials the peer presented.

use xmlrpc_common::auth::BasicCredentials;
use xmlrpc_common::Request;

/// Decides whether a call may be dispatched.
///
/// A rejection surfaces as [`XmlRpcError::NotAuthorized`](xmlrpc_common::XmlRpcError::NotAuthorized),
/// distinct from an unknown method.
pub trait AuthenticationHandler: Send + Sync {
    fn is_authorized(&self, request: &Request) -> bool;
}

impl<F> AuthenticationHandler for F
where
    F: Fn(&Request) -> bool + Send + Sync,
{
    fn is_authorized(&self, request: &Request) -> bool {
        self(request)
    }
}

/// Accepts exactly one user name and password.
#[derive(Debug, Clone)]
pub struct BasicAuthenticator {
    expected: BasicCredentials,
}

impl BasicAuthenticator {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            expected: BasicCredentials::new(user, password),
        }
    }
}

impl AuthenticationHandler for BasicAuthenticator {
    fn is_authorized(&self, request: &Request) -> bool {
        match BasicCredentials::from_config(request.config()) {
            Some(presented) => presented.matches(&self.expected.user, &self.expected.password),
            None => false,
        }
    }
}
