//! Basic credentials.
//!
//! XML-RPC carries a single credentials slot: a user name and password sent
//! as an HTTP `Authorization: Basic` header. The client fills the slot from
//! its [`StreamConfig`]; the server copies what the peer presented into the
//! per-request config and lets its authentication hook decide.
//!
//! # Example
//!
//! ```
//! use xmlrpc_common::auth::BasicCredentials;
//!
//! let credentials = BasicCredentials::new("user", "pass");
//! let header = credentials.to_header_value();
//! assert_eq!(header, "Basic dXNlcjpwYXNz");
//! assert_eq!(BasicCredentials::from_header_value(&header), Some(credentials));
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;

use crate::config::StreamConfig;

#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub user: String,
    pub password: String,
}

impl BasicCredentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// Reads the credentials slot of a config.
    ///
    /// A user without a password sends an empty password.
    pub fn from_config(config: &StreamConfig) -> Option<Self> {
        let user = config.basic_user.as_ref()?;
        Some(Self::new(
            user.clone(),
            config.basic_password.clone().unwrap_or_default(),
        ))
    }

    /// Encodes the `Authorization` header value.
    pub fn to_header_value(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.user, self.password));
        format!("Basic {}", token)
    }

    /// Decodes an `Authorization` header value.
    ///
    /// Returns `None` for other schemes and for malformed tokens. The
    /// password is everything after the first colon.
    pub fn from_header_value(value: &str) -> Option<Self> {
        let (scheme, token) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }
        let decoded = STANDARD.decode(token.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (user, password) = decoded.split_once(':')?;
        Some(Self::new(user, password))
    }

    /// Compares against expected credentials without short-circuiting on
    /// the first differing byte.
    pub fn matches(&self, user: &str, password: &str) -> bool {
        let user_ok = constant_time_eq(&self.user, user);
        let password_ok = constant_time_eq(&self.password, password);
        user_ok & password_ok
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("user", &self.user)
            .field("password", &"*****")
            .finish()
    }
}

/// Performs constant-time string comparison to prevent timing attacks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (byte_a, byte_b) in a.bytes().zip(b.bytes()) {
        result |= byte_a ^ byte_b;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_may_contain_colons() {
        let credentials = BasicCredentials::new("user", "a:b:c");
        let parsed = BasicCredentials::from_header_value(&credentials.to_header_value()).unwrap();
        assert_eq!(parsed.password, "a:b:c");
    }

    #[test]
    fn test_rejects_other_schemes_and_garbage() {
        assert_eq!(BasicCredentials::from_header_value("Bearer abc"), None);
        assert_eq!(BasicCredentials::from_header_value("Basic !!!"), None);
        // valid base64 without a colon
        assert_eq!(BasicCredentials::from_header_value("Basic dXNlcg=="), None);
    }

    #[test]
    fn test_from_config() {
        assert_eq!(BasicCredentials::from_config(&StreamConfig::default()), None);
        let config = StreamConfig {
            basic_user: Some("user".to_string()),
            ..StreamConfig::default()
        };
        assert_eq!(
            BasicCredentials::from_config(&config),
            Some(BasicCredentials::new("user", ""))
        );
    }

    #[test]
    fn test_matches() {
        let credentials = BasicCredentials::new("user", "pass");
        assert!(credentials.matches("user", "pass"));
        assert!(!credentials.matches("user", "pas"));
        assert!(!credentials.matches("usr", "pass"));
    }

    #[test]
    fn test_debug_masks_password() {
        let debug = format!("{:?}", BasicCredentials::new("user", "secret"));
        assert!(debug.contains("user"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("same-key-123", "same-key-123"));
        assert!(!constant_time_eq("key1", "key2"));
        assert!(!constant_time_eq("short", "longer"));
    }
}
