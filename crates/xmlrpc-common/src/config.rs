//! Stream configuration shared by both roles.
//!
//! A [`StreamConfig`] is passed explicitly to every codec and transport entry
//! point. It is read-only for the duration of a call; the server derives a
//! per-request copy carrying the peer's credentials and compression signals.

use serde::{Deserialize, Serialize};

/// The only character encoding accepted on the wire.
pub const UTF8: &str = "UTF-8";

/// Options governing how a single request/response exchange is encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Compress the outgoing body with gzip
    pub gzip_compressing: bool,
    /// Ask the peer to compress its reply
    pub gzip_requesting: bool,
    /// Allow the extension value types on the wire
    pub enabled_for_extensions: bool,
    /// Basic authentication user name
    pub basic_user: Option<String>,
    /// Basic authentication password
    pub basic_password: Option<String>,
    /// Stream the body without announcing its length
    pub content_length_optional: bool,
    /// Connect timeout in milliseconds
    pub connection_timeout_ms: Option<u64>,
    /// Timeout waiting for the reply in milliseconds
    pub reply_timeout_ms: Option<u64>,
    /// Character encoding of the XML document
    pub encoding: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            gzip_compressing: false,
            gzip_requesting: false,
            enabled_for_extensions: false,
            basic_user: None,
            basic_password: None,
            content_length_optional: false,
            connection_timeout_ms: None,
            reply_timeout_ms: None,
            encoding: UTF8.to_string(),
        }
    }
}

impl StreamConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gzip_compressing(mut self, enabled: bool) -> Self {
        self.gzip_compressing = enabled;
        self
    }

    pub fn with_gzip_requesting(mut self, enabled: bool) -> Self {
        self.gzip_requesting = enabled;
        self
    }

    pub fn with_extensions(mut self, enabled: bool) -> Self {
        self.enabled_for_extensions = enabled;
        self
    }

    pub fn with_basic_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_user = Some(user.into());
        self.basic_password = Some(password.into());
        self
    }

    pub fn with_content_length_optional(mut self, optional: bool) -> Self {
        self.content_length_optional = optional;
        self
    }

    pub fn with_connection_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.connection_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_reply_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.reply_timeout_ms = Some(timeout_ms);
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The encoding is anything other than UTF-8
    /// - A password is set without a user
    /// - A timeout is zero
    pub fn validate(&self) -> Result<(), String> {
        if !self.encoding.eq_ignore_ascii_case(UTF8) {
            return Err(format!("unsupported encoding '{}', only {} is supported", self.encoding, UTF8));
        }

        if self.basic_password.is_some() && self.basic_user.is_none() {
            return Err("basic password configured without a basic user".to_string());
        }

        if self.connection_timeout_ms == Some(0) || self.reply_timeout_ms == Some(0) {
            return Err("timeouts must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StreamConfig::default();
        assert!(!config.gzip_compressing);
        assert!(!config.enabled_for_extensions);
        assert_eq!(config.encoding, UTF8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern_chaining() {
        let config = StreamConfig::new()
            .with_gzip_compressing(true)
            .with_gzip_requesting(true)
            .with_extensions(true)
            .with_basic_auth("user", "secret")
            .with_reply_timeout_ms(500);

        assert!(config.gzip_compressing);
        assert!(config.gzip_requesting);
        assert!(config.enabled_for_extensions);
        assert_eq!(config.basic_user.as_deref(), Some("user"));
        assert_eq!(config.reply_timeout_ms, Some(500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_other_encodings() {
        let config = StreamConfig {
            encoding: "ISO-8859-1".into(),
            ..StreamConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("ISO-8859-1"));
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let config = StreamConfig::new().with_connection_timeout_ms(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: StreamConfig =
            serde_json::from_str(r#"{"gzip_requesting": true, "enabled_for_extensions": true}"#).unwrap();
        assert!(config.gzip_requesting);
        assert!(config.enabled_for_extensions);
        assert!(!config.gzip_compressing);
        assert_eq!(config.encoding, UTF8);
    }
}
