//! Server configuration.

use serde::{Deserialize, Serialize};
use xmlrpc_common::StreamConfig;

/// Configuration for an [`XmlRpcServer`](crate::XmlRpcServer) and its
/// HTTP listener.
///
/// # Fields
///
/// - `stream` - Encoding options applied to every exchange
/// - `max_concurrency` - Calls admitted at once (default: 100)
/// - `max_idle_workers` - Released execution slots kept for reuse (default: 16)
/// - `keep_alive` - Whether connections may serve more than one call
/// - `max_requests_per_connection` - Calls served before a kept-alive connection is closed
/// - `max_body_size` - Largest accepted request body in bytes
/// - `introspection` - Serve the `system.*` methods
///
/// # Example
///
/// ```
/// use xmlrpc_server::ServerConfig;
///
/// let config = ServerConfig::new()
///     .with_max_concurrency(8)
///     .with_keep_alive(false);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub stream: StreamConfig,
    pub max_concurrency: usize,
    pub max_idle_workers: usize,
    pub keep_alive: bool,
    pub max_requests_per_connection: usize,
    pub max_body_size: usize,
    pub introspection: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            stream: StreamConfig::default(),
            max_concurrency: 100,
            max_idle_workers: 16,
            keep_alive: true,
            max_requests_per_connection: 100,
            max_body_size: 16 * 1024 * 1024,
            introspection: true,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stream(mut self, stream: StreamConfig) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_max_idle_workers(mut self, max_idle_workers: usize) -> Self {
        self.max_idle_workers = max_idle_workers;
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn with_max_requests_per_connection(mut self, max_requests: usize) -> Self {
        self.max_requests_per_connection = max_requests;
        self
    }

    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    pub fn with_introspection(mut self, introspection: bool) -> Self {
        self.introspection = introspection;
        self
    }

    /// Validates the server configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The stream config is invalid
    /// - `max_concurrency` is zero
    /// - `max_requests_per_connection` is zero
    /// - `max_body_size` is zero
    pub fn validate(&self) -> Result<(), String> {
        self.stream.validate()?;

        if self.max_concurrency == 0 {
            return Err("max_concurrency must be greater than zero".to_string());
        }

        if self.max_requests_per_connection == 0 {
            return Err("max_requests_per_connection must be greater than zero".to_string());
        }

        if self.max_body_size == 0 {
            return Err("max_body_size must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ServerConfig::default();
        assert_eq!(config.max_concurrency, 100);
        assert!(config.keep_alive);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_is_invalid() {
        let config = ServerConfig::new().with_max_concurrency(0);
        assert!(config.validate().unwrap_err().contains("max_concurrency"));
    }

    #[test]
    fn test_zero_request_cap_is_invalid() {
        assert!(ServerConfig::new()
            .with_max_requests_per_connection(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_stream_errors_surface() {
        let mut stream = StreamConfig::default();
        stream.encoding = "latin1".to_string();
        assert!(ServerConfig::new().with_stream(stream).validate().is_err());
    }
}
