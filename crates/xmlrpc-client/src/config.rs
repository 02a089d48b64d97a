//! Client configuration.

use hyper::Uri;
use serde::{Deserialize, Serialize};
use xmlrpc_common::StreamConfig;

/// Configuration for an [`XmlRpcClient`](crate::XmlRpcClient).
///
/// # Fields
///
/// - `server_url` - Endpoint receiving the `POST`s, e.g. `http://127.0.0.1:8080/RPC2`
/// - `user_agent` - Value of the `User-Agent` header
/// - `max_concurrency` - Calls this client runs at once (default: 16)
/// - `max_idle_workers` - Released execution slots kept for reuse
/// - `stream` - Encoding options attached to every request
///
/// # Example
///
/// ```
/// use xmlrpc_client::ClientConfig;
///
/// let config = ClientConfig::new("http://127.0.0.1:8080/RPC2").with_max_concurrency(4);
/// assert!(config.validate().is_ok());
/// assert!(ClientConfig::new("ftp://example").validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    pub user_agent: String,
    pub max_concurrency: usize,
    pub max_idle_workers: usize,
    pub stream: StreamConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080/".to_string(),
            user_agent: concat!("xmlrpc-rs/", env!("CARGO_PKG_VERSION")).to_string(),
            max_concurrency: 16,
            max_idle_workers: 16,
            stream: StreamConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ..Self::default()
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
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

    pub fn with_stream(mut self, stream: StreamConfig) -> Self {
        self.stream = stream;
        self
    }

    /// Parses `server_url`, accepting only absolute `http` URLs.
    pub fn server_uri(&self) -> Result<Uri, String> {
        let uri: Uri = self
            .server_url
            .parse()
            .map_err(|e| format!("invalid server URL '{}': {}", self.server_url, e))?;
        if uri.scheme_str() != Some("http") {
            return Err(format!(
                "server URL '{}' must use the http:// scheme",
                self.server_url
            ));
        }
        if uri.authority().is_none() {
            return Err(format!("server URL '{}' has no host", self.server_url));
        }
        Ok(uri)
    }

    /// Validates the client configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The server URL is not an absolute `http` URL
    /// - `max_concurrency` is zero
    /// - The stream config is invalid
    pub fn validate(&self) -> Result<(), String> {
        self.server_uri()?;

        if self.max_concurrency == 0 {
            return Err("max_concurrency must be greater than zero".to_string());
        }

        self.stream.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ClientConfig::default().validate().is_ok());
    }

    #[test]
    fn test_server_uri_parts() {
        let uri = ClientConfig::new("http://127.0.0.1:9000/RPC2").server_uri().unwrap();
        assert_eq!(uri.authority().unwrap().as_str(), "127.0.0.1:9000");
        assert_eq!(uri.path(), "/RPC2");
    }

    #[test]
    fn test_rejects_bad_urls() {
        assert!(ClientConfig::new("127.0.0.1:8080").validate().is_err());
        assert!(ClientConfig::new("https://127.0.0.1").validate().is_err());
        assert!(ClientConfig::new("not a url").validate().is_err());
    }

    #[test]
    fn test_zero_concurrency_is_invalid() {
        let config = ClientConfig::default().with_max_concurrency(0);
        assert!(config.validate().unwrap_err().contains("max_concurrency"));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"server_url": "http://10.0.0.1:80/", "stream": {"gzip_requesting": true}}"#,
        )
        .unwrap();
        assert_eq!(config.max_concurrency, 16);
        assert!(config.stream.gzip_requesting);
    }
}
