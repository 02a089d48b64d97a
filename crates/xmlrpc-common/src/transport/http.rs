//! HTTP framing helpers shared by the client and server.
//!
//! Bodies are produced by [`XmlRpcCodec`](super::XmlRpcCodec); this module
//! only deals with the headers around them: content type, gzip negotiation,
//! Basic credentials and keep-alive.

use hyper::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, CONNECTION, CONTENT_ENCODING};
use hyper::Version;

use crate::auth::BasicCredentials;
use crate::config::StreamConfig;

/// Content type of every request and response body.
pub const CONTENT_TYPE_XML: &str = "text/xml";

/// Token used in `Content-Encoding` and `Accept-Encoding`.
pub const GZIP: &str = "gzip";

/// Whether the peer compressed the body it sent.
pub fn content_encoding_is_gzip(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_ENCODING)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().eq_ignore_ascii_case(GZIP))
        .unwrap_or(false)
}

/// Whether the peer will accept a gzip-compressed reply.
pub fn accepts_gzip(headers: &HeaderMap) -> bool {
    header_tokens(headers, ACCEPT_ENCODING).any(|token| {
        let coding = token.split(';').next().unwrap_or_default().trim();
        coding.eq_ignore_ascii_case(GZIP)
    })
}

/// Whether the sender of a request wants the connection kept open.
///
/// HTTP/1.1 is persistent unless `Connection: close` is present; HTTP/1.0
/// is persistent only with an explicit `Connection: keep-alive`.
pub fn keep_alive_requested(version: Version, headers: &HeaderMap) -> bool {
    let mut tokens = header_tokens(headers, CONNECTION);
    if version == Version::HTTP_10 {
        tokens.any(|token| token.eq_ignore_ascii_case("keep-alive"))
    } else {
        !tokens.any(|token| token.eq_ignore_ascii_case("close"))
    }
}

/// Derives the per-request config the server hands to its handlers.
///
/// The copy carries the credentials the peer presented. Compression of the
/// reply is decided separately from the framing signals.
pub fn request_config(base: &StreamConfig, headers: &HeaderMap) -> StreamConfig {
    let mut config = base.clone();
    let credentials = headers
        .get(hyper::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(BasicCredentials::from_header_value);
    match credentials {
        Some(credentials) => {
            config.basic_user = Some(credentials.user);
            config.basic_password = Some(credentials.password);
        }
        None => {
            config.basic_user = None;
            config.basic_password = None;
        }
    }
    config
}

/// The `Authorization` header for a config's credentials, if any.
pub fn authorization_header(config: &StreamConfig) -> Option<HeaderValue> {
    let credentials = BasicCredentials::from_config(config)?;
    HeaderValue::from_str(&credentials.to_header_value()).ok()
}

fn header_tokens<'a>(
    headers: &'a HeaderMap,
    name: hyper::header::HeaderName,
) -> impl Iterator<Item = &'a str> + 'a {
    headers
        .get_all(name)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
}
