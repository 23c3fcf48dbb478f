//! Transport collaborators.
//!
//! The core never talks to the network directly. It goes through:
//! - [`HttpTransport`] for request/response calls
//! - [`StreamTransport`] for frame-tagged bidirectional streams (exec)
//! - [`Authorizer`] to decorate outgoing requests with credentials

mod frame;
mod http;
mod stream;
mod websocket;

pub use frame::{Channel, ChannelProtocol, Frame};
pub use http::ReqwestTransport;
pub use stream::{StreamControl, StreamRequest, StreamSink, StreamTransport};
pub use websocket::WebSocketTransport;

use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use std::time::Duration;
use tracing::warn;

/// One request/response exchange.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub timeout: Duration,
    pub body: Option<String>,
}

/// Request/response transport.
///
/// Implementations categorize failures into [`TransportError`] variants and
/// must report an elapsed deadline as [`TransportError::Timeout`]. They don't
/// retry.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request and return the response body.
    async fn send(&self, request: HttpRequest) -> Result<String, TransportError>;
}

/// Decorates outgoing requests with credentials.
pub trait Authorizer: Send + Sync {
    fn decorate(&self, headers: &mut HeaderMap);
}

/// No credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl Authorizer for Anonymous {
    fn decorate(&self, _headers: &mut HeaderMap) {}
}

/// OAuth bearer token
#[derive(Clone)]
pub struct BearerToken {
    token: String,
}

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken").field("token", &"<redacted>").finish()
    }
}

impl Authorizer for BearerToken {
    fn decorate(&self, headers: &mut HeaderMap) {
        match HeaderValue::from_str(&format!("Bearer {}", self.token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(e) => warn!("Bearer token is not a valid header value: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_decoration() {
        let mut headers = HeaderMap::new();
        BearerToken::new("sha256~abc").decorate(&mut headers);
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer sha256~abc");
        assert!(headers.get(AUTHORIZATION).unwrap().is_sensitive());
    }

    #[test]
    fn test_invalid_token_is_skipped() {
        let mut headers = HeaderMap::new();
        BearerToken::new("bad\ntoken").decorate(&mut headers);
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_token_is_redacted_in_debug() {
        let debug = format!("{:?}", BearerToken::new("secret"));
        assert!(!debug.contains("secret"));
    }
}
