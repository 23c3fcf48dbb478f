//! `reqwest`-backed [`HttpTransport`].

use super::{HttpRequest, HttpTransport};
use crate::error::{Error, Result, TransportError};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::debug;

/// HTTP transport built on a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        Self::build(false)
    }

    /// Transport that accepts self-signed or otherwise invalid certificates.
    ///
    /// Development clusters commonly serve the API with a self-signed CA.
    pub fn insecure() -> Result<Self> {
        Self::build(true)
    }

    fn build(insecure: bool) -> Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(insecure)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> std::result::Result<String, TransportError> {
        let HttpRequest {
            method,
            url,
            headers,
            timeout,
            body,
        } = request;
        debug!("API request: {} {}", method, url);

        let mut req = self
            .client
            .request(method, &url)
            .headers(headers)
            .header(ACCEPT, "application/json")
            .timeout(timeout);
        if let Some(body) = body {
            req = req.header(CONTENT_TYPE, "application/json").body(body);
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout {
                    url: url.clone(),
                    timeout_ms: timeout.as_millis() as u64,
                }
            } else {
                TransportError::other(&url, e.to_string())
            }
        })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout {
                    url: url.clone(),
                    timeout_ms: timeout.as_millis() as u64,
                }
            } else {
                TransportError::other(&url, format!("Failed to read response: {}", e))
            }
        })?;

        if status.is_success() {
            Ok(text)
        } else {
            debug!("API error {} for {}", status, url);
            Err(TransportError::from_status(status.as_u16(), url, &text))
        }
    }
}
