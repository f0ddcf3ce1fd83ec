//! Outbound HTTP transport for the Messages API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::wire::MessagesRequest;

/// A response as received, before any interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body text
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// A request that never produced a complete response
///
/// Covers DNS failures, refused or reset connections, timeouts and body
/// read errors. All of these are treated as transient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Sends one Messages API request
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a single request without retrying
    async fn send(&self, body: &MessagesRequest, api_key: &SecretString) -> Result<RawResponse, TransportError>;
}

/// `reqwest`-backed transport for the Messages API
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    messages_url: String,
    api_version: String,
}

impl HttpTransport {
    /// Create a transport posting to `{base_url}/messages`
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built
    pub fn new(base_url: &Url, api_version: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            messages_url: messages_url(base_url),
            api_version: api_version.to_owned(),
        })
    }

    /// Endpoint requests are posted to
    pub fn messages_url(&self) -> &str {
        &self.messages_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, body: &MessagesRequest, api_key: &SecretString) -> Result<RawResponse, TransportError> {
        let response = self
            .client
            .post(&self.messages_url)
            .header("x-api-key", api_key.expose_secret())
            .header("anthropic-version", &self.api_version)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::debug!(url = %self.messages_url, error = %e, "upstream request failed");
                TransportError(describe(&e))
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(format!("failed to read response body: {}", describe(&e))))?;

        Ok(RawResponse { status, body })
    }
}

/// Build the messages endpoint URL
fn messages_url(base_url: &Url) -> String {
    let base = base_url.as_str().trim_end_matches('/');
    format!("{base}/messages")
}

/// Describe a `reqwest` error with its failure class
fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {error}")
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    }
}
