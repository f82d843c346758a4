//! reqwest-backed transport

use async_trait::async_trait;
use reqwest::Client;

use super::base::{HttpRequest, HttpResponse, Transport, TransportError};
use crate::security::Sanitizer;

/// Transport that sends requests over the network with reqwest
///
/// Requests go out with exactly the headers they carry, plus the `Host` and
/// `Content-Length` the connection needs. Cookies are handled by
/// [`CookieTransport`](super::CookieTransport) further up the stack.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with a default client
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client))
    }

    /// Creates a transport around an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        tracing::debug!(
            "{} {}",
            request.method,
            Sanitizer::sanitize_url(request.url.as_str())
        );

        let response = self
            .client
            .request(request.method, request.url)
            .version(request.version)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await?;

        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        tracing::debug!("Response status: {} ({} bytes)", status, body.len());

        Ok(HttpResponse {
            status,
            version,
            headers,
            body,
        })
    }
}
