//! Buffered request/response types and the Transport trait

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Method, StatusCode, Url, Version};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors that can occur while exchanging a request
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network or protocol failure in the underlying client
    #[error("Network error: {0}")]
    Request(#[from] reqwest::Error),

    /// URL could not be parsed
    #[error("Invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Writing a diagnostic dump failed
    #[error("dump {what}: {source}")]
    Dump {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Failure reported by a custom transport
    #[error("Transport error: {0}")]
    Other(String),
}

/// A fully buffered outgoing request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpRequest {
    /// Creates an HTTP/1.1 request with an empty body
    ///
    /// Carries `accept: */*`, the header reqwest would otherwise add on its
    /// own, so a dump of the request matches what is sent.
    pub fn new(method: Method, url: Url) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        Self {
            method,
            url,
            version: Version::HTTP_11,
            headers,
            body: Bytes::new(),
        }
    }

    /// Creates a GET request, parsing `url`
    pub fn get(url: &str) -> Result<Self, TransportError> {
        Ok(Self::new(Method::GET, parse_url(url)?))
    }

    /// Creates a POST request, parsing `url`
    pub fn post(url: &str) -> Result<Self, TransportError> {
        Ok(Self::new(Method::POST, parse_url(url)?))
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Appends a query parameter to the URL
    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(key, value);
        self
    }
}

/// A fully buffered response
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    /// Creates an HTTP/1.1 response with no headers and an empty body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Decodes the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Returns the body as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends a request and returns the response
///
/// Implementations must not retry; retry policy belongs to the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request).await
    }
}

fn parse_url(url: &str) -> Result<Url, TransportError> {
    Url::parse(url).map_err(|e| TransportError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}
