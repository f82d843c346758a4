//! Cookie jar applied above the transport stack
//!
//! The bank's web API tracks parts of the login handshake in cookies. The
//! jar lives in a decorator rather than inside the HTTP client, so the
//! `Cookie` header is already part of the request when a recorder below
//! dumps it.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{COOKIE, SET_COOKIE};

use super::base::{HttpRequest, HttpResponse, Transport, TransportError};

/// Transport decorator that keeps cookies between calls
///
/// Adds the jar's cookies for the request URL unless the request already
/// carries a `Cookie` header, and stores every `Set-Cookie` of the response.
pub struct CookieTransport<T> {
    inner: T,
    jar: Arc<Jar>,
}

impl<T: Transport> CookieTransport<T> {
    /// Wraps `inner` with an empty jar
    pub fn new(inner: T) -> Self {
        Self::with_jar(inner, Arc::new(Jar::default()))
    }

    /// Wraps `inner` with an existing jar
    pub fn with_jar(inner: T, jar: Arc<Jar>) -> Self {
        Self { inner, jar }
    }

    pub fn jar(&self) -> &Arc<Jar> {
        &self.jar
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: Transport> Transport for CookieTransport<T> {
    async fn execute(&self, mut request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if !request.headers.contains_key(COOKIE) {
            if let Some(cookies) = self.jar.cookies(&request.url) {
                request.headers.insert(COOKIE, cookies);
            }
        }

        let url = request.url.clone();
        let response = self.inner.execute(request).await?;

        let mut set_cookies = response.headers.get_all(SET_COOKIE).iter();
        self.jar.set_cookies(&mut set_cookies, &url);

        Ok(response)
    }
}
