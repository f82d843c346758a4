//! Wire-level recording of every request/response exchange
//!
//! The recorder is purely observational: requests are forwarded as they
//! are, responses and errors are returned as they come back. Only the sink
//! sees anything extra.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_LENGTH, HOST};

use super::base::{HttpRequest, HttpResponse, Transport, TransportError};

/// Renders a request the way it goes out on the wire
///
/// Includes the request line, a `Host` header, all headers and the body.
/// `Content-Length` is added when the body is non-empty and the header is
/// absent.
pub fn dump_request(request: &HttpRequest) -> Vec<u8> {
    let mut out = Vec::with_capacity(256 + request.body.len());

    let mut target = request.url.path().to_string();
    if let Some(query) = request.url.query() {
        target.push('?');
        target.push_str(query);
    }
    out.extend_from_slice(
        format!("{} {} {:?}\r\n", request.method, target, request.version).as_bytes(),
    );

    if !request.headers.contains_key(HOST) {
        if let Some(host) = request.url.host_str() {
            let host = match request.url.port() {
                Some(port) => format!("{}:{}", host, port),
                None => host.to_string(),
            };
            out.extend_from_slice(format!("Host: {}\r\n", host).as_bytes());
        }
    }

    write_headers(&mut out, &request.headers);
    if !request.body.is_empty() && !request.headers.contains_key(CONTENT_LENGTH) {
        out.extend_from_slice(format!("Content-Length: {}\r\n", request.body.len()).as_bytes());
    }

    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(&request.body);
    out
}

/// Renders a response: status line, headers and body
pub fn dump_response(response: &HttpResponse) -> Vec<u8> {
    let mut out = Vec::with_capacity(256 + response.body.len());
    out.extend_from_slice(format!("{:?} {}\r\n", response.version, response.status).as_bytes());
    write_headers(&mut out, &response.headers);
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(&response.body);
    out
}

fn write_headers(out: &mut Vec<u8>, headers: &HeaderMap) {
    for (name, value) in headers {
        out.extend_from_slice(name.as_str().as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
}

/// Transport decorator that dumps each exchange to a diagnostic sink
///
/// For every call the request dump is written before dispatch and the
/// response dump after it. A failure to write either dump fails the call;
/// transport errors are returned unchanged and produce no response dump.
///
/// Sink writes are blocking and run on the calling task while the sink is
/// locked. A slow sink stalls every call that goes through the recorder.
///
/// # Example
///
/// ```no_run
/// use tbank_session::transport::{HttpRequest, HttpTransport, TrafficRecorder, Transport};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = TrafficRecorder::new(HttpTransport::new()?);
/// let response = transport.execute(HttpRequest::get("https://www.tbank.ru/")?).await?;
/// println!("{}", response.status);
/// # Ok(())
/// # }
/// ```
pub struct TrafficRecorder<T> {
    inner: T,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl<T: Transport> TrafficRecorder<T> {
    /// Wraps `inner`, dumping to standard output
    pub fn new(inner: T) -> Self {
        Self::with_sink(inner, io::stdout())
    }

    /// Wraps `inner`, dumping to `sink`
    pub fn with_sink(inner: T, sink: impl Write + Send + 'static) -> Self {
        Self {
            inner,
            sink: Mutex::new(Box::new(sink)),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    fn record(&self, what: &'static str, dump: &[u8]) -> Result<(), TransportError> {
        // A panic elsewhere while holding the sink leaves it usable
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        sink.write_all(dump)
            .and_then(|_| sink.write_all(b"\n"))
            .and_then(|_| sink.flush())
            .map_err(|source| {
                tracing::error!("Failed to record {}: {}", what, source);
                TransportError::Dump { what, source }
            })
    }
}

#[async_trait]
impl<T: Transport> Transport for TrafficRecorder<T> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.record("request", &dump_request(&request))?;

        let response = self.inner.execute(request).await?;

        self.record("response", &dump_response(&response))?;
        Ok(response)
    }
}
