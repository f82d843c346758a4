//! Transport module - The send/receive capability used for every API call
//!
//! - [`Transport`]: minimal "send request, get response" abstraction
//! - [`HttpTransport`]: reqwest-backed implementation
//! - [`TrafficRecorder`]: decorator that dumps every exchange to a sink
//! - [`CookieTransport`]: decorator keeping a cookie jar, stacked above the
//!   recorder so dumps show the cookies that are sent

mod base;
mod cookies;
mod http;
mod recorder;

pub use base::{HttpRequest, HttpResponse, Transport, TransportError};
pub use cookies::CookieTransport;
pub use http::HttpTransport;
pub use recorder::{dump_request, dump_response, TrafficRecorder};

#[cfg(test)]
pub use base::MockTransport;
