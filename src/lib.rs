//! tbank-session - Session layer for the T-Bank web API
//!
//! Client-side plumbing that sits between an application and the bank's
//! API: it keeps logins alive across restarts, asks a human for
//! confirmation codes, records traffic and decodes the API's dates.
//!
//! ## Features
//!
//! - File-backed session registry keyed by phone number
//! - Interactive (or substituted) confirmation code prompt
//! - Wire-level dumps of every request and response
//! - Timezone-correct decoding of offset timestamps and calendar dates
//!
//! ## Architecture
//!
//! - **Temporal**: date encodings and the lazily resolved API timezone
//! - **Transport**: send/receive abstraction, reqwest client, traffic recorder
//! - **Auth**: credentials, login flow seam, confirmation code prompt
//! - **Session**: opaque sessions and their durable registry
//! - **Client**: load → login → store pipeline tying the above together
//! - **Invest**: brokerage endpoint schema
//!
//! The login protocol itself is not part of this crate; it plugs in through
//! [`auth::AuthFlow`].

pub mod auth;
pub mod client;
pub mod config;
pub mod invest;
pub mod security;
pub mod session;
pub mod temporal;
pub mod transport;

pub use auth::{AuthFlow, Authorizer, Credential, PromptAuthorizer};
pub use client::{Client, ClientError, ClientParams};
pub use config::ClientConfig;
pub use session::{JsonSessionStorage, Session, SessionStorage};
pub use temporal::{Date, DateTimeMilliOffset};
pub use transport::{HttpTransport, TrafficRecorder, Transport};

/// Initializes logging to stderr
///
/// Honors `RUST_LOG`; defaults to debug output for this crate.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(
                    "tbank_session=debug"
                        .parse()
                        .unwrap_or_else(|_| tracing::Level::DEBUG.into()),
                )
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();
}
