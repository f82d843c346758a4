//! Login flow abstraction

use async_trait::async_trait;
use thiserror::Error;

use super::authorizer::{AuthorizeError, Authorizer};
use crate::security::{Sanitizer, SecureString};
use crate::session::Session;
use crate::transport::{Transport, TransportError};

/// Login credentials for one identity
#[derive(Debug, Clone)]
pub struct Credential {
    /// Phone number, also the key under which the session is stored
    pub phone: String,
    pub password: SecureString,
}

impl Credential {
    pub fn new(phone: impl Into<String>, password: impl Into<SecureString>) -> Self {
        Self {
            phone: phone.into(),
            password: password.into(),
        }
    }

    /// Phone number safe to put in a log line
    pub fn masked_phone(&self) -> String {
        Sanitizer::mask_phone(&self.phone)
    }
}

/// Errors that can end a login attempt
#[derive(Debug, Error)]
pub enum AuthFlowError {
    /// The confirmation code could not be obtained
    #[error("get confirmation code: {0}")]
    Authorize(#[from] AuthorizeError),

    /// A request of the handshake failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The bank refused the login
    #[error("Login rejected: {0}")]
    Rejected(String),
}

/// A remote login protocol
///
/// Implementations perform the handshake through `transport` (so it gets
/// recorded like any other call) and ask `authorizer` for a confirmation
/// code when challenged. Each call is a single attempt; no retries.
#[async_trait]
pub trait AuthFlow: Send + Sync {
    async fn login(
        &self,
        credential: &Credential,
        authorizer: &dyn Authorizer,
        transport: &dyn Transport,
    ) -> Result<Session, AuthFlowError>;
}
