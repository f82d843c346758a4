//! Session acquisition pipeline
//!
//! An API call needs a session. The client looks in memory first, then in
//! the session storage, and only then runs the login flow. A fresh session
//! is written back before it is used.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

use reqwest::StatusCode;

use crate::auth::{AuthFlow, AuthFlowError, Authorizer, Credential};
use crate::invest::Endpoint;
use crate::session::{Session, SessionStorage, SessionStoreError};
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};

/// Errors surfaced by [`Client`]
#[derive(Debug, Error)]
pub enum ClientError {
    /// Session storage failed
    #[error("session storage: {0}")]
    Storage(#[from] SessionStoreError),

    /// Login failed
    #[error("login: {0}")]
    AuthFlow(#[from] AuthFlowError),

    /// Request failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Server answered with a non-success status
    #[error("unexpected status {0}")]
    Status(StatusCode),

    /// Response body does not match the endpoint's payload
    #[error("decode response: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Collaborators of a [`Client`]
pub struct ClientParams {
    pub credential: Credential,
    pub storage: Arc<dyn SessionStorage>,
    pub transport: Arc<dyn Transport>,
    pub auth_flow: Arc<dyn AuthFlow>,
    pub authorizer: Arc<dyn Authorizer>,
}

/// Holds one identity's session and keeps it in sync with storage
///
/// Login attempts of a single client are serialized; two processes sharing
/// a registry file are not coordinated.
pub struct Client {
    credential: Credential,
    storage: Arc<dyn SessionStorage>,
    transport: Arc<dyn Transport>,
    auth_flow: Arc<dyn AuthFlow>,
    authorizer: Arc<dyn Authorizer>,
    session: Mutex<Option<Session>>,
}

impl Client {
    pub fn new(params: ClientParams) -> Self {
        Self {
            credential: params.credential,
            storage: params.storage,
            transport: params.transport,
            auth_flow: params.auth_flow,
            authorizer: params.authorizer,
            session: Mutex::new(None),
        }
    }

    /// Identity this client acts for
    pub fn phone(&self) -> &str {
        &self.credential.phone
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Returns a session, logging in if none is stored
    pub async fn session(&self) -> Result<Session, ClientError> {
        let mut cached = self.session.lock().await;
        if let Some(session) = cached.as_ref() {
            return Ok(session.clone());
        }

        let phone = self.phone();
        if let Some(session) = self.storage.load_session(phone).await? {
            tracing::debug!("Using stored session for {}", self.credential.masked_phone());
            *cached = Some(session.clone());
            return Ok(session);
        }

        tracing::info!(
            "No stored session for {}, logging in",
            self.credential.masked_phone()
        );

        let session = self
            .auth_flow
            .login(
                &self.credential,
                self.authorizer.as_ref(),
                self.transport.as_ref(),
            )
            .await
            .map_err(|e| {
                tracing::warn!("Login failed for {}: {}", self.credential.masked_phone(), e);
                e
            })?;

        self.storage.update_session(phone, Some(&session)).await?;
        *cached = Some(session.clone());

        tracing::info!("Logged in as {}", self.credential.masked_phone());
        Ok(session)
    }

    /// Builds a request from the current session and sends it
    pub async fn call<F>(&self, build: F) -> Result<HttpResponse, ClientError>
    where
        F: FnOnce(&Session) -> HttpRequest + Send,
    {
        let session = self.session().await?;
        let request = build(&session);
        Ok(self.transport.execute(request).await?)
    }

    /// Calls `endpoint` under `base_url` and decodes its payload
    ///
    /// The session identifier, when the session has one, is sent as the
    /// `sessionId` query parameter.
    pub async fn get<E>(&self, base_url: &str, endpoint: &E) -> Result<E::Out, ClientError>
    where
        E: Endpoint + Sync,
    {
        let request = endpoint.request(base_url)?;
        let response = self
            .call(move |session| match session.id() {
                Some(id) => request.with_query("sessionId", id),
                None => request,
            })
            .await?;

        if !response.status.is_success() {
            tracing::warn!("{} answered {}", E::PATH, response.status);
            return Err(ClientError::Status(response.status));
        }

        response.json().map_err(ClientError::Decode)
    }

    /// Forgets the session, in memory and in storage
    ///
    /// The next call to [`Client::session`] logs in again.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let mut cached = self.session.lock().await;
        self.storage.update_session(self.phone(), None).await?;
        *cached = None;

        tracing::info!("Logged out {}", self.credential.masked_phone());
        Ok(())
    }
}
