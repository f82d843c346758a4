//! Confirmation code prompt
//!
//! A login flow that hits a multi-factor challenge asks an [`Authorizer`]
//! for the code. The authorizer is passed to the flow explicitly, so tests
//! and unattended tools can swap in their own implementation.

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout,
};
use tokio::sync::Mutex;

use crate::security::Sanitizer;

/// Errors that can occur while obtaining a confirmation code
#[derive(Debug, Error)]
pub enum AuthorizeError {
    /// Input ended before a line was entered
    #[error("read line from input: input closed")]
    InputClosed,

    /// Reading the code or writing the prompt failed
    #[error("{op}: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Failure reported by a custom authorizer
    #[error("Authorization failed: {0}")]
    Other(String),
}

/// Supplies confirmation codes to an in-progress login
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Returns the confirmation code for `identity`
    async fn confirmation_code(&self, identity: &str) -> Result<String, AuthorizeError>;
}

/// Interactive authorizer: prints a prompt and reads one line
///
/// Blocks until a line arrives or the input closes; there is no timeout.
/// Prompts are serialized, so two concurrent logins never interleave their
/// questions.
pub struct PromptAuthorizer<R, W> {
    io: Mutex<(R, W)>,
}

impl PromptAuthorizer<BufReader<Stdin>, Stdout> {
    /// Prompts on standard output and reads from standard input
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> PromptAuthorizer<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            io: Mutex::new((input, output)),
        }
    }

    /// Returns the input and output back
    pub fn into_inner(self) -> (R, W) {
        self.io.into_inner()
    }
}

#[async_trait]
impl<R, W> Authorizer for PromptAuthorizer<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn confirmation_code(&self, identity: &str) -> Result<String, AuthorizeError> {
        let mut io = self.io.lock().await;
        let (input, output) = &mut *io;

        tracing::info!(
            "Waiting for confirmation code for {}",
            Sanitizer::mask_phone(identity)
        );

        let prompt = format!("Enter confirmation code for {}: ", identity);
        output
            .write_all(prompt.as_bytes())
            .await
            .map_err(|source| AuthorizeError::Io {
                op: "write prompt",
                source,
            })?;
        output.flush().await.map_err(|source| AuthorizeError::Io {
            op: "write prompt",
            source,
        })?;

        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .await
            .map_err(|source| AuthorizeError::Io {
                op: "read line from input",
                source,
            })?;

        if read == 0 {
            return Err(AuthorizeError::InputClosed);
        }

        Ok(trim_code(&line).to_string())
    }
}

fn trim_code(line: &str) -> &str {
    line.trim_matches(|c: char| c.is_whitespace() || c.is_control())
}

/// Authorizer that always answers with the same code
#[derive(Debug, Clone)]
pub struct StaticAuthorizer {
    code: String,
}

impl StaticAuthorizer {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

#[async_trait]
impl Authorizer for StaticAuthorizer {
    async fn confirmation_code(&self, _identity: &str) -> Result<String, AuthorizeError> {
        Ok(self.code.clone())
    }
}
