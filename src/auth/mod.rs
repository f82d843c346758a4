//! Authentication module - Credentials, login flows and confirmation codes
//!
//! The remote login protocol itself lives outside this crate and plugs in
//! through [`AuthFlow`]. It receives the [`Authorizer`] explicitly whenever a
//! confirmation code is needed.

mod authorizer;
mod flow;

pub use authorizer::{AuthorizeError, Authorizer, PromptAuthorizer, StaticAuthorizer};
pub use flow::{AuthFlow, AuthFlowError, Credential};
