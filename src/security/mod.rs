//! Security module - Masking for logs and zeroized secrets
//!
//! - Identities, tokens and URLs are masked before they reach a log line
//! - Passwords are held in memory that is wiped on drop

mod sanitizer;
mod secure_string;

pub use sanitizer::Sanitizer;
pub use secure_string::SecureString;
