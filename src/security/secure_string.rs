//! Password storage that is wiped from memory on drop

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// A string whose buffer is zeroed when dropped
///
/// `Debug` never prints the content, so a credential can sit inside a
/// struct that derives `Debug` without leaking into logs.
///
/// # Example
///
/// ```
/// use tbank_session::security::SecureString;
///
/// let password = SecureString::from("hunter2");
/// assert_eq!(password.expose(), "hunter2");
/// assert_eq!(format!("{:?}", password), "SecureString([REDACTED])");
/// ```
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecureString(String);

impl SecureString {
    /// Wraps an owned string without copying it
    pub fn new(s: String) -> Self {
        Self(s)
    }

    /// Returns the secret value
    ///
    /// Callers should pass the result straight to where it is needed and
    /// not keep copies around.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecureString([REDACTED])")
    }
}

impl PartialEq for SecureString {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(self.0.as_bytes(), other.0.as_bytes())
    }
}

impl Eq for SecureString {}

/// Compares without short-circuiting on the first differing byte
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
