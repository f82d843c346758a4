//! Configuration management for tbank-session
//!
//! Settings come from the environment:
//!
//! | Variable | Meaning |
//! |---|---|
//! | `TBANK_PHONE` | identity to act for |
//! | `TBANK_PASSWORD` | password, only needed when a login runs |
//! | `TBANK_SESSIONS_FILE` | session registry path |
//! | `TBANK_DUMP_TRAFFIC` | record every exchange to stdout (default on) |
//!
//! Supports Windows, macOS, and Linux default locations.

use std::path::PathBuf;

use thiserror::Error;

use crate::auth::Credential;
use crate::security::SecureString;

pub const PHONE_VAR: &str = "TBANK_PHONE";
pub const PASSWORD_VAR: &str = "TBANK_PASSWORD";
pub const SESSIONS_FILE_VAR: &str = "TBANK_SESSIONS_FILE";
pub const DUMP_TRAFFIC_VAR: &str = "TBANK_DUMP_TRAFFIC";

/// Errors that can occur while reading configuration
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("environment variable {0} is required")]
    Missing(&'static str),

    /// A variable is set to something unusable
    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },

    /// No default location for the sessions file on this platform
    #[error("could not determine sessions file path, set TBANK_SESSIONS_FILE")]
    NoSessionsPath,
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub phone: Option<String>,
    pub password: Option<SecureString>,
    pub sessions_file: PathBuf,
    pub dump_traffic: bool,
}

impl ClientConfig {
    /// Reads configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads configuration through `lookup`
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.is_empty());

        let sessions_file = match get(SESSIONS_FILE_VAR) {
            Some(path) => PathBuf::from(path),
            None => default_sessions_file().ok_or(ConfigError::NoSessionsPath)?,
        };

        let dump_traffic = match get(DUMP_TRAFFIC_VAR) {
            Some(value) => parse_flag(DUMP_TRAFFIC_VAR, &value)?,
            None => true,
        };

        Ok(Self {
            phone: get(PHONE_VAR),
            password: get(PASSWORD_VAR).map(SecureString::from),
            sessions_file,
            dump_traffic,
        })
    }

    /// Returns the configured phone number
    pub fn require_phone(&self) -> Result<&str, ConfigError> {
        self.phone.as_deref().ok_or(ConfigError::Missing(PHONE_VAR))
    }

    /// Returns login credentials for the configured phone
    ///
    /// The password is empty when unset; only a login needs it.
    pub fn credential(&self) -> Result<Credential, ConfigError> {
        let phone = self.require_phone()?;
        let password = self.password.clone().unwrap_or_default();
        Ok(Credential::new(phone, password))
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
        }),
    }
}

/// Gets the config directory path (cross-platform)
fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA")
            .ok()
            .map(|p| PathBuf::from(p).join("tbank"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|p| PathBuf::from(p).join("Library/Application Support/tbank"))
    }

    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| std::env::var("HOME").ok().map(|p| PathBuf::from(p).join(".config")))
            .map(|p| p.join("tbank"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

/// Default location of the session registry
pub fn default_sessions_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("sessions.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| vars.get(var).cloned()
    }

    #[test]
    fn test_full_config() {
        let config = ClientConfig::from_lookup(lookup(&[
            (PHONE_VAR, "+79990000001"),
            (PASSWORD_VAR, "secret"),
            (SESSIONS_FILE_VAR, "/tmp/tbank/sessions.json"),
            (DUMP_TRAFFIC_VAR, "off"),
        ]))
        .unwrap();

        assert_eq!(config.phone.as_deref(), Some("+79990000001"));
        assert_eq!(config.sessions_file, PathBuf::from("/tmp/tbank/sessions.json"));
        assert!(!config.dump_traffic);

        let credential = config.credential().unwrap();
        assert_eq!(credential.phone, "+79990000001");
        assert_eq!(credential.password.expose(), "secret");
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[(
            SESSIONS_FILE_VAR,
            "sessions.json",
        )]))
        .unwrap();

        assert!(config.phone.is_none());
        assert!(config.password.is_none());
        assert!(config.dump_traffic);
        assert_eq!(config.require_phone(), Err(ConfigError::Missing(PHONE_VAR)));
    }

    #[test]
    fn test_credential_without_password() {
        let config = ClientConfig::from_lookup(lookup(&[
            (PHONE_VAR, "+79990000001"),
            (PASSWORD_VAR, ""),
            (SESSIONS_FILE_VAR, "sessions.json"),
        ]))
        .unwrap();

        let credential = config.credential().unwrap();
        assert_eq!(credential.phone, "+79990000001");
        assert!(credential.password.is_empty());
    }

    #[test]
    fn test_credential_requires_phone() {
        let config =
            ClientConfig::from_lookup(lookup(&[(SESSIONS_FILE_VAR, "sessions.json")])).unwrap();
        assert_eq!(
            config.credential().unwrap_err(),
            ConfigError::Missing(PHONE_VAR)
        );
    }

    #[test]
    fn test_invalid_flag() {
        let err = ClientConfig::from_lookup(lookup(&[
            (SESSIONS_FILE_VAR, "sessions.json"),
            (DUMP_TRAFFIC_VAR, "maybe"),
        ]))
        .unwrap_err();

        assert_eq!(
            err,
            ConfigError::Invalid {
                var: DUMP_TRAFFIC_VAR,
                value: "maybe".to_string()
            }
        );
    }

    #[test]
    fn test_flag_values() {
        for value in ["1", "TRUE", "yes", "On"] {
            assert_eq!(parse_flag(DUMP_TRAFFIC_VAR, value), Ok(true));
        }
        for value in ["0", "False", "no", "OFF"] {
            assert_eq!(parse_flag(DUMP_TRAFFIC_VAR, value), Ok(false));
        }
    }

    #[test]
    fn test_default_sessions_file() {
        // Just verifies the function doesn't panic and names the file
        if let Some(path) = default_sessions_file() {
            assert!(path.ends_with("tbank/sessions.json"));
        }
    }
}
