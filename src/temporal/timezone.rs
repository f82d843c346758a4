//! Lazily resolved timezone handle
//!
//! The API interprets calendar dates in a single fixed timezone. Looking the
//! zone up is deferred until the first date is decoded; the outcome, value or
//! error, is then kept for the rest of the process lifetime.

use std::fmt;
use std::sync::OnceLock;

use chrono_tz::Tz;
use thiserror::Error;

/// Timezone in which the API expresses calendar dates
pub const API_TIMEZONE: &str = "Europe/Moscow";

/// Failure to resolve a timezone name
///
/// Cloneable so that a cached failure can be handed to every caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown timezone {name}: {reason}")]
pub struct TimezoneError {
    /// The name that failed to resolve
    pub name: String,
    /// Underlying lookup error
    pub reason: String,
}

type ResolveFn = dyn Fn(&str) -> Result<Tz, TimezoneError> + Send + Sync;

/// Resolves a named timezone at most once
///
/// Concurrent first callers block on the same initialization; exactly one
/// of them runs the lookup and all of them observe its outcome. A failed
/// lookup is never retried.
///
/// # Example
///
/// ```
/// use tbank_session::temporal::TimezoneResolver;
///
/// let resolver = TimezoneResolver::named("Asia/Tokyo");
/// assert!(!resolver.is_resolved());
/// let tz = resolver.get().unwrap();
/// assert_eq!(tz.name(), "Asia/Tokyo");
/// assert!(resolver.is_resolved());
/// ```
pub struct TimezoneResolver {
    name: String,
    resolve: Box<ResolveFn>,
    resolved: OnceLock<Result<Tz, TimezoneError>>,
}

impl TimezoneResolver {
    /// Creates a resolver that looks `name` up in the IANA database
    pub fn named(name: impl Into<String>) -> Self {
        Self::with_lookup(name, lookup)
    }

    /// Creates a resolver with a custom lookup function
    ///
    /// Useful for testing or for zones that are not in the bundled database.
    pub fn with_lookup<F>(name: impl Into<String>, resolve: F) -> Self
    where
        F: Fn(&str) -> Result<Tz, TimezoneError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            resolve: Box::new(resolve),
            resolved: OnceLock::new(),
        }
    }

    /// Returns the timezone name this resolver was created for
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the resolved timezone, resolving it on first use
    pub fn get(&self) -> Result<Tz, TimezoneError> {
        self.resolved
            .get_or_init(|| {
                tracing::debug!("Resolving timezone {}", self.name);
                let result = (self.resolve)(&self.name);
                if let Err(e) = &result {
                    tracing::warn!("Timezone resolution failed: {}", e);
                }
                result
            })
            .clone()
    }

    /// Returns true once a resolution attempt has completed
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }
}

impl fmt::Debug for TimezoneResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimezoneResolver")
            .field("name", &self.name)
            .field("resolved", &self.resolved.get())
            .finish()
    }
}

fn lookup(name: &str) -> Result<Tz, TimezoneError> {
    name.parse::<Tz>().map_err(|e| TimezoneError {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

static API_TIMEZONE_RESOLVER: OnceLock<TimezoneResolver> = OnceLock::new();

/// Process-wide resolver for [`API_TIMEZONE`]
pub fn api_timezone() -> &'static TimezoneResolver {
    API_TIMEZONE_RESOLVER.get_or_init(|| TimezoneResolver::named(API_TIMEZONE))
}
