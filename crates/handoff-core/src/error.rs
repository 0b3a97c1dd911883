//! Configuration error types.
//!
//! These are deployment-level failures, not request errors: a broken
//! route mapping or user model descriptor means the installation is
//! misconfigured, and callers must propagate these as hard failures
//! rather than downgrade them to a 4xx.

use thiserror::Error;

/// Errors arising from handoff configuration or its resolution at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Issuance was requested with neither a target path nor a source route.
    #[error("Handoff issuance requires either a target path or a source route")]
    MissingTarget,

    /// A source route was given that has no entry in the route mapping.
    #[error("No handoff route mapping found for route [{0}]")]
    UnmappedRoute(String),

    /// The target host is missing a scheme or host component.
    #[error("Invalid handoff target host [{0}]: must be an http(s) origin with no path or query")]
    InvalidTargetHost(String),

    /// The configured user model name has no registry entry.
    #[error("Configured user model [{0}] does not exist")]
    UnknownUserModel(String),

    /// The registry entry for the configured user model is not a user repository.
    #[error("Configured user model [{0}] must implement Authenticatable")]
    NotAuthenticatable(String),
}
