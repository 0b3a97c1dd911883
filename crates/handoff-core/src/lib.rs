//! Core types for cross-application session handoff.
//!
//! This crate provides:
//! - [`HandoffConfig`]: process-wide, immutable configuration (TTL, target
//!   host, route mapping, user model descriptor, shared secret)
//! - [`Authenticatable`]: capability trait for user types crossing the
//!   handoff boundary, with an optional custom identifier override
//! - [`UserRepository`] and [`ModelRegistry`]: the abstract user lookup
//!   consumed by the verifying side

mod config;
mod error;
mod identity;
mod repository;

// Re-export public API
pub use config::{HandoffConfig, RouteMap, DEFAULT_TTL_SECS};
pub use error::ConfigError;
pub use identity::{lookup_field, user_key, Authenticatable};
pub use repository::{
    repository_lookup_field, InMemoryUserRepository, ModelRegistry, RepositoryError, UserRecord,
    UserRepository,
};
