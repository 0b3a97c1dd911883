//! HTTP surface for cross-application session handoff.
//!
//! This crate provides the three cooperating pieces of the protocol:
//! - The **issuer** ([`HandoffUrlIssuer`]): builds a signed, expiring
//!   redirect URL for an authenticated user and rebases it onto the
//!   remote application's origin.
//! - The **verifier** (`GET /handoff`): validates signature and expiry,
//!   resolves the user, establishes a session, and redirects to the
//!   embedded target path.
//! - The **outbound gate** ([`handoff_gate`]): middleware on the local
//!   application that short-circuits mapped routes into a handoff
//!   redirect.
//!
//! # Example
//!
//! ```rust,ignore
//! use axum::{middleware, Router};
//! use handoff_api::{handoff_gate, handoff_router, HandoffState};
//!
//! // Verifying side (App B)
//! let app = handoff_router(state.clone());
//!
//! // Issuing side (App A): gate mapped routes
//! let local = Router::new()
//!     .route("/dashboard", axum::routing::get(dashboard))
//!     .layer(middleware::from_fn_with_state(state, handoff_gate));
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod services;

// Re-export public API
pub use error::{HandoffApiError, ProblemDetails};
pub use handlers::verify_handler;
pub use middleware::{
    handoff_gate, CurrentUser, GateTarget, RateLimitConfig, RateLimiter, DEFAULT_VERIFY_ATTEMPTS,
};
pub use router::{handoff_router, HandoffState};
pub use services::{
    HandoffUrlIssuer, MemorySessions, SessionCookie, SessionError, SessionEstablisher,
    SignedCookieSessions, TARGET_PARAM, USER_PARAM, VERIFY_PATH,
};
