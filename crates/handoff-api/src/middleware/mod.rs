//! Middleware for the handoff protocol.

mod gate;
mod rate_limit;

pub use gate::{handoff_gate, CurrentUser, GateTarget};
pub use rate_limit::{
    verify_rate_limit, RateLimitConfig, RateLimiter, DEFAULT_VERIFY_ATTEMPTS,
};
