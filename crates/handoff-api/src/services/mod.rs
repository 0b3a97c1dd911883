//! Services backing the handoff endpoints.

mod issuer;
mod session;

pub use issuer::{HandoffUrlIssuer, TARGET_PARAM, USER_PARAM, VERIFY_PATH};
pub use session::{
    MemorySessions, SessionCookie, SessionError, SessionEstablisher, SignedCookieSessions,
    SESSION_COOKIE,
};
