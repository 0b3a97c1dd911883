//! Session establishment after a verified handoff.
//!
//! The verifier hands a resolved user to a [`SessionEstablisher`] and
//! attaches the returned cookie to the redirect response. The default
//! implementation issues a signed, expiring cookie; tests swap in
//! [`MemorySessions`] to observe which users were logged in.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use parking_lot::Mutex;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use handoff_core::UserRecord;

type HmacSha256 = Hmac<Sha256>;

/// Name of the session cookie set on successful verification.
pub const SESSION_COOKIE: &str = "handoff_session";

/// Default session lifetime.
const DEFAULT_SESSION_LIFETIME: Duration = Duration::from_secs(60 * 60 * 2);

/// Errors from session establishment.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The backing session store rejected the login.
    #[error("failed to establish session: {0}")]
    Establish(String),
}

/// A session cookie ready to be attached to a response.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub max_age: Duration,
}

impl SessionCookie {
    /// Render as a `Set-Cookie` header value.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!(
            "{}={}; Max-Age={}; Path=/; HttpOnly; Secure; SameSite=Lax",
            self.name,
            self.value,
            self.max_age.as_secs()
        )
    }
}

/// Logs a verified user into the receiving application.
#[async_trait]
pub trait SessionEstablisher: Send + Sync {
    async fn establish(&self, user: &UserRecord) -> Result<SessionCookie, SessionError>;
}

/// Stateless session establisher backed by a signed cookie.
///
/// The cookie value is `<user-id>.<expiry>.<mac>` where the MAC covers
/// the first two segments. No server-side state is kept.
pub struct SignedCookieSessions {
    key: Vec<u8>,
    lifetime: Duration,
}

impl SignedCookieSessions {
    #[must_use]
    pub fn new(key: Vec<u8>) -> Self {
        Self {
            key,
            lifetime: DEFAULT_SESSION_LIFETIME,
        }
    }

    #[must_use]
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    fn mac(&self, payload: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts keys of any length");
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Validate a cookie value and return the user id it names.
    ///
    /// Returns `None` for malformed values, bad MACs, and expired
    /// sessions.
    #[must_use]
    pub fn verify_cookie(&self, value: &str, now: DateTime<Utc>) -> Option<Uuid> {
        let (payload, mac_hex) = value.rsplit_once('.')?;
        let (uid, exp) = payload.split_once('.')?;

        let expected = self.mac(payload);
        if expected.as_bytes().ct_eq(mac_hex.as_bytes()).unwrap_u8() != 1 {
            return None;
        }

        let expires: i64 = exp.parse().ok()?;
        if now.timestamp() >= expires {
            return None;
        }
        uid.parse().ok()
    }
}

#[async_trait]
impl SessionEstablisher for SignedCookieSessions {
    async fn establish(&self, user: &UserRecord) -> Result<SessionCookie, SessionError> {
        let expires = Utc::now().timestamp() + self.lifetime.as_secs() as i64;
        let payload = format!("{}.{expires}", user.id);
        let mac = self.mac(&payload);

        Ok(SessionCookie {
            name: SESSION_COOKIE.to_string(),
            value: format!("{payload}.{mac}"),
            max_age: self.lifetime,
        })
    }
}

/// In-memory establisher for tests; records every user logged in.
#[derive(Default)]
pub struct MemorySessions {
    established: Mutex<Vec<Uuid>>,
}

impl MemorySessions {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// User ids logged in so far, in order.
    #[must_use]
    pub fn established(&self) -> Vec<Uuid> {
        self.established.lock().clone()
    }
}

#[async_trait]
impl SessionEstablisher for MemorySessions {
    async fn establish(&self, user: &UserRecord) -> Result<SessionCookie, SessionError> {
        self.established.lock().push(user.id);
        Ok(SessionCookie {
            name: SESSION_COOKIE.to_string(),
            value: user.id.to_string(),
            max_age: DEFAULT_SESSION_LIFETIME,
        })
    }
}
