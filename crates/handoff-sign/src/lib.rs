//! Signed, expiring URL primitive for cross-application session handoff.
//!
//! This crate provides:
//! - A deterministic canonical form for a URL's path and query parameters
//! - HMAC-SHA256 signing of that canonical form, keyed by a shared secret
//! - Constant-time signature verification with expiry checking
//!
//! The canonical form deliberately covers the path and query only, never
//! the scheme or host: a handoff URL is issued on one application and
//! followed on another, so the host is rewritten after signing and must
//! not participate in the MAC.
//!
//! # Example
//!
//! ```rust,ignore
//! use handoff_sign::UrlSigner;
//! use chrono::{Duration, Utc};
//!
//! let signer = UrlSigner::new(b"shared-application-secret".to_vec());
//!
//! let expires = Utc::now() + Duration::seconds(300);
//! let mut params = vec![
//!     ("user".to_string(), "42".to_string()),
//!     ("target".to_string(), "/dash".to_string()),
//!     ("expires".to_string(), expires.timestamp().to_string()),
//! ];
//! let signature = signer.sign("/handoff", &params);
//! params.push(("signature".to_string(), signature));
//!
//! signer.verify("/handoff", &params, Utc::now())?;
//! ```

mod canonical;
mod error;
mod signer;

// Re-export public API
pub use canonical::{canonical_string, EXPIRES_PARAM, SIGNATURE_PARAM};
pub use error::SignError;
pub use signer::UrlSigner;
