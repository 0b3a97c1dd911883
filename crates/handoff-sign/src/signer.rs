//! HMAC-SHA256 signing and verification of canonicalized URLs.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::canonical::{canonical_string, EXPIRES_PARAM, SIGNATURE_PARAM};
use crate::error::SignError;

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies handoff URLs with a shared application secret.
///
/// The MAC covers the canonical form of the path and query parameters
/// (including `expires`, excluding `signature`). Validity is purely a
/// function of the signature and the embedded expiry; nothing is stored.
#[derive(Clone)]
pub struct UrlSigner {
    key: Vec<u8>,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner").field("key", &"[redacted]").finish()
    }
}

impl UrlSigner {
    /// Create a signer from the shared secret.
    #[must_use]
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    /// Compute the hex-encoded MAC over `path` and `params`.
    ///
    /// `params` should already contain the `expires` parameter; a
    /// `signature` parameter, if present, is ignored.
    #[must_use]
    pub fn sign(&self, path: &str, params: &[(String, String)]) -> String {
        let canonical = canonical_string(path, params);
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.key)
            .expect("HMAC can take key of any size");
        mac.update(canonical.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Verify the signature and expiry embedded in a received parameter set.
    ///
    /// Recomputes the MAC over the received parameters (minus `signature`)
    /// using the same canonicalization as [`sign`](Self::sign), compares in
    /// constant time, then checks `now < expires`. The signature check runs
    /// first so a tampered expiry can never be trusted.
    pub fn verify(
        &self,
        path: &str,
        params: &[(String, String)],
        now: DateTime<Utc>,
    ) -> Result<(), SignError> {
        let presented = params
            .iter()
            .find(|(key, _)| key == SIGNATURE_PARAM)
            .map(|(_, value)| value.as_str())
            .ok_or(SignError::MissingSignature)?;

        let expires_raw = params
            .iter()
            .find(|(key, _)| key == EXPIRES_PARAM)
            .map(|(_, value)| value.as_str())
            .ok_or(SignError::MissingExpiry)?;

        let expires: i64 = expires_raw
            .parse()
            .map_err(|_| SignError::InvalidExpiry(expires_raw.to_string()))?;

        let computed = self.sign(path, params);
        if !constant_time_eq(presented.as_bytes(), computed.as_bytes()) {
            return Err(SignError::SignatureMismatch);
        }

        if now.timestamp() >= expires {
            return Err(SignError::Expired);
        }

        Ok(())
    }
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;
    a.ct_eq(b).into()
}
