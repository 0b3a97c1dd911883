//! Error types for URL signing and verification.

use thiserror::Error;

/// Verification failure modes for a signed handoff URL.
///
/// Each variant maps to a specific failure in the verification pipeline.
/// Callers that surface these over HTTP should collapse all of them into
/// a single 403 so the response does not reveal which check failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignError {
    /// The `signature` query parameter is absent.
    #[error("Missing signature parameter")]
    MissingSignature,

    /// The `expires` query parameter is absent.
    #[error("Missing expires parameter")]
    MissingExpiry,

    /// The `expires` query parameter is not a valid epoch timestamp.
    #[error("Invalid expires parameter: {0}")]
    InvalidExpiry(String),

    /// The recomputed MAC does not match the presented signature.
    #[error("Signature mismatch")]
    SignatureMismatch,

    /// The URL is past its embedded expiry instant.
    #[error("Signed URL has expired")]
    Expired,
}

impl SignError {
    /// Check if this error indicates an expired URL.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, SignError::Expired)
    }

    /// Check if this error indicates a tampered or malformed signature.
    #[must_use]
    pub fn is_invalid_signature(&self) -> bool {
        matches!(
            self,
            SignError::MissingSignature
                | SignError::MissingExpiry
                | SignError::InvalidExpiry(_)
                | SignError::SignatureMismatch
        )
    }
}
