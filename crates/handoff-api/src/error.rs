//! Error types for the handoff HTTP surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use handoff_core::{ConfigError, RepositoryError};

use crate::services::SessionError;

/// Error type for the handoff endpoints.
///
/// Caller errors map to 4xx responses with the documented messages.
/// Configuration errors are deployment failures: they surface as 500,
/// are always logged in full, and their detail is included in the
/// response body only outside production.
#[derive(Debug, thiserror::Error)]
pub enum HandoffApiError {
    /// Signature verification or expiry check failed.
    #[error("Invalid or expired Handoff redirect URL")]
    InvalidSignature,

    /// The mandatory `user` query parameter is absent or empty.
    #[error("Missing user identifier")]
    MissingUser,

    /// The user identifier did not resolve to a record.
    #[error("User not found")]
    UserNotFound,

    /// The outbound gate ran without an authenticated principal.
    #[error("User must be authenticated to perform handoff")]
    Unauthenticated,

    /// Deployment misconfiguration (bad target host, unmapped route,
    /// missing or incapable user model).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The user repository failed.
    #[error("User lookup failed")]
    Repository(#[from] RepositoryError),

    /// Session establishment failed after all checks passed.
    #[error("Session establishment failed")]
    Session(#[from] SessionError),
}

/// RFC 7807 Problem Details response format.
#[derive(Debug, Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ProblemDetails {
    fn new(slug: &str, title: &str, status: StatusCode, detail: Option<String>) -> Self {
        Self {
            problem_type: format!("https://handoff.dev/problems/{slug}"),
            title: title.to_string(),
            status: status.as_u16(),
            detail,
        }
    }
}

impl HandoffApiError {
    /// Whether this error is a deployment failure rather than a bad request.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, HandoffApiError::Config(_))
    }

    /// Render the error as an HTTP response.
    ///
    /// `production` controls whether 500-class responses carry the
    /// specific failure message in `detail`; the full error is logged
    /// either way.
    pub fn into_response_for(self, production: bool) -> Response {
        let (status, problem) = match &self {
            HandoffApiError::InvalidSignature => (
                StatusCode::FORBIDDEN,
                ProblemDetails::new(
                    "invalid-handoff-url",
                    "Forbidden",
                    StatusCode::FORBIDDEN,
                    Some("Invalid or expired Handoff redirect URL".to_string()),
                ),
            ),
            HandoffApiError::MissingUser => (
                StatusCode::BAD_REQUEST,
                ProblemDetails::new(
                    "missing-user-identifier",
                    "Bad Request",
                    StatusCode::BAD_REQUEST,
                    Some("Missing user identifier".to_string()),
                ),
            ),
            HandoffApiError::UserNotFound => (
                StatusCode::NOT_FOUND,
                ProblemDetails::new(
                    "user-not-found",
                    "Not Found",
                    StatusCode::NOT_FOUND,
                    Some("User not found".to_string()),
                ),
            ),
            HandoffApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                ProblemDetails::new(
                    "unauthenticated",
                    "Unauthorized",
                    StatusCode::UNAUTHORIZED,
                    Some("User must be authenticated to perform handoff".to_string()),
                ),
            ),
            HandoffApiError::Config(err) => {
                tracing::error!(error = %err, "handoff configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ProblemDetails::new(
                        "configuration-error",
                        "Internal Server Error",
                        StatusCode::INTERNAL_SERVER_ERROR,
                        if production {
                            Some("Handoff is misconfigured".to_string())
                        } else {
                            Some(err.to_string())
                        },
                    ),
                )
            }
            HandoffApiError::Repository(err) => {
                tracing::error!(error = %err, "user repository error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ProblemDetails::new(
                        "internal-error",
                        "Internal Server Error",
                        StatusCode::INTERNAL_SERVER_ERROR,
                        if production {
                            Some("An internal error occurred".to_string())
                        } else {
                            Some(err.to_string())
                        },
                    ),
                )
            }
            HandoffApiError::Session(err) => {
                tracing::error!(error = %err, "session establishment error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ProblemDetails::new(
                        "internal-error",
                        "Internal Server Error",
                        StatusCode::INTERNAL_SERVER_ERROR,
                        if production {
                            Some("An internal error occurred".to_string())
                        } else {
                            Some(err.to_string())
                        },
                    ),
                )
            }
        };

        (status, Json(problem)).into_response()
    }
}

impl IntoResponse for HandoffApiError {
    fn into_response(self) -> Response {
        // Redact by default; handlers with access to the state call
        // into_response_for with the real production flag.
        self.into_response_for(true)
    }
}
