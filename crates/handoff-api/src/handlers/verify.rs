//! Inbound handoff verification.
//!
//! `GET /handoff` is the receiving application's half of the protocol:
//! check the signature and expiry, resolve the user behind the embedded
//! identifier, establish a session, and redirect to the target path.

use axum::{
    extract::{RawQuery, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;

use handoff_core::repository_lookup_field;

use crate::error::HandoffApiError;
use crate::router::HandoffState;
use crate::services::{TARGET_PARAM, USER_PARAM, VERIFY_PATH};

/// Handle `GET /handoff`.
pub async fn verify_handler(
    State(state): State<HandoffState>,
    RawQuery(query): RawQuery,
) -> Response {
    match verify(&state, query.as_deref().unwrap_or("")).await {
        Ok(response) => response,
        Err(err) => err.into_response_for(state.is_production()),
    }
}

async fn verify(state: &HandoffState, query: &str) -> Result<Response, HandoffApiError> {
    let params: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();

    state
        .signer()
        .verify(VERIFY_PATH, &params, Utc::now())
        .map_err(|err| {
            tracing::debug!(error = %err, "handoff signature verification failed");
            HandoffApiError::InvalidSignature
        })?;

    let identifier = params
        .iter()
        .find(|(key, _)| key == USER_PARAM)
        .map(|(_, value)| value.as_str())
        .filter(|value| !value.is_empty())
        .ok_or(HandoffApiError::MissingUser)?;

    let repository = state.registry().resolve(&state.config().user_model)?;
    let field = repository_lookup_field(repository.as_ref());
    let user = repository
        .find_by(field, identifier)
        .await?
        .ok_or(HandoffApiError::UserNotFound)?;

    let cookie = state.sessions().establish(&user).await?;
    let target = sanitize_target(
        params
            .iter()
            .find(|(key, _)| key == TARGET_PARAM)
            .map(|(_, value)| value.as_str()),
    );

    tracing::info!(user_id = %user.id, target = %target, "handoff verified");
    Ok((
        [(header::SET_COOKIE, cookie.header_value())],
        Redirect::to(&target),
    )
        .into_response())
}

/// Constrain the redirect target to a local path.
///
/// Anything that is not a same-origin absolute path (including
/// protocol-relative `//host` and backslash variants) falls back to
/// the application root.
fn sanitize_target(target: Option<&str>) -> String {
    match target {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.starts_with("/\\") =>
        {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}
