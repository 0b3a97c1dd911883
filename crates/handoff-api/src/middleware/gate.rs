//! Outbound handoff gate.
//!
//! Layered onto the issuing application's router, the gate watches for
//! requests that should be served by the remote application and
//! short-circuits them into a signed handoff redirect. Authentication
//! is required on every gated route; unmapped routes pass through
//! untouched for authenticated requests.

use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use handoff_core::Authenticatable;

use crate::error::HandoffApiError;
use crate::router::HandoffState;

/// The authenticated principal of the current request.
///
/// Upstream auth middleware inserts this extension; the gate refuses to
/// hand off requests that lack it.
#[derive(Clone)]
pub struct CurrentUser(pub Arc<dyn Authenticatable + Send + Sync>);

/// Explicit remote target for a gated route.
///
/// When present as a route extension, the gate redirects to this path
/// on the remote application instead of consulting the route map.
#[derive(Debug, Clone)]
pub struct GateTarget(pub String);

/// Redirect mapped routes to the remote application via handoff.
///
/// Every request reaching the gate must carry an authenticated
/// principal; requests without one are refused with 401 before any
/// route resolution. For authenticated requests an explicit
/// [`GateTarget`] extension wins, then the route map keyed by the
/// matched route pattern. Routes matching neither are passed through
/// to their local handler.
pub async fn handoff_gate(
    State(state): State<HandoffState>,
    request: Request,
    next: Next,
) -> Response {
    let matched = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string());

    let Some(user) = request.extensions().get::<CurrentUser>().cloned() else {
        tracing::warn!(route = ?matched, "handoff gate hit without authenticated user");
        return HandoffApiError::Unauthenticated.into_response_for(state.is_production());
    };

    let target = request.extensions().get::<GateTarget>().cloned();
    let issued = match target {
        Some(GateTarget(path)) => {
            Some(state.issuer().issue(user.0.as_ref(), Some(&path), None, None))
        }
        None => matched
            .as_deref()
            .filter(|path| state.config().routes.contains(path))
            .map(|route| state.issuer().issue(user.0.as_ref(), None, Some(route), None)),
    };

    match issued {
        Some(Ok(url)) => {
            tracing::info!(route = ?matched, "redirecting to handoff");
            Redirect::to(&url).into_response()
        }
        Some(Err(err)) => HandoffApiError::from(err).into_response_for(state.is_production()),
        None => next.run(request).await,
    }
}
