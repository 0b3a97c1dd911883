//! Router wiring and shared application state.

use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use handoff_core::{HandoffConfig, ModelRegistry};
use handoff_sign::UrlSigner;

use crate::handlers::verify_handler;
use crate::middleware::{verify_rate_limit, RateLimitConfig, RateLimiter};
use crate::services::{HandoffUrlIssuer, SessionEstablisher, VERIFY_PATH};

/// Shared state for the handoff endpoints and middleware.
#[derive(Clone)]
pub struct HandoffState {
    config: Arc<HandoffConfig>,
    issuer: Arc<HandoffUrlIssuer>,
    registry: Arc<ModelRegistry>,
    sessions: Arc<dyn SessionEstablisher>,
    limiter: Arc<RateLimiter>,
    production: bool,
}

impl HandoffState {
    /// Build state from configuration, a user model registry, and a
    /// session establisher.
    #[must_use]
    pub fn new(
        config: HandoffConfig,
        registry: Arc<ModelRegistry>,
        sessions: Arc<dyn SessionEstablisher>,
    ) -> Self {
        let config = Arc::new(config);
        let issuer = Arc::new(HandoffUrlIssuer::new(config.clone()));
        Self {
            config,
            issuer,
            registry,
            sessions,
            limiter: Arc::new(RateLimiter::default()),
            production: false,
        }
    }

    /// Replace the default rate limit on the verify endpoint.
    #[must_use]
    pub fn with_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.limiter = Arc::new(RateLimiter::new(config));
        self
    }

    /// Toggle production mode (redacts 500-class response details).
    #[must_use]
    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    #[must_use]
    pub fn config(&self) -> &HandoffConfig {
        &self.config
    }

    #[must_use]
    pub fn issuer(&self) -> &HandoffUrlIssuer {
        &self.issuer
    }

    #[must_use]
    pub fn signer(&self) -> &UrlSigner {
        self.issuer.signer()
    }

    #[must_use]
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<dyn SessionEstablisher> {
        &self.sessions
    }

    #[must_use]
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        self.production
    }
}

/// Router for the receiving application: the throttled verify endpoint.
pub fn handoff_router(state: HandoffState) -> Router {
    Router::new()
        .route(VERIFY_PATH, get(verify_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            verify_rate_limit,
        ))
        .with_state(state)
}
