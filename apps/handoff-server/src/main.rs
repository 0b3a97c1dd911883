//! Standalone handoff verification server.
//!
//! Runs the receiving half of the cross-application session handoff
//! protocol: a throttled `GET /handoff` endpoint that validates signed,
//! expiring redirect URLs, logs the resolved user in via a signed
//! session cookie, and forwards to the embedded target path.

mod config;
mod logging;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;

use config::ServerConfig;
use handoff_api::{
    handoff_router, HandoffState, RateLimitConfig, SignedCookieSessions,
};
use handoff_core::{InMemoryUserRepository, ModelRegistry};

#[tokio::main]
async fn main() {
    // Load configuration (fail-fast on missing required values)
    let config = match ServerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.rust_log);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.host,
        port = config.port,
        env = %config.app_env,
        target_host = %config.target_host,
        "Starting handoff server"
    );

    match config.validate_security_config() {
        Ok(warnings) => {
            for warning in &warnings {
                tracing::warn!(target: "security", "{}", warning);
            }
            if !warnings.is_empty() {
                tracing::warn!(
                    target: "security",
                    count = warnings.len(),
                    "Insecure settings detected (allowed in {} mode)",
                    config.app_env
                );
            }
        }
        Err(errors) => {
            for error in &errors {
                tracing::error!(target: "security", "{}", error);
            }
            eprintln!(
                "FATAL: {} insecure setting(s) detected in production mode. \
                 Set a proper HANDOFF_SECRET or use APP_ENV=development.",
                errors.len()
            );
            std::process::exit(1);
        }
    }

    let handoff_config = match config.handoff_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    // Register the user repository under the configured model name.
    let registry = Arc::new(ModelRegistry::new());
    let repository = InMemoryUserRepository::with_users(config.seed_users.clone());
    registry.register(config.user_model.clone(), Arc::new(repository));
    if !config.seed_users.is_empty() {
        info!(count = config.seed_users.len(), "Seeded user repository");
    }

    // Sessions are signed cookies keyed by the shared secret.
    let sessions = Arc::new(SignedCookieSessions::new(config.secret.clone()));

    let state = HandoffState::new(handoff_config, registry, sessions)
        .with_rate_limit(RateLimitConfig {
            max_attempts: config.verify_max_attempts,
            window: Duration::from_secs(60),
        })
        .with_production(config.app_env.is_production());

    let app = handoff_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = match config.bind_addr().parse() {
        Ok(a) => a,
        Err(e) => {
            tracing::error!("Invalid bind address '{}': {e}", config.bind_addr());
            std::process::exit(1);
        }
    };

    info!(%addr, "Server listening");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to address {addr}: {e}");
            std::process::exit(1);
        }
    };

    // ConnectInfo is required for per-IP rate limiting.
    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

/// Graceful shutdown on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {e}");
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
