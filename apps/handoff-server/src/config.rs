//! Server configuration loaded from environment variables.
//!
//! Fail-fast loading with validation: required variables must be present
//! and valid or the server exits with a clear error message. Production
//! mode refuses insecure defaults.

use std::env;
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use handoff_core::{HandoffConfig, RouteMap, UserRecord, DEFAULT_TTL_SECS};

/// Default HANDOFF_SECRET, accepted only in development mode.
pub const INSECURE_SECRET: &str = "development-handoff-secret-change-me";

/// Minimum accepted signing secret length in bytes.
const MIN_SECRET_LEN: usize = 32;

/// Application environment mode.
///
/// Controls security enforcement: insecure defaults are allowed with a
/// warning in development and refuse startup in production.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Production,
}

impl AppEnvironment {
    /// Parse from the `APP_ENV` environment variable value.
    /// Defaults to `Development` if unset or unrecognized.
    pub fn from_env_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => {
                tracing::warn!(
                    value = other,
                    "Unrecognized APP_ENV value, defaulting to Development"
                );
                Self::Development
            }
        }
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        *self == Self::Production
    }
}

impl std::fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Configuration errors that can occur during environment loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },

    #[error("Failed to parse port: {0}")]
    InvalidPort(#[from] std::num::ParseIntError),
}

/// Server configuration loaded from environment variables.
#[derive(Clone)]
pub struct ServerConfig {
    /// Application environment (development or production).
    pub app_env: AppEnvironment,

    /// Shared signing secret, known to both applications.
    pub secret: Vec<u8>,

    /// Base origin of the remote application.
    pub target_host: String,

    /// Signed-URL lifetime in seconds.
    pub ttl_secs: u64,

    /// Local route pattern → remote relative path mapping.
    pub routes: RouteMap,

    /// Registry name of the user model queried on verification.
    pub user_model: String,

    /// Users seeded into the in-memory repository (development aid).
    pub seed_users: Vec<UserRecord>,

    /// Max verification attempts per IP per minute.
    pub verify_max_attempts: usize,

    /// Tracing filter directive (e.g., "info,handoff=debug").
    pub rust_log: String,

    /// Server bind address.
    pub host: String,

    /// Server listen port.
    pub port: u16,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("app_env", &self.app_env)
            .field("secret", &"[redacted]")
            .field("target_host", &self.target_host)
            .field("ttl_secs", &self.ttl_secs)
            .field("user_model", &self.user_model)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or any
    /// value is invalid.
    ///
    /// # Required Variables
    ///
    /// - `HANDOFF_TARGET_HOST` - Remote application origin (e.g., "https://app-b.example.com")
    ///
    /// # Optional Variables
    ///
    /// - `HANDOFF_SECRET` - Shared signing secret (insecure dev default)
    /// - `HANDOFF_TTL` - Signed-URL lifetime in seconds (default: 300)
    /// - `HANDOFF_ROUTES` - Comma-separated "local=remote" route pairs
    /// - `HANDOFF_USER_MODEL` - User model registry name (default: "users")
    /// - `HANDOFF_SEED_USERS` - Comma-separated "uuid=email" pairs
    /// - `RATE_LIMIT_VERIFY` - Max verify attempts per IP per minute (default: 10)
    /// - `RUST_LOG` - Log filter (default: "info")
    /// - `HOST` - Bind address (default: "0.0.0.0")
    /// - `PORT` - Listen port (default: 8080)
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (development only)
        let _ = dotenvy::dotenv();

        let app_env = AppEnvironment::from_env_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let target_host = env::var("HANDOFF_TARGET_HOST")
            .map_err(|_| ConfigError::MissingVar("HANDOFF_TARGET_HOST".to_string()))?;

        let secret = env::var("HANDOFF_SECRET")
            .unwrap_or_else(|_| INSECURE_SECRET.to_string())
            .into_bytes();

        let ttl_secs = match env::var("HANDOFF_TTL") {
            Ok(s) => s.parse().map_err(|_| ConfigError::InvalidValue {
                var: "HANDOFF_TTL".to_string(),
                message: "Must be a number of seconds".to_string(),
            })?,
            Err(_) => DEFAULT_TTL_SECS,
        };

        let routes = parse_routes(&env::var("HANDOFF_ROUTES").unwrap_or_default())?;

        let user_model = env::var("HANDOFF_USER_MODEL").unwrap_or_else(|_| "users".to_string());

        let seed_users = parse_seed_users(&env::var("HANDOFF_SEED_USERS").unwrap_or_default())?;

        let verify_max_attempts = match env::var("RATE_LIMIT_VERIFY") {
            Ok(s) => s.parse().map_err(|_| ConfigError::InvalidValue {
                var: "RATE_LIMIT_VERIFY".to_string(),
                message: "Must be a positive integer".to_string(),
            })?,
            Err(_) => 10,
        };

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()?;
        if port == 0 {
            return Err(ConfigError::InvalidValue {
                var: "PORT".to_string(),
                message: "Port must be between 1 and 65535".to_string(),
            });
        }

        Ok(Self {
            app_env,
            secret,
            target_host,
            ttl_secs,
            routes,
            user_model,
            seed_users,
            verify_max_attempts,
            rust_log,
            host,
            port,
        })
    }

    /// Build the protocol configuration shared with the library crates.
    pub fn handoff_config(&self) -> Result<HandoffConfig, handoff_core::ConfigError> {
        HandoffConfig::new(
            Duration::from_secs(self.ttl_secs),
            &self.target_host,
            self.routes.clone(),
            self.user_model.clone(),
            self.secret.clone(),
        )
    }

    /// Get the server bind address as a socket address string.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate security configuration based on the application environment.
    ///
    /// In **production** mode: returns `Err(errors)` listing all insecure
    /// settings found. In **development** mode: returns `Ok(warnings)`.
    pub fn validate_security_config(&self) -> Result<Vec<String>, Vec<String>> {
        let mut issues = Vec::new();

        if self.secret == INSECURE_SECRET.as_bytes() {
            issues.push("HANDOFF_SECRET is using the default insecure value".to_string());
        }

        if self.secret.len() < MIN_SECRET_LEN {
            issues.push(format!(
                "HANDOFF_SECRET is shorter than {MIN_SECRET_LEN} bytes"
            ));
        }

        if !self.target_host.starts_with("https://") {
            issues.push("HANDOFF_TARGET_HOST is not an https:// origin".to_string());
        }

        if issues.is_empty() {
            return Ok(Vec::new());
        }

        if self.app_env.is_production() {
            Err(issues)
        } else {
            Ok(issues)
        }
    }
}

/// Parse `HANDOFF_ROUTES` as comma-separated `local=remote` pairs.
fn parse_routes(value: &str) -> Result<RouteMap, ConfigError> {
    let mut routes = RouteMap::new();
    for pair in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (local, remote) = pair.split_once('=').ok_or_else(|| ConfigError::InvalidValue {
            var: "HANDOFF_ROUTES".to_string(),
            message: format!("Expected 'local=remote', got '{pair}'"),
        })?;
        routes.insert(local.trim().to_string(), remote.trim().to_string());
    }
    Ok(routes)
}

/// Parse `HANDOFF_SEED_USERS` as comma-separated `uuid=email` pairs.
fn parse_seed_users(value: &str) -> Result<Vec<UserRecord>, ConfigError> {
    let mut users = Vec::new();
    for pair in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (id, email) = pair.split_once('=').ok_or_else(|| ConfigError::InvalidValue {
            var: "HANDOFF_SEED_USERS".to_string(),
            message: format!("Expected 'uuid=email', got '{pair}'"),
        })?;
        let id: Uuid = id.trim().parse().map_err(|_| ConfigError::InvalidValue {
            var: "HANDOFF_SEED_USERS".to_string(),
            message: format!("'{id}' is not a valid UUID"),
        })?;
        users.push(UserRecord::new(id, email.trim()));
    }
    Ok(users)
}
